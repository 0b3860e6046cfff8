//! Variation-aware move navigation for one record.
//!
//! The engine is an explicit state machine over [`Cursor`]. The board is
//! never stored: every query replays the record from its start position up to
//! the cursor, so the displayed position cannot drift from the cursor.

use shakmaty::{Chess, Color, Move, Position};

use super::error::{ErrorAccumulator, StudyError};
use super::record::Record;
use super::rules::{self, GameStatus, MoveInput, StartPosition};
use super::types::{Branch, ParsedMovetext, Ply, Variations};

/// Exactly one of "on the mainline at `i`" or "in a branch".
///
/// `Mainline(i)` shows the position after mainline plies `[..i)`.
/// `Variation` shows mainline `[..index)` followed by `branch[..=offset]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Mainline(usize),
    Variation {
        index: usize,
        branch: usize,
        offset: usize,
    },
}

/// What `advance` does when the mainline reaches a registered variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariationPolicy {
    /// Stop and ask whether to enter a branch or continue the mainline.
    #[default]
    Prompt,
    /// Continue the mainline without asking.
    PreferMainline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigatorOptions {
    pub variation_policy: VariationPolicy,
}

/// The choice offered at a branch point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationPrompt {
    pub index: usize,
    /// The mainline move that would be played next.
    pub mainline: Option<String>,
    /// First move of each branch, in branch order.
    pub branches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved(Cursor),
    /// Already at a boundary; nothing changed.
    Saturated,
    /// Waiting for [`Navigator::choose`].
    Prompt(VariationPrompt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Mainline,
    Variation(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The move was the next mainline move.
    Confirmed,
    /// The move was appended to the end of the mainline.
    Extended,
    /// The move left the mainline into a branch.
    Branched {
        index: usize,
        branch: usize,
        created: bool,
    },
    /// The move followed or extended the current branch.
    Continued,
}

pub struct Navigator {
    start: StartPosition,
    mainline: Vec<Ply>,
    variations: Variations,
    lead_comment: Option<String>,
    result: Option<String>,
    cursor: Cursor,
    options: NavigatorOptions,
    diagnostics: ErrorAccumulator,
}

impl Navigator {
    /// Parses the record's movetext and positions the cursor. A record that
    /// starts with Black to move is advanced once, past its placeholder.
    pub fn new(record: &Record, options: NavigatorOptions) -> Self {
        let mut diagnostics = record.diagnostics().clone();
        let parsed = record.movetext(&mut diagnostics);
        Self::from_parsed(record.start().clone(), parsed, options, diagnostics)
    }

    pub(crate) fn from_parsed(
        start: StartPosition,
        parsed: ParsedMovetext,
        options: NavigatorOptions,
        diagnostics: ErrorAccumulator,
    ) -> Self {
        let mut navigator = Self {
            start,
            mainline: parsed.mainline,
            variations: parsed.variations,
            lead_comment: parsed.lead_comment,
            result: parsed.result,
            cursor: Cursor::Mainline(0),
            options,
            diagnostics,
        };

        if navigator.has_placeholder() {
            navigator.advance();
        }
        navigator
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn mainline(&self) -> &[Ply] {
        &self.mainline
    }

    pub fn variations(&self) -> &Variations {
        &self.variations
    }

    pub fn branches_at(&self, index: usize) -> &[Branch] {
        self.variations
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_placeholder(&self) -> bool {
        self.mainline.first().is_some_and(Ply::is_placeholder)
    }

    pub fn first_move_number(&self) -> u32 {
        self.start.first_move_number
    }

    pub fn lead_comment(&self) -> Option<&str> {
        self.lead_comment.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Parse diagnostics for the record, `None` when it parsed cleanly.
    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }

    pub fn start_position(&self) -> &Chess {
        &self.start.position
    }

    fn branch(&self, index: usize, branch: usize) -> Option<&Branch> {
        self.variations.get(&index)?.get(branch)
    }

    /// SAN of every ply leading to the cursor, in play order.
    pub fn line(&self) -> Vec<&str> {
        match self.cursor {
            Cursor::Mainline(i) => self.mainline[..i].iter().filter_map(Ply::san).collect(),
            Cursor::Variation {
                index,
                branch,
                offset,
            } => {
                let tail = self
                    .branch(index, branch)
                    .map(|b| &b[..=offset])
                    .unwrap_or_default();
                self.mainline[..index]
                    .iter()
                    .chain(tail)
                    .filter_map(Ply::san)
                    .collect()
            }
        }
    }

    /// The board at the cursor, rebuilt from the record's start position.
    pub fn position(&self) -> Chess {
        rules::replay(&self.start.position, self.line()).0
    }

    pub fn fen(&self) -> String {
        rules::to_fen(&self.position())
    }

    /// Includes draws by threefold repetition along the line to the cursor.
    pub fn status(&self) -> GameStatus {
        rules::line_status(&self.start.position, self.line())
    }

    pub fn side_to_move(&self) -> Color {
        self.position().turn()
    }

    /// The ply that produced the current position.
    pub fn last_move(&self) -> Option<&Ply> {
        match self.cursor {
            Cursor::Mainline(i) => self.mainline[..i].iter().rev().find(|p| !p.is_placeholder()),
            Cursor::Variation {
                index,
                branch,
                offset,
            } => self.branch(index, branch).and_then(|b| b.get(offset)),
        }
    }

    fn prompt_at(&self, index: usize) -> VariationPrompt {
        VariationPrompt {
            index,
            mainline: self.mainline.get(index).and_then(Ply::san).map(String::from),
            branches: self
                .branches_at(index)
                .iter()
                .map(|b| b.first().and_then(Ply::san).unwrap_or_default().to_string())
                .collect(),
        }
    }

    fn moved(&mut self, cursor: Cursor) -> Step {
        self.cursor = cursor;
        Step::Moved(cursor)
    }

    /// Next. Stops with a prompt at a branch point unless the policy says to
    /// stay on the mainline.
    pub fn advance(&mut self) -> Step {
        match self.cursor {
            Cursor::Mainline(i) => {
                if i >= self.mainline.len() {
                    return Step::Saturated;
                }
                if self.variations.contains_key(&i)
                    && self.options.variation_policy == VariationPolicy::Prompt
                {
                    return Step::Prompt(self.prompt_at(i));
                }
                self.moved(Cursor::Mainline(i + 1))
            }
            Cursor::Variation {
                index,
                branch,
                offset,
            } => {
                let len = self.branch(index, branch).map_or(0, |b| b.len());
                if offset + 1 < len {
                    self.moved(Cursor::Variation {
                        index,
                        branch,
                        offset: offset + 1,
                    })
                } else {
                    let next = (index + 1).min(self.mainline.len());
                    self.moved(Cursor::Mainline(next))
                }
            }
        }
    }

    /// Answers a prompt raised by `advance` at the current mainline index.
    pub fn choose(&mut self, continuation: Continuation) -> Result<Cursor, StudyError> {
        let index = match self.cursor {
            Cursor::Mainline(i) if self.variations.contains_key(&i) => i,
            Cursor::Mainline(index) | Cursor::Variation { index, .. } => {
                return Err(StudyError::NoVariation { index });
            }
        };

        let cursor = match continuation {
            Continuation::Mainline => Cursor::Mainline((index + 1).min(self.mainline.len())),
            Continuation::Variation(branch) => {
                if self.branch(index, branch).is_none_or(|b| b.is_empty()) {
                    return Err(StudyError::NoSuchPly {
                        index,
                        branch,
                        offset: 0,
                    });
                }
                Cursor::Variation {
                    index,
                    branch,
                    offset: 0,
                }
            }
        };

        self.cursor = cursor;
        Ok(cursor)
    }

    /// Previous. Leaving a branch lands on the mainline where it diverged.
    pub fn retreat(&mut self) -> Step {
        match self.cursor {
            Cursor::Mainline(0) => Step::Saturated,
            Cursor::Mainline(i) => self.moved(Cursor::Mainline(i - 1)),
            Cursor::Variation {
                index,
                branch,
                offset,
            } => {
                if offset > 0 {
                    self.moved(Cursor::Variation {
                        index,
                        branch,
                        offset: offset - 1,
                    })
                } else {
                    self.moved(Cursor::Mainline(index))
                }
            }
        }
    }

    /// Always legal; clamped to the mainline length.
    pub fn jump_to_index(&mut self, index: usize) -> Cursor {
        self.cursor = Cursor::Mainline(index.min(self.mainline.len()));
        self.cursor
    }

    pub fn jump_to_variation(
        &mut self,
        index: usize,
        branch: usize,
        offset: usize,
    ) -> Result<Cursor, StudyError> {
        if !self.variations.contains_key(&index) {
            return Err(StudyError::NoVariation { index });
        }
        if self.branch(index, branch).is_none_or(|b| offset >= b.len()) {
            return Err(StudyError::NoSuchPly {
                index,
                branch,
                offset,
            });
        }

        self.cursor = Cursor::Variation {
            index,
            branch,
            offset,
        };
        Ok(self.cursor)
    }

    /// Plays a move from the current position: confirms the mainline, leaves
    /// it into a branch, or extends whichever line the cursor is on.
    pub fn play(&mut self, input: &MoveInput) -> Result<PlayOutcome, StudyError> {
        let pos = self.position();
        let m = rules::resolve(&pos, input)?;
        let (san, _) = rules::play(&pos, m.clone());
        let ply = Ply::new(san, pos.turn());

        let outcome = match self.cursor {
            Cursor::Mainline(i) => {
                if self.mainline.is_empty() && self.start.side_to_move() == Color::Black {
                    self.mainline.push(Ply::Placeholder { side: Color::Black });
                }
                let i = if i == 0 && self.has_placeholder() { 1 } else { i };
                self.play_from_mainline(i, &pos, &m, ply)
            }
            Cursor::Variation {
                index,
                branch,
                offset,
            } => self.play_in_branch(index, branch, offset, &pos, &m, ply),
        };

        tracing::debug!("Played {input:?}: {outcome:?}, cursor {:?}", self.cursor);
        Ok(outcome)
    }

    fn play_from_mainline(&mut self, i: usize, pos: &Chess, m: &Move, ply: Ply) -> PlayOutcome {
        if i >= self.mainline.len() {
            self.mainline.push(ply);
            self.cursor = Cursor::Mainline(self.mainline.len());
            return PlayOutcome::Extended;
        }

        if same_move(pos, &self.mainline[i], m) {
            self.cursor = Cursor::Mainline(i + 1);
            return PlayOutcome::Confirmed;
        }

        let branches = self.variations.entry(i).or_default();
        let existing = branches
            .iter()
            .position(|b| b.first().is_some_and(|first| same_move(pos, first, m)));
        let (branch, created) = match existing {
            Some(branch) => (branch, false),
            None => {
                branches.push(Branch::from_iter([ply]));
                (branches.len() - 1, true)
            }
        };

        self.cursor = Cursor::Variation {
            index: i,
            branch,
            offset: 0,
        };
        PlayOutcome::Branched {
            index: i,
            branch,
            created,
        }
    }

    fn play_in_branch(
        &mut self,
        index: usize,
        branch: usize,
        offset: usize,
        pos: &Chess,
        m: &Move,
        ply: Ply,
    ) -> PlayOutcome {
        let next = offset + 1;
        let Some(branches) = self.variations.get_mut(&index) else {
            return PlayOutcome::Continued;
        };

        let current = &mut branches[branch];
        if next >= current.len() {
            current.push(ply);
            self.cursor = Cursor::Variation {
                index,
                branch,
                offset: next,
            };
            return PlayOutcome::Continued;
        }

        if same_move(pos, &current[next], m) {
            self.cursor = Cursor::Variation {
                index,
                branch,
                offset: next,
            };
            return PlayOutcome::Continued;
        }

        // Diverging inside a branch forks a sibling branch; the old one stays.
        let mut fork: Branch = current[..next].iter().cloned().collect();
        fork.push(ply);
        branches.push(fork);
        let forked = branches.len() - 1;

        self.cursor = Cursor::Variation {
            index,
            branch: forked,
            offset: next,
        };
        PlayOutcome::Branched {
            index,
            branch: forked,
            created: true,
        }
    }
}

fn same_move(pos: &Chess, ply: &Ply, m: &Move) -> bool {
    ply.san()
        .and_then(|san| rules::resolve_san(pos, san))
        .is_some_and(|known| known == *m)
}
