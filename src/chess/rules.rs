//! Thin adapter over `shakmaty`, the rules engine the viewer consumes.
//!
//! Everything here is pure: positions go in, new positions come out. The
//! navigation engine never mutates a position it did not just build.

use std::collections::HashMap;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square};

use super::error::{ErrorAccumulator, StudyError};

/// A move as the board UI or the keyboard hands it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInput {
    Squares {
        from: Square,
        to: Square,
        promotion: Option<Role>,
    },
    San(String),
}

impl MoveInput {
    pub fn squares(from: Square, to: Square) -> Self {
        Self::Squares {
            from,
            to,
            promotion: None,
        }
    }

    pub fn san(san: impl Into<String>) -> Self {
        Self::San(san.into())
    }

    fn describe(&self) -> String {
        match self {
            Self::Squares {
                from,
                to,
                promotion,
            } => match promotion {
                Some(role) => format!("{from}{to}{}", role.char()),
                None => format!("{from}{to}"),
            },
            Self::San(san) => san.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    InsufficientMaterial,
    FiftyMoves,
    Repetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

/// Where a record starts: the position and the fullmove number of its first
/// ply.
#[derive(Debug, Clone)]
pub struct StartPosition {
    pub position: Chess,
    pub first_move_number: u32,
}

impl Default for StartPosition {
    fn default() -> Self {
        Self {
            position: Chess::default(),
            first_move_number: 1,
        }
    }
}

impl StartPosition {
    /// Builds the start from an optional FEN tag value. An unusable FEN falls
    /// back to the standard initial position and is noted in `diagnostics`.
    pub fn from_fen(fen: Option<&str>, diagnostics: &mut ErrorAccumulator) -> Self {
        let Some(raw) = fen.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        match parse_fen(raw) {
            Ok(position) => Self {
                first_move_number: position.fullmoves().get(),
                position,
            },
            Err(reason) => {
                let msg = format!("Invalid FEN '{raw}' ({reason}); using initial position");
                tracing::warn!("{msg}");
                diagnostics.push(&msg);
                Self::default()
            }
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.position.turn()
    }
}

fn parse_fen(raw: &str) -> Result<Chess, String> {
    let fen: Fen = raw.parse().map_err(|e| format!("{e}"))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| format!("{e}"))
}

/// Resolves a SAN token against `pos`. `None` for malformed or illegal SAN.
pub fn resolve_san(pos: &Chess, san: &str) -> Option<Move> {
    let san: SanPlus = san.trim().parse().ok()?;
    san.san.to_move(pos).ok()
}

/// Resolves user input into a legal move. A pawn reaching the last rank
/// without an explicit piece promotes to a queen.
pub fn resolve(pos: &Chess, input: &MoveInput) -> Result<Move, StudyError> {
    let resolved = match input {
        MoveInput::San(san) => resolve_san(pos, san),
        MoveInput::Squares {
            from,
            to,
            promotion,
        } => {
            let uci = UciMove::Normal {
                from: *from,
                to: *to,
                promotion: *promotion,
            };
            match uci.to_move(pos) {
                Ok(m) => Some(m),
                Err(_) if promotion.is_none() => UciMove::Normal {
                    from: *from,
                    to: *to,
                    promotion: Some(Role::Queen),
                }
                .to_move(pos)
                .ok(),
                Err(_) => None,
            }
        }
    };

    resolved.ok_or_else(|| StudyError::IllegalMove {
        input: input.describe(),
        fen: to_fen(pos),
    })
}

/// Plays a legal move, returning its SAN (with check suffix) and the new
/// position.
pub fn play(pos: &Chess, m: Move) -> (String, Chess) {
    let mut next = pos.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut next, m);
    (san.to_string(), next)
}

/// Replays SAN moves from `start`. Stops at the first move that does not
/// apply and returns the last good position with the number of moves applied.
pub fn replay<'a, I>(start: &Chess, sans: I) -> (Chess, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    replay_with(start, sans, |_| {})
}

/// `replay`, calling `visit` on the start and on every position reached.
fn replay_with<'a, I, F>(start: &Chess, sans: I, mut visit: F) -> (Chess, usize)
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&Chess),
{
    let mut pos = start.clone();
    let mut applied = 0;
    visit(&pos);

    for san in sans {
        match resolve_san(&pos, san) {
            Some(m) => {
                pos.play_unchecked(m);
                applied += 1;
                visit(&pos);
            }
            None => {
                tracing::warn!(
                    "Replay stopped: '{}' does not apply to {} after {} plies",
                    san,
                    to_fen(&pos),
                    applied
                );
                break;
            }
        }
    }

    (pos, applied)
}

pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Status at the end of a line played from `start`. Adds threefold repetition,
/// which a single position cannot show, to [`status`].
pub fn line_status<'a, I>(start: &Chess, sans: I) -> GameStatus
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let (pos, _) = replay_with(start, sans, |pos| {
        *seen.entry(repetition_key(pos)).or_default() += 1;
    });

    match status(&pos) {
        GameStatus::Ongoing if seen.get(&repetition_key(&pos)).is_some_and(|&n| n >= 3) => {
            GameStatus::Draw(DrawReason::Repetition)
        }
        other => other,
    }
}

/// FEN without the move counters: board, side, castling and en passant.
fn repetition_key(pos: &Chess) -> String {
    to_fen(pos)
        .split(' ')
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn status(pos: &Chess) -> GameStatus {
    if pos.is_checkmate() {
        GameStatus::Checkmate {
            winner: !pos.turn(),
        }
    } else if pos.is_stalemate() {
        GameStatus::Stalemate
    } else if pos.is_insufficient_material() {
        GameStatus::Draw(DrawReason::InsufficientMaterial)
    } else if pos.halfmoves() >= 100 {
        GameStatus::Draw(DrawReason::FiftyMoves)
    } else {
        GameStatus::Ongoing
    }
}
