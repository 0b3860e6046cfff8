use std::io;
use std::ops::ControlFlow;
use std::sync::LazyLock;

use pgn_reader::{Outcome, RawComment, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use shakmaty::{Chess, Color, Position};

use super::error::ErrorAccumulator;
use super::types::{Branch, ParsedMovetext, Ply, side_at};

static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.*$").expect("valid move number regex"));

static NUMBERED_SAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+(.+)$").expect("valid numbered san regex"));

/// Shaped like a move (piece or file, then a destination) even when the
/// square does not exist, e.g. `Nf9` or `e9`.
static MOVE_SHAPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+\.+)?[KQRBN]?[a-h]?[0-9]?x?[a-h][0-9]+(?:=[QRBN])?[+#!?]*$")
        .expect("valid move shaped regex")
});

/// Streaming movetext visitor (pgn-reader).
///
/// Builds the mainline and the depth-1 variations of one record, checking
/// every SAN against the position it is played from. Illegal or unresolvable
/// moves are skipped and noted, so imperfect sources yield fewer moves rather
/// than no record.
pub struct MovetextVisitor {
    main_pos: Chess,
    /// Position before the last mainline ply; variations on that ply start here.
    before_last: Option<Chess>,
    open: Option<OpenBranch>,
    parsed: ParsedMovetext,
    diagnostics: ErrorAccumulator,
}

struct OpenBranch {
    anchor: usize,
    position: Chess,
    plies: Branch,
}

impl MovetextVisitor {
    pub fn new(start: &Chess) -> Self {
        let mut parsed = ParsedMovetext::default();
        if start.turn() == Color::Black {
            parsed.mainline.push(Ply::Placeholder { side: Color::Black });
        }

        Self {
            main_pos: start.clone(),
            before_last: None,
            open: None,
            parsed,
            diagnostics: ErrorAccumulator::default(),
        }
    }

    fn note(&mut self, msg: String) {
        tracing::warn!("{msg}");
        self.diagnostics.push(&msg);
    }

    fn close_branch(&mut self) {
        if let Some(branch) = self.open.take() {
            if branch.plies.is_empty() {
                return;
            }
            self.parsed
                .variations
                .entry(branch.anchor)
                .or_default()
                .push(branch.plies);
        }
    }

    fn play_mainline(&mut self, san_plus: SanPlus) {
        let index = self.parsed.mainline.len();
        match san_plus.san.to_move(&self.main_pos) {
            Ok(m) => {
                self.before_last = Some(self.main_pos.clone());
                self.main_pos.play_unchecked(m);
                self.parsed
                    .mainline
                    .push(Ply::new(san_plus.to_string(), side_at(index)));
            }
            Err(e) => self.note(format!(
                "Skipped move: '{san_plus}' at mainline index {index} ({e})"
            )),
        }
    }

    fn play_branch(&mut self, san_plus: SanPlus) {
        let Some(branch) = self.open.as_mut() else {
            return;
        };

        let index = branch.anchor + branch.plies.len();
        let failure = match san_plus.san.to_move(&branch.position) {
            Ok(m) => {
                branch.position.play_unchecked(m);
                branch
                    .plies
                    .push(Ply::new(san_plus.to_string(), side_at(index)));
                None
            }
            Err(e) => Some(format!(
                "Skipped variation move: '{san_plus}' at index {index} ({e})"
            )),
        };

        if let Some(msg) = failure {
            self.note(msg);
        }
    }

    /// Closes any unterminated variation and hands over the parse.
    pub fn finish(mut self, diagnostics: &mut ErrorAccumulator) -> ParsedMovetext {
        self.close_branch();
        // A placeholder with nothing after it is not a move list.
        if self.parsed.mainline.len() == 1 && self.parsed.has_placeholder() {
            self.parsed.mainline.clear();
        }
        if let Some(msg) = self.diagnostics.take() {
            diagnostics.push(&msg);
        }
        self.parsed
    }
}

fn attach_comment(ply: &mut Ply, text: &str) {
    if let Ply::Move { comment, .. } = ply {
        append_text(comment, text);
    }
}

fn append_text(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

impl Visitor for MovetextVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        if self.open.is_some() {
            self.play_branch(san_plus);
        } else {
            self.play_mainline(san_plus);
        }
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        _movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let raw = String::from_utf8_lossy(comment.as_bytes());
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return ControlFlow::Continue(());
        }

        if let Some(branch) = self.open.as_mut() {
            if let Some(ply) = branch.plies.last_mut() {
                attach_comment(ply, &text);
            }
            return ControlFlow::Continue(());
        }

        match self
            .parsed
            .mainline
            .last_mut()
            .filter(|ply| !ply.is_placeholder())
        {
            Some(ply) => attach_comment(ply, &text),
            None => append_text(&mut self.parsed.lead_comment, &text),
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        if self.open.is_some() {
            tracing::debug!("Skipping nested variation");
            return ControlFlow::Continue(Skip(true));
        }

        let anchor = self.parsed.mainline.len().checked_sub(1);
        match (anchor, self.before_last.clone()) {
            (Some(anchor), Some(position)) if !self.parsed.mainline[anchor].is_placeholder() => {
                self.open = Some(OpenBranch {
                    anchor,
                    position,
                    plies: Branch::new(),
                });
                ControlFlow::Continue(Skip(false))
            }
            _ => {
                self.note("Skipped variation before the first move".to_string());
                ControlFlow::Continue(Skip(true))
            }
        }
    }

    fn end_variation(&mut self, _movetext: &mut Self::Movetext) -> ControlFlow<Self::Output> {
        self.close_branch();
        ControlFlow::Continue(())
    }

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.parsed.result = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {}
}

/// Parses the movetext of one record (tags already stripped) starting from
/// `start`. Never fails: reader errors are noted and everything recognized
/// before them is kept.
pub fn parse_movetext(
    body: &str,
    start: &Chess,
    diagnostics: &mut ErrorAccumulator,
) -> ParsedMovetext {
    let mut visitor = MovetextVisitor::new(start);
    let movetext = sanitize_movetext(body, &mut visitor.diagnostics);

    if !movetext.trim().is_empty() {
        let mut reader = Reader::new(io::Cursor::new(movetext.as_bytes()));
        if let Err(error) = reader.read_game(&mut visitor) {
            visitor.note(format!("Parser-stage error: stage=read_game; error={error}"));
        }
    }

    visitor.finish(diagnostics)
}

/// Drops free-text words that sit between moves, keeping move numbers, SAN,
/// NAGs, results, brace and line comments and variation parentheses.
/// Move-shaped tokens that are not valid SAN are dropped and noted.
pub(crate) fn sanitize_movetext(body: &str, diagnostics: &mut ErrorAccumulator) -> String {
    let mut out = String::with_capacity(body.len());
    let mut token = String::new();
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush_token(&mut out, &mut token, diagnostics);
                out.push('{');
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == '}' {
                        break;
                    }
                }
                out.push(' ');
            }
            ';' => {
                flush_token(&mut out, &mut token, diagnostics);
                out.push(';');
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
                out.push('\n');
            }
            '(' | ')' => {
                flush_token(&mut out, &mut token, diagnostics);
                out.push(c);
                out.push(' ');
            }
            _ if c.is_whitespace() => flush_token(&mut out, &mut token, diagnostics),
            _ => token.push(c),
        }
    }
    flush_token(&mut out, &mut token, diagnostics);

    out
}

fn flush_token(out: &mut String, token: &mut String, diagnostics: &mut ErrorAccumulator) {
    if token.is_empty() {
        return;
    }

    if is_movetext_token(token) {
        out.push_str(token);
        out.push(' ');
    } else if MOVE_SHAPED_RE.is_match(token) {
        let msg = format!("Skipped malformed move: '{token}'");
        tracing::warn!("{msg}");
        diagnostics.push(&msg);
    } else {
        tracing::debug!("Ignoring non-movetext token '{token}'");
    }
    token.clear();
}

fn is_movetext_token(token: &str) -> bool {
    if matches!(token, "*" | "1-0" | "0-1" | "1/2-1/2") {
        return true;
    }
    if let Some(nag) = token.strip_prefix('$') {
        return !nag.is_empty() && nag.bytes().all(|b| b.is_ascii_digit());
    }
    if token.chars().all(|c| c == '!' || c == '?') {
        return true;
    }
    if MOVE_NUMBER_RE.is_match(token) {
        return true;
    }
    if let Some(caps) = NUMBERED_SAN_RE.captures(token) {
        return is_san_token(&caps[1]);
    }
    is_san_token(token)
}

fn is_san_token(token: &str) -> bool {
    let bare = token.trim_end_matches(['!', '?']);
    !bare.is_empty() && bare.parse::<SanPlus>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::rules::StartPosition;

    fn parse(body: &str) -> (ParsedMovetext, ErrorAccumulator) {
        let mut diagnostics = ErrorAccumulator::default();
        let parsed = parse_movetext(body, &Chess::default(), &mut diagnostics);
        (parsed, diagnostics)
    }

    fn sans(plies: &[Ply]) -> Vec<&str> {
        plies.iter().filter_map(Ply::san).collect()
    }

    #[test]
    fn test_visitor_basic_mainline() {
        let (parsed, diagnostics) = parse("1. e4 e5 2. Nf3 1-0");

        assert_eq!(sans(&parsed.mainline), vec!["e4", "e5", "Nf3"]);
        assert_eq!(parsed.mainline[0].side(), Color::White);
        assert_eq!(parsed.mainline[1].side(), Color::Black);
        assert_eq!(parsed.mainline[2].side(), Color::White);
        assert_eq!(parsed.result.as_deref(), Some("1-0"));
        assert!(parsed.variations.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_visitor_black_start_gets_placeholder() {
        let mut diagnostics = ErrorAccumulator::default();
        let start = StartPosition::from_fen(
            Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"),
            &mut diagnostics,
        );
        let parsed = parse_movetext("1...e5 2. Nf3", &start.position, &mut diagnostics);

        assert_eq!(parsed.mainline.len(), 3);
        assert_eq!(
            parsed.mainline[0],
            Ply::Placeholder {
                side: Color::Black
            }
        );
        assert_eq!(parsed.mainline[1], Ply::new("e5", Color::Black));
        assert_eq!(parsed.mainline[2], Ply::new("Nf3", Color::White));
        assert!(parsed.has_placeholder());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_visitor_skips_illegal_move() {
        let (parsed, diagnostics) = parse("1. e4 Qh8 e5 2. Nf3");

        assert_eq!(sans(&parsed.mainline), vec!["e4", "e5", "Nf3"]);
        let message = diagnostics.as_deref().expect("expected a diagnostic");
        assert!(message.contains("Skipped move: 'Qh8' at mainline index 1"));
    }

    #[test]
    fn test_visitor_parity_holds_for_every_ply() {
        let (parsed, _) = parse("1. d4 d5 2. c4 e6 3. Nc3 Nf6 4. Bg5 Be7");

        for (i, ply) in parsed.mainline.iter().enumerate() {
            assert_eq!(ply.side() == Color::Black, i % 2 == 1, "ply {i}");
        }
    }

    #[test]
    fn test_visitor_records_variation_at_replaced_ply() {
        let (parsed, diagnostics) = parse("1. e4 e5 (1... c5 2. Nf3 d6) 2. Nf3 Nc6 *");

        assert_eq!(sans(&parsed.mainline), vec!["e4", "e5", "Nf3", "Nc6"]);
        let branches = parsed.variations.get(&1).expect("variation at index 1");
        assert_eq!(branches.len(), 1);
        assert_eq!(sans(&branches[0]), vec!["c5", "Nf3", "d6"]);
        assert_eq!(branches[0][0].side(), Color::Black);
        assert_eq!(branches[0][1].side(), Color::White);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_visitor_sibling_variations_share_anchor() {
        let (parsed, _) = parse("1. e4 (1. d4 d5) (1. c4) e5");

        let branches = parsed.variations.get(&0).expect("variations at index 0");
        assert_eq!(branches.len(), 2);
        assert_eq!(sans(&branches[0]), vec!["d4", "d5"]);
        assert_eq!(sans(&branches[1]), vec!["c4"]);
        assert_eq!(sans(&parsed.mainline), vec!["e4", "e5"]);
    }

    #[test]
    fn test_visitor_nested_variations_are_skipped() {
        let (parsed, _) = parse("1. e4 e5 (1... c5 (1... e6) 2. Nf3) 2. Nf3");

        let branches = parsed.variations.get(&1).expect("variation at index 1");
        assert_eq!(sans(&branches[0]), vec!["c5", "Nf3"]);
        assert_eq!(parsed.variations.len(), 1);
    }

    #[test]
    fn test_visitor_attaches_comments() {
        let (parsed, _) = parse("{ A classic start. } 1. e4 { best by   test } e5 2. Nf3");

        assert_eq!(parsed.lead_comment.as_deref(), Some("A classic start."));
        assert_eq!(parsed.mainline[0].comment(), Some("best by test"));
        assert_eq!(parsed.mainline[1].comment(), None);
    }

    #[test]
    fn test_visitor_ignores_prose_between_moves() {
        let (parsed, diagnostics) = parse("White to play. 1. e4 e5 Good reply. 2. Nf3");

        assert_eq!(sans(&parsed.mainline), vec!["e4", "e5", "Nf3"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_visitor_prose_only_yields_empty_mainline() {
        let (parsed, _) = parse("Find the best continuation for White.");

        assert!(parsed.mainline.is_empty());
    }

    #[test]
    fn test_visitor_empty_body() {
        let (parsed, diagnostics) = parse("   ");

        assert!(parsed.mainline.is_empty());
        assert!(parsed.result.is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_sanitize_keeps_movetext_tokens() {
        let mut diagnostics = ErrorAccumulator::default();
        let cleaned = sanitize_movetext(
            "Study this: 1.e4! e5?! $1 (1... c5) {note} 1-0",
            &mut diagnostics,
        );

        assert_eq!(cleaned.split_whitespace().collect::<Vec<_>>(), vec![
            "1.e4!", "e5?!", "$1", "(", "1...", "c5", ")", "{note}", "1-0"
        ]);
    }

    #[test]
    fn test_sanitize_preserves_comment_contents() {
        let cleaned =
            sanitize_movetext("1. e4 { White to move (really) } e5", &mut ErrorAccumulator::default());

        assert!(cleaned.contains("{ White to move (really) }"));
    }

    #[test]
    fn test_visitor_black_start_without_moves_is_empty() {
        let mut diagnostics = ErrorAccumulator::default();
        let start = StartPosition::from_fen(
            Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
            &mut diagnostics,
        );
        let parsed = parse_movetext(
            "Black to move, find the plan. *",
            &start.position,
            &mut diagnostics,
        );

        assert!(parsed.mainline.is_empty());
        assert!(!parsed.has_placeholder());
    }

    #[test]
    fn test_visitor_notes_malformed_moves() {
        let (parsed, diagnostics) = parse("1. e4 Nf9 e5 2. e9 Nf3");

        assert_eq!(sans(&parsed.mainline), vec!["e4", "e5", "Nf3"]);
        let message = diagnostics.as_deref().expect("expected a diagnostic");
        assert!(message.contains("Skipped malformed move: 'Nf9'"));
        assert!(message.contains("Skipped malformed move: 'e9'"));
    }
}
