use std::fmt::{self, Write};

use serde_json::{Value, json};
use shakmaty::{Chess, Color, Position};

use super::navigator::Navigator;
use super::rules;
use super::types::Ply;

/// Fullmove number of the ply in slot `index`, counting the placeholder.
/// Saturates at `u32::MAX`; a FEN may start near the top of the range.
pub fn move_number(first_move_number: u32, index: usize) -> u32 {
    first_move_number.saturating_add(u32::try_from(index / 2).unwrap_or(u32::MAX))
}

/// One "N. white black" line of the move list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRow {
    pub number: u32,
    pub white: Option<String>,
    pub black: Option<String>,
}

impl fmt::Display for MoveRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.white, &self.black) {
            (Some(white), Some(black)) => write!(f, "{}. {white} {black}", self.number),
            (Some(white), None) => write!(f, "{}. {white}", self.number),
            (None, Some(black)) => write!(f, "{}... {black}", self.number),
            (None, None) => write!(f, "{}.", self.number),
        }
    }
}

/// Pairs the mainline into move-list rows.
pub fn rows(nav: &Navigator) -> Vec<MoveRow> {
    let first = nav.first_move_number();
    let mut rows: Vec<MoveRow> = Vec::new();

    for (index, ply) in nav.mainline().iter().enumerate() {
        let Some(san) = ply.san() else {
            continue;
        };
        let number = move_number(first, index);

        match ply.side() {
            Color::White => rows.push(MoveRow {
                number,
                white: Some(san.to_string()),
                black: None,
            }),
            Color::Black => match rows.last_mut() {
                Some(row) if row.number == number && row.black.is_none() => {
                    row.black = Some(san.to_string());
                }
                _ => rows.push(MoveRow {
                    number,
                    white: None,
                    black: Some(san.to_string()),
                }),
            },
        }
    }

    rows
}

/// PGN-like movetext with comments in braces and variations in parentheses.
pub fn render(nav: &Navigator) -> String {
    let first = nav.first_move_number();
    let mut out = String::new();
    // Black needs an explicit "N..." after a gap in the move sequence.
    let mut resume = true;

    if let Some(comment) = nav.lead_comment() {
        push_token(&mut out, &format!("{{{comment}}}"));
    }

    for (index, ply) in nav.mainline().iter().enumerate() {
        if ply.is_placeholder() {
            continue;
        }
        push_ply(&mut out, ply, move_number(first, index), resume);
        resume = ply.comment().is_some();

        for branch in nav.branches_at(index) {
            out.push_str(" (");
            let mut branch_text = String::new();
            let mut branch_resume = true;
            for (offset, ply) in branch.iter().enumerate() {
                push_ply(
                    &mut branch_text,
                    ply,
                    move_number(first, index + offset),
                    branch_resume,
                );
                branch_resume = ply.comment().is_some();
            }
            out.push_str(&branch_text);
            out.push(')');
            resume = true;
        }
    }

    if let Some(result) = nav.result() {
        push_token(&mut out, result);
    }

    out
}

fn push_token(out: &mut String, token: &str) {
    if !out.is_empty() && !out.ends_with(['(', ' ']) {
        out.push(' ');
    }
    out.push_str(token);
}

fn push_ply(out: &mut String, ply: &Ply, number: u32, resume: bool) {
    let Some(san) = ply.san() else {
        return;
    };

    let mut token = String::new();
    match ply.side() {
        Color::White => {
            let _ = write!(token, "{number}. ");
        }
        Color::Black if resume => {
            let _ = write!(token, "{number}... ");
        }
        Color::Black => {}
    }
    token.push_str(san);
    push_token(out, &token);

    if let Some(comment) = ply.comment() {
        push_token(out, &format!("{{{comment}}}"));
    }
}

/// `[{"ply":1,"move":"e4","fen":"..."}, ...]` for the mainline. Stops at the
/// first ply the position rejects.
pub fn mainline_json(nav: &Navigator) -> String {
    let mut pos: Chess = nav.start_position().clone();
    let mut entries = Vec::new();

    for san in nav.mainline().iter().filter_map(Ply::san) {
        let Some(m) = rules::resolve_san(&pos, san) else {
            tracing::warn!("Stopped move export at '{san}' (not legal in {})", rules::to_fen(&pos));
            break;
        };
        pos.play_unchecked(m);
        entries.push(json!({
            "ply": entries.len() + 1,
            "move": san,
            "fen": rules::to_fen(&pos),
        }));
    }

    Value::Array(entries).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::navigator::NavigatorOptions;
    use crate::chess::record::Record;

    fn navigator(text: &str) -> Navigator {
        Navigator::new(&Record::parse(text), NavigatorOptions::default())
    }

    #[test]
    fn test_move_number_counts_from_first() {
        assert_eq!(move_number(1, 0), 1);
        assert_eq!(move_number(1, 1), 1);
        assert_eq!(move_number(1, 2), 2);
        assert_eq!(move_number(17, 5), 19);
        assert_eq!(move_number(u32::MAX, 2), u32::MAX);
        assert_eq!(move_number(u32::MAX - 1, 2), u32::MAX);
    }

    #[test]
    fn test_render_with_huge_fullmove_number() {
        let nav = navigator(
            r#"[FEN "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 4294967295"] e4 e5 Nf3 1-0"#,
        );

        assert_eq!(render(&nav), "4294967295. e4 e5 4294967295. Nf3 1-0");
        assert_eq!(rows(&nav).len(), 2);
    }

    #[test]
    fn test_rows_pair_white_and_black() {
        let nav = navigator("1. e4 e5 2. Nf3 *");
        let rows: Vec<String> = rows(&nav).iter().map(ToString::to_string).collect();

        assert_eq!(rows, vec!["1. e4 e5", "2. Nf3"]);
    }

    #[test]
    fn test_rows_black_start_uses_fen_fullmove() {
        let nav = navigator(
            r#"[FEN "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 3 12"] 12... Nf6 13. Nc3 *"#,
        );
        let rows: Vec<String> = rows(&nav).iter().map(ToString::to_string).collect();

        assert_eq!(rows, vec!["12... Nf6", "13. Nc3"]);
    }

    #[test]
    fn test_render_with_variation_and_comment() {
        let nav = navigator("1. e4 {king pawn} e5 (1... c5 2. Nf3) 2. Nf3 1-0");

        assert_eq!(
            render(&nav),
            "1. e4 {king pawn} 1... e5 (1... c5 2. Nf3) 2. Nf3 1-0"
        );
    }

    #[test]
    fn test_render_black_start() {
        let nav = navigator(
            r#"[FEN "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"] 1... c5 2. Nf3 d6 1-0"#,
        );

        assert_eq!(render(&nav), "1... c5 2. Nf3 d6 1-0");
    }

    #[test]
    fn test_mainline_json_lists_plies_with_fen() {
        let nav = navigator("1. e4 e5 1-0");
        let value: Value = serde_json::from_str(&mainline_json(&nav)).unwrap();

        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["ply"], 1);
        assert_eq!(value[0]["move"], "e4");
        assert_eq!(
            value[1]["fen"],
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
    }

    #[test]
    fn test_mainline_json_empty_record() {
        let nav = navigator("Just a diagram, no moves.");

        assert_eq!(mainline_json(&nav), "[]");
    }

    #[test]
    fn test_mainline_json_skips_placeholder() {
        let nav = navigator(
            r#"[FEN "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"] 1... e5 *"#,
        );
        let value: Value = serde_json::from_str(&mainline_json(&nav)).unwrap();

        assert_eq!(value[0]["ply"], 1);
        assert_eq!(value[0]["move"], "e5");
    }
}
