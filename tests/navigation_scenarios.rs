use chess_study::chess::rules::{self, MoveInput};
use chess_study::chess::split::split_records;
use chess_study::chess::types::side_at;
use chess_study::{
    Chapter, Continuation, Cursor, Navigator, NavigatorOptions, Ply, Record, Session, Step,
};
use shakmaty::{Chess, Color, Square};

const LESSON: &str = r#"[Event "Open games"]
[White "Teacher"]
[Black "Student"]
[Annotator "Coach"]

The classical centre. 1. e4 e5 (1... c5 {the Sicilian} 2. Nf3 d6) 2. Nf3 Nc6
(2... d6 3. d4) 3. Bb5 a6 *

[Event "Defence"]
[FEN "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"]
Black to move. 1... e5 2. Nf3 Nc6 0-1

[Event "Diagram only"]
Note the weak squares around the king. *
"#;

fn navigator(text: &str) -> Navigator {
    Navigator::new(&Record::parse(text), NavigatorOptions::default())
}

fn start_fen() -> String {
    rules::to_fen(&Chess::default())
}

#[test]
fn test_splitter_finds_every_record() {
    let records = split_records(LESSON);

    assert_eq!(records.len(), 3);
    assert!(records[0].starts_with("[Event \"Open games\"]"));
    assert!(records[1].ends_with("0-1"));
    assert!(records[2].contains("weak squares"));
}

#[test]
fn test_mainline_parity_holds_for_every_record() {
    let chapter = Chapter::parse(LESSON);

    for record in chapter.records() {
        let nav = Navigator::new(record, NavigatorOptions::default());
        for (index, ply) in nav.mainline().iter().enumerate() {
            if !ply.is_placeholder() {
                assert_eq!(ply.side(), side_at(index), "ply {index} of {}", record.title());
            }
        }
    }
}

#[test]
fn test_inline_tags_scenario() {
    let record = Record::parse(r#"[White "A"][Black "B"] 1. e4 e5 2. Nf3 *"#);
    let nav = Navigator::new(&record, NavigatorOptions::default());

    assert_eq!(record.white(), "A");
    assert_eq!(record.black(), "B");
    assert_eq!(
        nav.mainline(),
        &[
            Ply::new("e4", Color::White),
            Ply::new("e5", Color::Black),
            Ply::new("Nf3", Color::White),
        ]
    );
    assert_eq!(nav.cursor(), Cursor::Mainline(0));
}

#[test]
fn test_black_start_scenario() {
    let nav = navigator(
        r#"[FEN "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"] 1...e5 2. Nf3 *"#,
    );

    assert_eq!(nav.mainline().len(), 3);
    assert!(nav.mainline()[0].is_placeholder());
    assert_eq!(nav.mainline()[0].side(), Color::Black);
    assert_eq!(nav.mainline()[1], Ply::new("e5", Color::Black));
    assert_eq!(nav.mainline()[2], Ply::new("Nf3", Color::White));
    assert_eq!(nav.cursor(), Cursor::Mainline(1));
}

#[test]
fn test_confirming_play_scenario() {
    let mut nav = navigator("1. e4 e5 2. Nf3 Nc6 *");
    nav.jump_to_index(2);

    nav.play(&MoveInput::san("Nf3")).unwrap();

    assert_eq!(nav.cursor(), Cursor::Mainline(3));
    assert!(nav.variations().is_empty());
}

#[test]
fn test_reconstruction_is_stable_across_paths() {
    let mut nav = navigator("1. e4 e5 (1... c5 2. Nf3 d6) 2. Nf3 Nc6 *");

    nav.jump_to_variation(1, 0, 2).unwrap();
    let direct = nav.fen();

    nav.jump_to_index(0);
    nav.advance();
    assert!(matches!(nav.advance(), Step::Prompt(_)));
    nav.choose(Continuation::Variation(0)).unwrap();
    nav.advance();
    nav.advance();

    assert_eq!(nav.fen(), direct);
    assert_eq!(nav.fen(), nav.fen());
}

#[test]
fn test_advance_then_retreat_returns_to_start() {
    let mut nav = navigator("1. d4 Nf6 2. c4 e6 3. Nf3 b6 4. g3 Ba6 *");

    for _ in 0..8 {
        assert!(matches!(nav.advance(), Step::Moved(_)));
    }
    for _ in 0..8 {
        assert!(matches!(nav.retreat(), Step::Moved(_)));
    }

    assert_eq!(nav.cursor(), Cursor::Mainline(0));
    assert_eq!(nav.fen(), start_fen());
}

#[test]
fn test_variation_play_leaves_mainline_intact() {
    let mut nav = navigator("1. e4 e5 2. Nf3 Nc6 3. Bb5 *");
    let before: Vec<Ply> = nav.mainline().to_vec();
    nav.jump_to_index(2);

    nav.play(&MoveInput::squares(Square::D2, Square::D4)).unwrap();
    nav.play(&MoveInput::san("exd4")).unwrap();

    assert_eq!(nav.mainline(), before.as_slice());
    assert_eq!(nav.line(), vec!["e4", "e5", "d4", "exd4"]);

    nav.jump_to_index(2);
    nav.choose(Continuation::Mainline).unwrap();
    assert_eq!(nav.last_move(), Some(&before[2]));
}

#[test]
fn test_session_walks_whole_chapter() {
    let mut session = Session::new(Chapter::parse(LESSON), NavigatorOptions::default());

    let first = session.navigator().unwrap();
    assert_eq!(first.branches_at(1).len(), 1);
    assert_eq!(first.branches_at(3).len(), 1);
    assert_eq!(first.lead_comment(), None);
    assert_eq!(first.branches_at(1)[0][0].comment(), Some("the Sicilian"));

    assert!(session.next_record());
    assert_eq!(session.navigator().unwrap().cursor(), Cursor::Mainline(1));

    assert!(session.next_record());
    let diagram = session.navigator().unwrap();
    assert!(diagram.mainline().is_empty());
    assert_eq!(diagram.fen(), start_fen());
    assert_eq!(
        session.record().unwrap().annotation(),
        "Note the weak squares around the king."
    );

    assert!(!session.next_record());
}
