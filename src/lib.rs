//! Annotated chess records: splitting chapter files, parsing movetext with
//! variations, and navigating the resulting tree position by position.

pub mod chess;

pub use chess::{
    Chapter, Continuation, Cursor, GameStatus, Library, MoveInput, Navigator, NavigatorOptions,
    Overlay, Ply, Record, Session, Step, StudyError, VariationPolicy,
};
