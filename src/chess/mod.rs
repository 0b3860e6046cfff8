pub mod chapter;
pub mod error;
pub mod library;
pub mod log;
pub mod metadata;
pub mod moves;
pub mod navigator;
pub mod overlay;
pub mod record;
pub mod rules;
pub mod split;
pub mod types;
pub mod visitor;

pub use chapter::{Chapter, Session};
pub use error::{ErrorAccumulator, StudyError};
pub use library::{ChapterFile, Library};
pub use navigator::{
    Continuation, Cursor, Navigator, NavigatorOptions, PlayOutcome, Step, VariationPolicy,
    VariationPrompt,
};
pub use overlay::{HighlightColor, Modifier, Overlay};
pub use record::Record;
pub use rules::{GameStatus, MoveInput};
pub use types::{Branch, Ply};
