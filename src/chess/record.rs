use shakmaty::Color;

use super::error::ErrorAccumulator;
use super::metadata::{Metadata, TagSet, strip_tags};
use super::rules::StartPosition;
use super::types::ParsedMovetext;
use super::visitor::parse_movetext;

/// One annotated position or game from a chapter file. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct Record {
    raw: String,
    meta: Metadata,
    start: StartPosition,
    diagnostics: ErrorAccumulator,
}

impl Record {
    pub fn parse(span: &str) -> Self {
        let mut diagnostics = ErrorAccumulator::default();
        let meta = Metadata::extract(span);
        let start = StartPosition::from_fen(meta.fen(), &mut diagnostics);

        Self {
            raw: span.to_string(),
            meta,
            start,
            diagnostics,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tags(&self) -> &TagSet {
        &self.meta.tags
    }

    pub fn title(&self) -> &str {
        self.meta.title()
    }

    pub fn white(&self) -> &str {
        self.meta.white()
    }

    pub fn black(&self) -> &str {
        self.meta.black()
    }

    pub fn annotator(&self) -> &str {
        self.meta.annotator()
    }

    pub fn annotation(&self) -> &str {
        &self.meta.annotation
    }

    /// The FEN tag, when the record declares its own start.
    pub fn start_fen(&self) -> Option<&str> {
        self.meta.fen()
    }

    pub fn start(&self) -> &StartPosition {
        &self.start
    }

    pub fn starts_with_black(&self) -> bool {
        self.start.side_to_move() == Color::Black
    }

    /// Diagnostics gathered while reading tags and the start position.
    pub fn diagnostics(&self) -> &ErrorAccumulator {
        &self.diagnostics
    }

    /// Runs the movetext parser over the record body. Movetext diagnostics
    /// are appended to `diagnostics`.
    pub fn movetext(&self, diagnostics: &mut ErrorAccumulator) -> ParsedMovetext {
        parse_movetext(&strip_tags(&self.raw), &self.start.position, diagnostics)
    }
}
