use std::collections::BTreeMap;

use shakmaty::Color;
use smallvec::SmallVec;

/// One half-move of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ply {
    Move {
        san: String,
        side: Color,
        comment: Option<String>,
    },
    /// Slot 0 of a record whose start position has Black to move.
    Placeholder { side: Color },
}

impl Ply {
    pub fn new(san: impl Into<String>, side: Color) -> Self {
        Self::Move {
            san: san.into(),
            side,
            comment: None,
        }
    }

    pub fn side(&self) -> Color {
        match self {
            Self::Move { side, .. } | Self::Placeholder { side } => *side,
        }
    }

    pub fn san(&self) -> Option<&str> {
        match self {
            Self::Move { san, .. } => Some(san),
            Self::Placeholder { .. } => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Move { comment, .. } => comment.as_deref(),
            Self::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

pub type Branch = SmallVec<[Ply; 8]>;

/// Mainline index → branches diverging there, in registration order.
pub type Variations = BTreeMap<usize, Vec<Branch>>;

/// Side owning mainline slot `index`. Holds because a Black-start mainline is
/// padded with a placeholder in slot 0.
pub fn side_at(index: usize) -> Color {
    if index.is_multiple_of(2) {
        Color::White
    } else {
        Color::Black
    }
}

/// Movetext of one record, as produced by the movetext parser.
#[derive(Debug, Clone, Default)]
pub struct ParsedMovetext {
    pub mainline: Vec<Ply>,
    pub variations: Variations,
    /// Comment placed before the first move.
    pub lead_comment: Option<String>,
    pub result: Option<String>,
}

impl ParsedMovetext {
    pub fn has_placeholder(&self) -> bool {
        self.mainline.first().is_some_and(Ply::is_placeholder)
    }
}
