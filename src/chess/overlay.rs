//! Board decoration state: highlighted squares, arrows and orientation.
//! Independent of navigation; a record change does not touch it.

use std::fmt;

use shakmaty::{Color, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightColor {
    #[default]
    Red,
    Green,
    Blue,
}

impl HighlightColor {
    /// CSS `rgba()` with the given alpha.
    pub fn rgba(self, alpha: f32) -> String {
        let (r, g, b) = match self {
            Self::Red => (255, 0, 0),
            Self::Green => (0, 255, 0),
            Self::Blue => (0, 0, 255),
        };
        format!("rgba({r}, {g}, {b}, {alpha})")
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        })
    }
}

/// Keyboard modifier selecting the drawing color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Alt,
    Ctrl,
    Shift,
}

impl From<Modifier> for HighlightColor {
    fn from(modifier: Modifier) -> Self {
        match modifier {
            Modifier::Alt => Self::Red,
            Modifier::Ctrl => Self::Green,
            Modifier::Shift => Self::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub square: Square,
    pub color: HighlightColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    pub from: Square,
    pub to: Square,
    pub color: HighlightColor,
}

#[derive(Debug, Clone)]
pub struct Overlay {
    highlights: Vec<Highlight>,
    arrows: Vec<Arrow>,
    color: HighlightColor,
    orientation: Color,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            highlights: Vec::new(),
            arrows: Vec::new(),
            color: HighlightColor::default(),
            orientation: Color::White,
        }
    }
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlights `square` in the current color, or clears it if it is
    /// already highlighted. Returns whether the square is now highlighted.
    pub fn toggle(&mut self, square: Square) -> bool {
        if let Some(pos) = self.highlights.iter().position(|h| h.square == square) {
            self.highlights.remove(pos);
            return false;
        }
        self.highlights.push(Highlight {
            square,
            color: self.color,
        });
        true
    }

    /// Same toggle semantics as [`Overlay::toggle`], keyed by both squares.
    pub fn toggle_arrow(&mut self, from: Square, to: Square) -> bool {
        if let Some(pos) = self
            .arrows
            .iter()
            .position(|a| a.from == from && a.to == to)
        {
            self.arrows.remove(pos);
            return false;
        }
        self.arrows.push(Arrow {
            from,
            to,
            color: self.color,
        });
        true
    }

    pub fn current_color(&self) -> HighlightColor {
        self.color
    }

    /// Existing highlights keep their color.
    pub fn set_modifier(&mut self, modifier: Modifier) {
        self.color = modifier.into();
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn highlight_at(&self, square: Square) -> Option<HighlightColor> {
        self.highlights
            .iter()
            .find(|h| h.square == square)
            .map(|h| h.color)
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    /// Clears highlights and arrows. Color and orientation stay.
    pub fn reset(&mut self) {
        self.highlights.clear();
        self.arrows.clear();
    }

    pub fn orientation(&self) -> Color {
        self.orientation
    }

    pub fn flip(&mut self) -> Color {
        self.orientation = !self.orientation;
        self.orientation
    }
}
