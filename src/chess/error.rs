use std::path::PathBuf;

use thiserror::Error;

/// Parse diagnostics for one record, joined with `"; "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Rejections surfaced to the caller of the navigation engine and session.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("illegal move '{input}' in position {fen}")]
    IllegalMove { input: String, fen: String },

    #[error("no variation registered at mainline index {index}")]
    NoVariation { index: usize },

    #[error("variation {branch} at index {index} has no ply {offset}")]
    NoSuchPly {
        index: usize,
        branch: usize,
        offset: usize,
    },

    #[error("record {index} out of range (chapter has {len} records)")]
    NoSuchRecord { index: usize, len: usize },

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::{ErrorAccumulator, StudyError};

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first error");

        assert_eq!(accumulator.take().as_deref(), Some("first error"));
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first");
        accumulator.push("second");

        assert_eq!(accumulator.as_deref(), Some("first; second"));
    }

    #[test]
    fn test_take_consumes_accumulator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("error");

        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.is_empty());
        assert!(accumulator.take().is_none());
    }

    #[test]
    fn test_study_error_messages() {
        let err = StudyError::NoVariation { index: 3 };
        assert_eq!(err.to_string(), "no variation registered at mainline index 3");

        let err = StudyError::NoSuchRecord { index: 5, len: 2 };
        assert!(err.to_string().contains("chapter has 2 records"));
    }
}
