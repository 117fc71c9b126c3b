use thiserror::Error;

use crate::ops::Path;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("node at {0:?} cannot hold children")]
    NotAContainer(Path),
    #[error("expected a text node at {0:?}")]
    ExpectedText(Path),
}

impl DomError {
    pub(crate) fn out_of_bounds(depth: usize, ix: usize, len: usize) -> Self {
        DomError::InvalidPath(format!("Path out of bounds at depth {depth}: {ix} >= {len}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),
    #[error("unterminated comment starting at byte {0}")]
    UnterminatedComment(usize),
    #[error("invalid tag name at byte {0}")]
    InvalidTagName(usize),
    #[error("host parser unavailable: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurgeryError {
    #[error("no text node at {0:?}")]
    NotText(Path),
    #[error("span {start}..{end} is outside the text node")]
    SpanOutOfBounds { start: usize, end: usize },
    #[error("fragment could not be parsed: {0}")]
    Markup(#[from] MarkupError),
    #[error(transparent)]
    Dom(#[from] DomError),
}
