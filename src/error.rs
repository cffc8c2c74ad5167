use thiserror::Error;

/// A failed boundary call. The message is the merged engine diagnostics, or
/// a fixed fallback when the engine reported nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VizError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Layout(String),
    #[error("{0}")]
    Render(String),
}

impl VizError {
    pub fn message(&self) -> &str {
        match self {
            VizError::Parse(m) | VizError::Layout(m) | VizError::Render(m) => m,
        }
    }
}

pub type VizResult<T> = Result<T, VizError>;
