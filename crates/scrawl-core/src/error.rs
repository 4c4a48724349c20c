use crate::detect::DetectTypeError;
use crate::layout::LayoutError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    DetectType(#[from] DetectTypeError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("invalid detector pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is the caller's fault (bad diagram text) rather than an internal failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::DetectType(_) | Self::Json(_) => true,
            Self::Layout(err) => err.is_parse(),
            Self::Pattern(_) => false,
        }
    }
}
