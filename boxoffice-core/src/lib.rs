pub mod hold;
pub mod seating;

pub use hold::{Hold, HoldError, HoldId, HoldStatus};
pub use seating::{Fragment, Seat};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),
    #[error("Fragment {inner} is not contained in {outer}")]
    NotContained { outer: String, inner: String },
    #[error("Fragments are not contiguous: {left} and {right}")]
    NotContiguous { left: String, right: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
