use std::fmt::{self, Display, Formatter};

/// Error type for evaluating free programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeError {
    /// A value flowing between continuations did not have the expected type.
    ///
    /// Programs built through [`Free`](super::Free) cannot produce this; it
    /// indicates a bug in the engine.
    TypeMismatch {
        /// Description of the context where mismatch occurred.
        context: &'static str,
    },
    /// Bounded evaluation interpreted `limit` instructions without reaching a
    /// pure value.
    StepLimitExceeded {
        /// The step budget that was exhausted.
        limit: usize,
    },
}

impl Display for FreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { context } => {
                write!(f, "Type mismatch in free program: {context}")
            }
            Self::StepLimitExceeded { limit } => {
                write!(f, "Program did not finish within {limit} steps")
            }
        }
    }
}

impl std::error::Error for FreeError {}
