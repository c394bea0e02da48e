//! Errors raised while capturing and expanding do blocks.

use swc_common::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesugarError {
    #[error("`{entry}` call is missing its block argument")]
    MissingBlock { span: Span, entry: String },

    #[error("`{entry}` call is missing its monad argument")]
    MissingAbstraction { span: Span, entry: String },

    #[error("`{entry}` block contains no statements")]
    EmptyBlock { span: Span, entry: String },

    #[error("unexpected argument to `{entry}`: {reason}")]
    UnexpectedArgument {
        span: Span,
        entry: String,
        reason: &'static str,
    },

    #[error("left-hand side of `<-` is not a binding pattern")]
    InvalidBindPattern { span: Span },

    #[error("malformed `{keyword}` escape: {reason}")]
    InvalidEscape {
        span: Span,
        keyword: String,
        reason: &'static str,
    },

    #[error("`return` may only appear as the last statement of a do block")]
    EarlyReturn { span: Span },
}

impl DesugarError {
    pub fn span(&self) -> Span {
        match self {
            DesugarError::MissingBlock { span, .. }
            | DesugarError::MissingAbstraction { span, .. }
            | DesugarError::EmptyBlock { span, .. }
            | DesugarError::UnexpectedArgument { span, .. }
            | DesugarError::InvalidBindPattern { span }
            | DesugarError::InvalidEscape { span, .. }
            | DesugarError::EarlyReturn { span } => *span,
        }
    }
}

/// Every error found in one module.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} error(s) while expanding do blocks", .0.len())]
pub struct DesugarErrors(pub Vec<DesugarError>);

pub type DesugarResult<T> = Result<T, DesugarError>;
