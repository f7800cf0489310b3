//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `projective`
#[derive(Error, Debug)]
pub enum Error {
    /// The input text (or a tree built from it) is not a valid polynomial
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// A raw operator tag does not name any known operation
    #[error("invalid operator '{0}'")]
    InvalidOperator(char),

    /// Subdivision depth must be at least 1
    #[error("subdivision depth must be at least 1")]
    BadDepth,

    /// Branching factors must be at least 1
    #[error("bad branch factor {0}; must be at least 1")]
    BadBranchFactor(u8),

    /// The sampling box must have positive, finite extent on every axis
    #[error("bad sampling box; {0} is not below {1}")]
    BadBounds(f64, f64),

    /// A background rebuild did not run to completion
    #[error("rebuild failed: {0}")]
    RebuildFailed(String),

    /// IO error; see inner code for details
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for building a [`Error::MalformedExpression`]
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedExpression(msg.into())
    }
}
