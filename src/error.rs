use thiserror::Error;

/// How much of an offending input is echoed back in error messages.
const MAX_DETAIL: usize = 200;

/// Error type shared by every fallible operation in the kernel.
///
/// Errors are plain values; partial operations and exhausted step budgets
/// are reported through these variants, never through panics.
#[derive(Error, Debug)]
pub enum UACalcError {
    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("undefined: {message}")]
    Undefined { message: String },

    #[error("out of range: {message}")]
    OutOfRange { message: String },

    #[error("signature mismatch: {message}")]
    SignatureMismatch { message: String },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("truncated: {operation} stopped after {steps} steps")]
    Truncated { operation: String, steps: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UACalcError {
    pub fn parse(message: impl Into<String>) -> Self {
        UACalcError::ParseError { message: clip(message.into()) }
    }

    pub fn undefined(message: impl Into<String>) -> Self {
        UACalcError::Undefined { message: clip(message.into()) }
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        UACalcError::OutOfRange { message: clip(message.into()) }
    }

    pub fn signature(message: impl Into<String>) -> Self {
        UACalcError::SignatureMismatch { message: clip(message.into()) }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        UACalcError::InvariantViolation { message: clip(message.into()) }
    }

    pub fn truncated(operation: impl Into<String>, steps: u64) -> Self {
        UACalcError::Truncated { operation: operation.into(), steps }
    }

    /// Stable machine-readable kind, used by the CLI envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            UACalcError::ParseError { .. } => "ParseError",
            UACalcError::Undefined { .. } => "Undefined",
            UACalcError::OutOfRange { .. } => "OutOfRange",
            UACalcError::SignatureMismatch { .. } => "SignatureMismatch",
            UACalcError::InvariantViolation { .. } => "InvariantViolation",
            UACalcError::Truncated { .. } => "Truncated",
            UACalcError::Io(_) => "IOError",
            UACalcError::Serialization(_) => "IOError",
        }
    }
}

fn clip(mut s: String) -> String {
    if s.len() > MAX_DETAIL {
        let mut cut = MAX_DETAIL;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

pub type UACalcResult<T> = Result<T, UACalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_detail_is_clipped() {
        let err = UACalcError::parse("x".repeat(500));
        let msg = err.to_string();
        assert!(msg.len() < 300);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(UACalcError::undefined("f").kind(), "Undefined");
        assert_eq!(UACalcError::truncated("cg", 10).kind(), "Truncated");
    }
}
