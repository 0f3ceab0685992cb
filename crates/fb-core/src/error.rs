use thiserror::Error;

pub type FbResult<T> = Result<T, FbError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FbError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Missing table entry: {key}")]
    MissingKey { key: String },

    #[error("Table entry '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Signal type mismatch: expected {expected}, found {found}")]
    SignalMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
