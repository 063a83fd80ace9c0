use thiserror::Error;

#[derive(Error, Debug)]
pub enum BomError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt container: {0}")]
    Corrupt(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error("duplicate tree key ({0} bytes)")]
    DuplicateKey(usize),
}

pub type Result<T> = std::result::Result<T, BomError>;
