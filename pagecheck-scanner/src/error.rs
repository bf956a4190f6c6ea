use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Corpus root is not a directory: {0}")]
    InvalidRoot(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
