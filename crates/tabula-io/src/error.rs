use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported encoding: {0}")]
    Encoding(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Core(#[from] tabula_core::Error),
}

impl From<Error> for tabula_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(io) => io.into(),
            Error::Csv(csv) => std::io::Error::from(csv).into(),
            Error::Encoding(label) => {
                tabula_core::Error::InvalidArgument(format!("unsupported encoding: {}", label))
            }
            Error::Parse { line, message } => {
                tabula_core::Error::InvalidArgument(format!("line {}: {}", line, message))
            }
            Error::Core(core) => core,
        }
    }
}
