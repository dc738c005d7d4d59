use thiserror::Error;

/// Canonical result for tabula.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing column, row, or label.
    #[error("not found: {0}")]
    NotFound(String),

    /// Length mismatches, unknown operation names, non-numeric targets.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The source or sink could not be read or written.
    #[error("I/O failure: {0}")]
    Io(#[source] std::io::Error),

    /// Permission denied on an external path.
    #[error("security error: {0}")]
    Security(String),

    /// Error with context chain for better debugging
    #[error("Error in {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```rust,no_run
    /// use tabula_core::error::Error;
    /// let err = Error::NotFound("column 'price'".into());
    /// let err = err.with_context("while aggregating batch 3");
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context layers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.root(), Error::InvalidArgument(_))
    }

    /// Get suggestions for common errors (e.g., column name suggestions).
    pub fn suggestions(&self) -> Vec<String> {
        match self.root() {
            Error::NotFound(msg) => {
                if msg.contains("column") {
                    vec!["Check that the column name is spelled correctly".into(),
                         "Verify the column exists in the CSV header".into()]
                } else if msg.contains("label") || msg.contains("row") {
                    vec!["Use iloc for positional access".into()]
                } else {
                    vec![]
                }
            }
            Error::InvalidArgument(msg) => {
                if msg.contains("batch size") {
                    vec!["Use a batch size of at least 1".into()]
                } else if msg.contains("length") {
                    vec!["Make sure both operands have the same number of rows".into()]
                } else if msg.contains("non-numeric") {
                    vec!["Drop or fill non-numeric cells before aggregating".into()]
                } else {
                    vec![]
                }
            }
            Error::Security(_) => vec!["Check file permissions on the source path".into()],
            _ => vec![],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Error::Security(e.to_string())
        } else {
            Error::Io(e)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidArgument(format!("config: {}", e))
    }
}
