//! Error type shared by every ccdict-core operation.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for dictionary loading, storage and search.
#[derive(Debug, Error)]
pub enum DictError {
    /// A dictionary line does not follow `TRAD SIMP [PINYIN] ...`.
    #[error("unparseable dictionary line: {line:?}")]
    Parse { line: String },

    /// A source file could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Cangjie definition file deviates from its fixed format.
    #[error("malformed input-code table at line {line}: {reason}")]
    InputCodeFormat { line: usize, reason: String },

    /// A search or display field name that is not a dictionary field.
    #[error("unknown dictionary field: {0:?}")]
    UnknownField(String),

    /// A search term carried a regular expression that does not compile.
    #[error("invalid search pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A search command could not be tokenized or parsed.
    #[error("invalid search command: {0}")]
    CommandSyntax(String),

    #[error("storage error: {0}")]
    Store(#[from] redb::Error),

    #[error("encoding error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DictError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DictError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures caused by the caller's query rather than by data or storage.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            DictError::UnknownField(_)
                | DictError::InvalidPattern { .. }
                | DictError::CommandSyntax(_)
        )
    }
}

// redb splits its failures into one type per stage; all of them fold into `redb::Error`.
macro_rules! store_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for DictError {
                fn from(e: $ty) -> Self {
                    DictError::Store(e.into())
                }
            }
        )*
    };
}

store_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Convenience `Result` alias using [`DictError`].
pub type Result<T> = std::result::Result<T, DictError>;
