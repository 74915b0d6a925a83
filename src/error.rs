use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrendError>;

#[derive(Error, Debug)]
pub enum TrendError {
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Revision not found: {0}")]
    RevisionNotFound(String),
    #[error("Unreadable content {id}: {reason}")]
    Unreadable { id: String, reason: String },
    #[error("Extension '{extension}' is claimed by both '{first}' and '{second}'")]
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },
    #[error("Invalid column spec '{0}': empty extension")]
    InvalidColumn(String),
    #[error("No file extensions to count lines for")]
    NoColumns,
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Revision walk error: {0}")]
    RevWalk(#[from] Box<gix::revision::walk::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::object::find::existing::Error> for TrendError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        TrendError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for TrendError {
    fn from(err: gix::object::commit::Error) -> Self {
        TrendError::Commit(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for TrendError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        TrendError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for TrendError {
    fn from(err: gix::objs::decode::Error) -> Self {
        TrendError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::revision::walk::Error> for TrendError {
    fn from(err: gix::revision::walk::Error) -> Self {
        TrendError::RevWalk(Box::new(err))
    }
}

impl From<gix::discover::Error> for TrendError {
    fn from(err: gix::discover::Error) -> Self {
        TrendError::GitDiscover(Box::new(err))
    }
}
