use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    MissingId,
    DuplicateId,
    UnknownId,
    MissingField,
    IncompatibleVersion,
    InvalidOption,
    Parse,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn missing_id() -> Self {
        Error::new(ErrorKind::MissingId, "document has no id field")
    }

    pub fn duplicate_id(id: impl fmt::Debug) -> Self {
        Error::new(ErrorKind::DuplicateId, format!("duplicate id {:?}", id))
    }

    pub fn unknown_id(id: impl fmt::Debug) -> Self {
        Error::new(ErrorKind::UnknownId, format!("unknown id {:?}", id))
    }

    pub fn missing_field(field: &str) -> Self {
        Error::new(ErrorKind::MissingField, format!("unknown field '{}'", field))
    }

    pub fn invalid_option(reason: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidOption, reason.into())
    }

    pub fn incompatible_version(found: u32) -> Self {
        Error::new(
            ErrorKind::IncompatibleVersion,
            format!("unsupported serialized version {}", found),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SlimSearch: {}", self.context)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Parse, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
