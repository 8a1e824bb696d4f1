//! Error type shared by all strata crates.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Broad classification of an error.
///
/// The analyzer uses the kind to decide whether an error aborts analysis of
/// the whole statement or may be retried on a later pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    General,
    /// Wrong number of children passed to a rebuild.
    Arity,
    UnknownFunction,
    UnknownTableFunction,
    UnknownDatabase,
    UnknownTable,
    UnknownTrigger,
    InvalidArgument,
    AmbiguousColumn,
    /// Explicit column alias list does not match the aliased plan's width.
    ColumnCountMismatch,
    UnresolvedColumn,
    UnresolvedTableColumn,
    /// Plan still contains unresolved nodes or expressions after analysis.
    Unresolved,
    TriggersNotSupported,
    /// Fixed-point batch exceeded its iteration cap.
    NonConvergence,
    Cancelled,
    NotImplemented,
    Internal,
}

impl ErrorKind {
    /// If an error of this kind may go away after more of the surrounding
    /// tree gets resolved.
    pub const fn is_deferrable(&self) -> bool {
        matches!(self, Self::UnresolvedColumn | Self::UnresolvedTableColumn)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Arity => "Arity",
            Self::UnknownFunction => "UnknownFunction",
            Self::UnknownTableFunction => "UnknownTableFunction",
            Self::UnknownDatabase => "UnknownDatabase",
            Self::UnknownTable => "UnknownTable",
            Self::UnknownTrigger => "UnknownTrigger",
            Self::InvalidArgument => "InvalidArgument",
            Self::AmbiguousColumn => "AmbiguousColumn",
            Self::ColumnCountMismatch => "ColumnCountMismatch",
            Self::UnresolvedColumn => "UnresolvedColumn",
            Self::UnresolvedTableColumn => "UnresolvedTableColumn",
            Self::Unresolved => "Unresolved",
            Self::TriggersNotSupported => "TriggersNotSupported",
            Self::NonConvergence => "NonConvergence",
            Self::Cancelled => "Cancelled",
            Self::NotImplemented => "NotImplemented",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct DbError {
    inner: Box<DbErrorInner>,
}

#[derive(Debug)]
struct DbErrorInner {
    kind: ErrorKind,
    msg: String,
    fields: Vec<(Cow<'static, str>, String)>,
    source: Option<Box<dyn Error + Send + Sync>>,
    backtrace: Backtrace,
}

impl DbError {
    /// Create a new error of kind `General`.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::General, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        DbError {
            inner: Box::new(DbErrorInner {
                kind,
                msg: msg.into(),
                fields: Vec::new(),
                source: None,
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    /// Attach a named value to the error for display.
    pub fn with_field(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl fmt::Display,
    ) -> Self {
        self.inner.fields.push((key.into(), value.to_string()));
        self
    }

    pub fn with_fields<K, V, I>(mut self, fields: I) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: fmt::Display,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in fields {
            self.inner.fields.push((key.into(), value.to_string()));
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn is_deferrable(&self) -> bool {
        self.inner.kind.is_deferrable()
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }

    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_backtrace(&self) -> Option<&Backtrace> {
        match self.inner.backtrace.status() {
            BacktraceStatus::Captured => Some(&self.inner.backtrace),
            _ => None,
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;

        for (key, value) in &self.inner.fields {
            write!(f, "\n{key}: {value}")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if let Some(backtrace) = self.get_backtrace() {
            write!(f, "\nBacktrace: {backtrace}")?;
        }

        Ok(())
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for DbError {
    fn from(value: fmt::Error) -> Self {
        DbError::with_source("Format error", Box::new(value))
    }
}

pub trait ResultExt<T, E> {
    /// Wrap an error with a static context message.
    fn context(self, msg: &'static str) -> Result<T, DbError>;

    /// Wrap an error with a lazily built context message.
    fn context_fn<F>(self, f: F) -> Result<T, DbError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T, DbError> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F>(self, f: F) -> Result<T, DbError>
    where
        F: FnOnce() -> String,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(f(), Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Error with an internal error if the value is `None`.
    fn required(self, msg: &'static str) -> Result<T, DbError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T, DbError> {
        match self {
            Some(v) => Ok(v),
            None => Err(DbError::with_kind(
                ErrorKind::Internal,
                format!("Missing required value: {msg}"),
            )),
        }
    }
}

/// Return early with a `NotImplemented` error.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::DbError::with_kind(
            $crate::ErrorKind::NotImplemented,
            format!("Not yet implemented: {msg}"),
        ));
    }};
}
