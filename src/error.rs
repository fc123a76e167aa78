//! Error types for subagent.
//!
//! The `Error` enum is `#[non_exhaustive]` to allow adding new variants
//! without breaking changes.

use crate::value::ValueKind;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// OID parse/resolution error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Symbolic name could not be resolved against the loaded MIBs.
    Unresolved,
    /// A dotted component is not a non-negative integer.
    InvalidComponent,
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::Unresolved => write!(f, "symbolic name not resolved"),
            Self::InvalidComponent => write!(f, "component is not a non-negative integer"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// SNMP error status codes (RFC 3416).
///
/// Handler stages short-circuit with one of these; the engine maps them
/// onto the response PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// OID text could not be parsed or resolved.
    #[error("invalid OID {input:?}: {kind}")]
    InvalidOid { input: Box<str>, kind: OidErrorKind },

    /// Registration attempted after the agent left the registration phase.
    #[error("attempt to register SNMP object {oidstr:?} after agent has been started")]
    RegistrationAfterStart { oidstr: Box<str> },

    /// Fatal first-attempt connection failure.
    #[error(
        "error connecting to master agent at {target:?} -- incorrect master socket or snmpd not running?"
    )]
    ConnectionFailed { target: String },

    /// A column number was defined twice on the same table.
    #[error("table {table:?} already defines column {column}")]
    DuplicateColumn { table: String, column: u32 },

    /// A cell operation named a column the table never declared.
    #[error("table {table:?} has no column {column}")]
    UnknownColumn { table: String, column: u32 },

    /// A value's kind disagrees with the declared kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// An index tuple does not match the table's declared index columns.
    #[error("table {table:?} declares {expected} index columns, got {actual}")]
    IndexMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// No row matches the given index.
    #[error("no row with index {index:?} in table {table:?}")]
    RowNotFound { table: String, index: String },

    /// A row with the same canonical index already exists.
    #[error("row with index {index:?} already exists in table {table:?}")]
    DuplicateIndex { table: String, index: String },

    /// An underlying engine call returned a non-zero result code.
    #[error("{operation} failed with error code {code}")]
    AgentOperation { operation: &'static str, code: i32 },
}

impl Error {
    /// Create an invalid OID error with the input text that failed.
    pub fn invalid_oid(input: impl Into<Box<str>>, kind: OidErrorKind) -> Self {
        Self::InvalidOid {
            input: input.into(),
            kind,
        }
    }

    /// Create an engine-operation error from a result code.
    pub fn operation(operation: &'static str, code: i32) -> Self {
        Self::AgentOperation { operation, code }
    }
}
