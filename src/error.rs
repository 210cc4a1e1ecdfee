//! Error types for the protocol and the shared store
use thiserror::Error;

/// Failures of the shared-store transport
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("blob {name} does not exist")]
    NotFound { name: String },

    #[error("blob {name} already exists")]
    AlreadyExists { name: String },

    #[error("blob {name} holds {actual} bytes, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid blob name {name:?}")]
    InvalidName { name: String },

    /// The blob exists but does not hold a well-formed value
    #[error("blob {name} is unreadable: {message}")]
    Unreadable { name: String, message: String },

    #[error("I/O error on blob {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Translate an I/O error on a named blob, keeping the kinds callers branch on
    pub fn from_io(name: &str, source: std::io::Error) -> Self {
        let name = name.to_string();
        return match source.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound { name },
            std::io::ErrorKind::AlreadyExists => StoreError::AlreadyExists { name },
            _ => StoreError::Io { name, source },
        };
    }

    pub fn is_not_found(&self) -> bool {
        return matches!(self, StoreError::NotFound { .. });
    }
}

/// Failures of the veto protocol itself
#[derive(Error, Debug)]
pub enum AvpError {
    #[error("invalid ring: {message}")]
    InvalidRing { message: String },

    #[error("participant {id} is out of range for {total} participants")]
    InvalidParticipant { id: usize, total: usize },

    #[error("vote must be 0 (allow) or 1 (veto), got {0}")]
    InvalidVote(u8),

    /// The calibrated noise bound is too small to hide an honest vote
    #[error(
        "noise bound {bound} is too small for q = {modulus} and n = {participants}; \
         increase q or reduce n"
    )]
    InfeasibleParameters {
        modulus: i64,
        participants: usize,
        bound: i64,
    },

    /// A new arrival found a barrier block that a finished run left behind
    #[error(
        "barrier already counts {arrived} arrivals and released = {released} for {total} \
         participants; initialize the shared state before a new run"
    )]
    BarrierOverrun {
        arrived: usize,
        total: usize,
        released: bool,
    },

    #[error("share from participant {from} to participant {to} is unavailable: {source}")]
    ShareMissing {
        from: usize,
        to: usize,
        #[source]
        source: StoreError,
    },

    #[error("could not read participant {party}'s vote: {source}")]
    BallotMissing {
        party: usize,
        #[source]
        source: StoreError,
    },

    #[error("malformed blob: {message}")]
    Codec { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AvpError {
    pub fn codec(message: impl Into<String>) -> Self {
        return AvpError::Codec {
            message: message.into(),
        };
    }
}

pub type Result<T> = std::result::Result<T, AvpError>;
