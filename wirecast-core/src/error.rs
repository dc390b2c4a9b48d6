//! Error types for the wire engine.

use snafu::Snafu;

/// Error raised by any serialize or deserialize call.
///
/// Every variant aborts the current call. Nothing is downgraded to a
/// default value and no partially read value is handed back as valid.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum WireError {
    /// A header or payload byte is inconsistent with the expected shape.
    #[snafu(display("malformed input: {message}"))]
    Malformed {
        /// Error description.
        message: &'static str,
    },

    /// A collection or string length exceeds the bytes left in the input.
    #[snafu(display("declared length {declared} exceeds the {remaining} bytes remaining"))]
    LengthExceedsRemaining {
        /// Bytes implied by the header.
        declared: usize,
        /// Bytes left in the input.
        remaining: usize,
    },

    /// A varint does not fit the requested integer type.
    #[snafu(display("varint value {value} does not fit in {target}"))]
    VarIntOverflow {
        /// Decoded value.
        value: i128,
        /// Requested type.
        target: &'static str,
    },

    /// A buffer request exceeds the configured hard maximum.
    #[snafu(display("requested {requested} bytes, limit is {limit}"))]
    CapacityExceeded {
        /// Bytes the call needed in total.
        requested: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Nesting went deeper than `max_depth`.
    #[snafu(display("nesting depth exceeded the limit of {limit}"))]
    DepthExceeded {
        /// Configured limit.
        limit: usize,
    },

    /// A member count or union tag is not known to the active formatter.
    #[snafu(display("schema mismatch for {type_name}: {message}"))]
    SchemaMismatch {
        /// Type being formatted.
        type_name: &'static str,
        /// Error description.
        message: String,
    },

    /// No formatter is registered for the requested type.
    #[snafu(display("no formatter registered for {type_name}"))]
    NotRegistered {
        /// Requested type.
        type_name: &'static str,
    },

    /// A read went past the end of the input.
    #[snafu(display("sequence exhausted: needed {needed} bytes, {remaining} remaining"))]
    SequenceExhausted {
        /// Bytes requested.
        needed: usize,
        /// Bytes left.
        remaining: usize,
    },

    /// The underlying stream failed.
    #[snafu(display("stream i/o failed"))]
    Io {
        /// Source error.
        source: std::io::Error,
    },

    /// A stream operation was cancelled before completion.
    #[snafu(display("operation cancelled"))]
    Cancelled,
}

/// Coarse category of a [`WireError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input bytes are inconsistent with the expected shape.
    MalformedInput,
    /// Buffer growth beyond the hard maximum.
    CapacityExceeded,
    /// Nesting beyond `max_depth`, usually a cycle without reference tracking.
    DepthExceeded,
    /// Unknown member count or union tag.
    SchemaMismatch,
    /// No formatter for the requested type.
    NotRegistered,
    /// Read past the end of the input.
    SequenceExhausted,
    /// Stream failure.
    Io,
    /// Stream operation cancelled.
    Cancelled,
}

impl WireError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. }
            | Self::LengthExceedsRemaining { .. }
            | Self::VarIntOverflow { .. } => ErrorKind::MalformedInput,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::NotRegistered { .. } => ErrorKind::NotRegistered,
            Self::SequenceExhausted { .. } => ErrorKind::SequenceExhausted,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn schema<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            type_name: core::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

/// Result type for wire operations.
pub type Result<T, E = WireError> = core::result::Result<T, E>;
