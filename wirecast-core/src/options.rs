//! Per-call serializer configuration.

/// Text path used when writing strings.
///
/// Readers accept both paths regardless of this setting; the sign of the
/// string header tells them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StringEncoding {
    /// Negated UTF-8 byte count, UTF-16 length hint, UTF-8 bytes.
    #[default]
    Utf8,
    /// UTF-16 code unit count followed by little-endian code units.
    Utf16,
}

/// Immutable options for one serialize or deserialize call.
///
/// # Example
///
/// ```
/// use wirecast_core::SerializerOptions;
///
/// let options = SerializerOptions::default()
///     .with_max_depth(32)
///     .with_track_references(false);
/// assert_eq!(options.max_depth, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerializerOptions {
    /// Maximum formatter nesting before the call fails with `DepthExceeded`.
    pub max_depth: usize,
    /// Emit and honor back-references for shared pointers.
    pub track_references: bool,
    /// Text path for written strings.
    pub string_encoding: StringEncoding,
    /// Hard cap on the bytes one call may produce or buffer.
    pub max_buffer_size: usize,
}

impl SerializerOptions {
    /// Default nesting limit.
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Default buffer cap; collection headers cannot describe more.
    pub const DEFAULT_MAX_BUFFER_SIZE: usize = i32::MAX as usize;

    /// Options with every field at its default.
    pub const DEFAULT: Self = Self {
        max_depth: Self::DEFAULT_MAX_DEPTH,
        track_references: true,
        string_encoding: StringEncoding::Utf8,
        max_buffer_size: Self::DEFAULT_MAX_BUFFER_SIZE,
    };

    /// Set the nesting limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable back-references.
    #[must_use]
    pub const fn with_track_references(mut self, track: bool) -> Self {
        self.track_references = track;
        self
    }

    /// Select the string write path.
    #[must_use]
    pub const fn with_string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.string_encoding = encoding;
        self
    }

    /// Set the buffer cap.
    #[must_use]
    pub const fn with_max_buffer_size(mut self, max: usize) -> Self {
        self.max_buffer_size = max;
        self
    }
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
