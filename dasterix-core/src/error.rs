use thiserror::Error;

/// Unified error type for ASTERIX definition loading and decoding failures.
///
/// The engine never aborts on bad input: decode errors surface either as a
/// value of this type or as a `format_ok = false` flag on the partially
/// decoded record, and definition-load errors are reported per file so the
/// remaining grammar files can still populate the registry.
#[derive(Debug, Error)]
pub enum AsterixError {
    /// Malformed XML, DTD violation or disallowed element nesting.
    /// Raised during definition load only.
    #[error("{file}:{line}: {message}")]
    Schema {
        file: String,
        line: usize,
        message: String,
    },

    /// FSPEC selects a FRN whose UAP entry names a data item the category
    /// does not define.
    #[error("category {category}: FRN {frn} refers to unknown item {item}")]
    SchemaMismatch {
        category: u16,
        frn: usize,
        item: String,
    },

    /// A declared length or repetition count runs past the available bytes.
    #[error("truncated data: {needed} bytes needed, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Structurally invalid data: FSPEC longer than the UAP allows, FX set
    /// on the last declared Variable part, Explicit length of zero, or an
    /// inner decoder that under-consumes its Explicit payload.
    #[error("invalid data: {0}")]
    Invalid(String),

    /// The bit reader was asked to read outside the slice.
    #[error("bit range {from}..{to} outside of {bits} available bits")]
    OutOfRange { from: usize, to: usize, bits: usize },

    /// A data block carries a category number with no loaded definition.
    #[error("no definition loaded for category {0}")]
    UnknownCategory(u8),

    /// Manifest or grammar file could not be read.
    #[error("configuration error: {0}")]
    Config(String),

    /// Offset plus lookahead would exceed the representable range.
    #[error("offset out of range")]
    Overflow,
}

impl AsterixError {
    /// Shorthand used by the decoders for `Invalid` with a formatted message.
    pub fn invalid(message: impl Into<String>) -> Self {
        AsterixError::Invalid(message.into())
    }
}
