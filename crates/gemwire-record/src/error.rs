/// Errors that can occur while defining, packing or unpacking records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The buffer length does not match the layout's packed size.
    #[error("{layout}: expected {expected} packed bytes, got {actual}")]
    SizeMismatch {
        layout: String,
        expected: usize,
        actual: usize,
    },

    /// The layout has no field with this name.
    #[error("{layout}: unknown field '{field}'")]
    UnknownField { layout: String, field: String },

    /// The value cannot be stored in a field of this kind.
    #[error("field '{field}' ({kind}) cannot hold {value}")]
    TypeMismatch {
        field: String,
        kind: &'static str,
        value: String,
    },

    /// The value is outside the range of the field's kind.
    #[error("field '{field}' ({kind}) out of range: {value}")]
    OutOfRange {
        field: String,
        kind: &'static str,
        value: String,
    },

    /// A layout definition failed validation.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// A JSON record document was not an object.
    #[error("record json must be an object")]
    NotAnObject,

    /// No layout registered under this name.
    #[error("no layout named '{0}'")]
    UnknownLayout(String),

    /// The layout file could not be loaded.
    #[error("failed to load layout: {0}")]
    LoadFailed(String),

    /// JSON parse error.
    #[error("layout json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;
