use thiserror::Error;

pub type Result<T> = std::result::Result<T, SegflagError>;

#[derive(Debug, Error)]
pub enum SegflagError {
    /// Transient store failure (network, timeout). Retryable; the whole
    /// operation is re-issued, never resumed.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Storage(#[source] Box<opendal::Error>),

    /// A per-user or catalog blob exists but cannot be decoded.
    #[error("malformed blob '{key}': {reason}")]
    MalformedBlob { key: String, reason: String },

    #[error("malformed catalog: {0}")]
    MalformedCatalog(String),

    /// Image bytes for one record could not be fetched or decoded. Isolated
    /// to that record; the caller renders a placeholder and continues.
    #[error("image unavailable for '{key}': {reason}")]
    ImageUnavailable { key: String, reason: String },

    /// Mask and base image must share dimensions; the caller resizes both to
    /// the canonical size before composing.
    #[error("mask is {mask_w}x{mask_h} but base image is {image_w}x{image_h}")]
    DimensionMismatch {
        image_w: u32,
        image_h: u32,
        mask_w: u32,
        mask_h: u32,
    },

    #[error("unknown user: '{0}'")]
    UnknownUser(String),

    #[error("invalid password")]
    InvalidPassword,

    #[error("unsafe storage key: {0}")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<opendal::Error> for SegflagError {
    fn from(value: opendal::Error) -> Self {
        SegflagError::Storage(Box::new(value))
    }
}
