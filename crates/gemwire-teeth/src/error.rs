/// Errors that can occur while decoding Teeth-encoded data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeethError {
    /// The encoded buffer is not made of whole 5-byte groups.
    #[error("invalid teeth-encoded length {len} (must be a multiple of {group})", group = crate::GROUP_SIZE)]
    InvalidEncodedLength { len: usize },
}

pub type Result<T> = std::result::Result<T, TeethError>;
