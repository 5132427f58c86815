//! Splitting and reassembling an encoded record for chunked transfer.
//!
//! Chunks are slices of the *encoded* buffer, numbered from zero. Order is
//! fixed: chunk `n` always covers bytes `n * chunk_size ..`.

/// Number of chunks needed to carry `encoded_len` bytes.
pub fn chunk_count(encoded_len: usize, chunk_size: usize) -> usize {
    encoded_len.div_ceil(chunk_size.max(1))
}

/// Slice an encoded buffer into ascending chunks. The last may be shorter.
pub fn split_chunks(encoded: &[u8], chunk_size: usize) -> std::slice::Chunks<'_, u8> {
    encoded.chunks(chunk_size.max(1))
}

/// Concatenate chunks in order and trim to `encoded_len`.
///
/// Devices answer every read with a full chunk, so the final one can carry
/// padding past the end of the record.
pub fn reassemble_chunks<'a, I>(chunks: I, encoded_len: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut out = Vec::with_capacity(encoded_len);
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out.truncate(encoded_len);
    out
}
