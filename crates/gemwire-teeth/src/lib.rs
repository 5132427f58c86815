//! Teeth encoding for 7-bit-clean transports.
//!
//! MIDI System Exclusive messages may only carry bytes in `0x00..=0x7F`.
//! Teeth packs every run of up to four bytes into a 5-byte group:
//!
//! ```text
//! ┌────────────────────────────┬──────┬──────┬──────┬──────┐
//! │ header                     │ d0   │ d1   │ d2   │ d3   │
//! │ 0 LLL b0 b1 b2 b3          │ 7bit │ 7bit │ 7bit │ 7bit │
//! └────────────────────────────┴──────┴──────┴──────┴──────┘
//! ```
//!
//! `LLL` is the number of meaningful bytes in the group (1-4) and `bN` is the
//! stripped most significant bit of byte `N`. The encoded length only depends
//! on the source length: `ceil(n / 4) * 5`.

pub mod codec;
pub mod error;

pub use codec::{decode, decoded_capacity, encode, encode_into, encoded_length};
pub use error::{Result, TeethError};

/// Number of source bytes carried by one group.
pub const BYTES_PER_GROUP: usize = 4;

/// Number of encoded bytes per group.
pub const GROUP_SIZE: usize = 5;
