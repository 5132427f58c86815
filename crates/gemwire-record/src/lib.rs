//! Fixed-layout structured records.
//!
//! A [`RecordLayout`] is an ordered list of typed fields with a known packed
//! size. A [`Record`] holds one value per field and packs to, or unpacks from,
//! exactly that many bytes: big-endian, no padding, booleans as one byte and
//! `fix16` as signed 16.16 fixed point.
//!
//! Layouts are data. The Gemini settings and monitor layouts are built in;
//! others load from `*.layout.json` files through a [`LayoutRegistry`].

pub mod builtin;
pub mod config;
pub mod error;
pub mod layout;
pub mod record;
pub mod registry;

pub use builtin::{
    gem_monitor_update, gem_settings, GEM_MONITOR_UPDATE, GEM_MONITOR_UPDATE_PACKED_SIZE,
    GEM_SETTINGS, GEM_SETTINGS_PACKED_SIZE,
};
pub use config::RegistryConfig;
pub use error::{RecordError, Result};
pub use layout::{fix16_from_raw, fix16_to_raw, FieldKind, FieldSpec, RecordLayout};
pub use record::{Record, Value};
pub use registry::LayoutRegistry;
