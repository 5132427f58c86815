use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::builtin::{gem_monitor_update, gem_settings};
use crate::config::RegistryConfig;
use crate::error::{RecordError, Result};
use crate::layout::RecordLayout;

const LAYOUT_SUFFIX: &str = ".layout.json";

/// Name-keyed set of record layouts.
pub struct LayoutRegistry {
    layouts: BTreeMap<String, Arc<RecordLayout>>,
    config: RegistryConfig,
}

impl LayoutRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            layouts: BTreeMap::new(),
            config,
        }
    }

    /// Registry holding the built-in Gemini layouts.
    pub fn with_builtins() -> Self {
        Self::builtins_with_config(RegistryConfig::default())
    }

    fn builtins_with_config(config: RegistryConfig) -> Self {
        let mut registry = Self::with_config(config);
        for layout in [gem_settings(), gem_monitor_update()] {
            registry
                .layouts
                .insert(layout.name().to_string(), layout);
        }
        registry
    }

    /// Add a layout. Replacing an existing name requires `allow_override`.
    pub fn register(&mut self, layout: RecordLayout) -> Result<Arc<RecordLayout>> {
        if self.layouts.contains_key(layout.name()) && !self.config.allow_override {
            return Err(RecordError::InvalidLayout(format!(
                "layout '{}' is already registered",
                layout.name()
            )));
        }

        debug!(
            layout = layout.name(),
            packed_size = layout.packed_size(),
            "registered record layout"
        );
        let layout = Arc::new(layout);
        self.layouts
            .insert(layout.name().to_string(), Arc::clone(&layout));
        Ok(layout)
    }

    /// Parse a layout from JSON and add it.
    pub fn register_json(&mut self, json: &str) -> Result<Arc<RecordLayout>> {
        self.register(RecordLayout::from_json(json)?)
    }

    /// Built-in layouts plus every `*.layout.json` file in a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Built-in layouts plus a directory, with explicit config.
    ///
    /// Each file's stem must match the `name` inside it. Symlinked layout
    /// files are refused.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::builtins_with_config(config);
        let mut loaded_layout_count = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| RecordError::LoadFailed(format!("{}: {err}", path.display())))?;

        // Deterministic load order.
        let mut entries = entries
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|err| RecordError::LoadFailed(err.to_string()))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(stem) = file_name.strip_suffix(LAYOUT_SUFFIX) else {
                continue;
            };
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| RecordError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                return Err(RecordError::LoadFailed(format!(
                    "refusing to load layout symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            loaded_layout_count = loaded_layout_count.saturating_add(1);
            if loaded_layout_count > registry.config.max_layouts_from_directory {
                return Err(RecordError::LoadFailed(format!(
                    "layout count exceeds configured max ({}): {}",
                    registry.config.max_layouts_from_directory, loaded_layout_count
                )));
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                RecordError::LoadFailed(format!(
                    "failed opening layout {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| RecordError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(RecordError::LoadFailed(format!(
                        "layout file changed during load: {file_name}"
                    )));
                }
            }

            if opened_metadata.len() > registry.config.max_layout_file_size as u64 {
                return Err(RecordError::LoadFailed(format!(
                    "layout file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let max_bytes = registry.config.max_layout_file_size;
            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    RecordError::LoadFailed(format!(
                        "failed reading layout {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(RecordError::LoadFailed(format!(
                    "layout file too large while reading: {file_name}"
                )));
            }

            let layout = RecordLayout::from_json(&content)?;
            if layout.name() != stem {
                return Err(RecordError::LoadFailed(format!(
                    "{file_name} defines layout '{}'",
                    layout.name()
                )));
            }
            registry.register(layout)?;
        }

        info!(
            path = %path.display(),
            loaded = loaded_layout_count,
            "loaded record layouts"
        );
        Ok(registry)
    }

    /// Look up a layout by name.
    pub fn get(&self, name: &str) -> Result<Arc<RecordLayout>> {
        self.layouts
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::UnknownLayout(name.to_string()))
    }

    /// Check if a layout is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Registered layout names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.layouts.keys().map(String::as_str).collect()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}
