/// Limits applied when loading layouts from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of layouts loaded from a directory.
    pub max_layouts_from_directory: usize,
    /// Maximum bytes allowed per layout file loaded from a directory.
    pub max_layout_file_size: usize,
    /// When true, a directory layout may replace a built-in of the same name.
    pub allow_override: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_layouts_from_directory: 64,
            max_layout_file_size: 64 * 1024,
            allow_override: false,
        }
    }
}
