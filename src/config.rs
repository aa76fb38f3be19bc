//! Sorting configuration: the resolved lookup tables that drive
//! categorization and project detection.
//!
//! Configuration is stored in JSON. All keys are optional; a key that is
//! absent falls back to the built-in default for that key, and unknown keys
//! are ignored:
//!
//! ```json
//! {
//!     "extension_categories": {"txt": "Documents/Text"},
//!     "default_category": "Miscellaneous/Other",
//!     "project_file_markers": [".git", "Cargo.toml"],
//!     "project_dir_markers": ["node_modules"],
//!     "app_bundle_suffixes": [".app"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or validating a configuration file.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid JSON syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The resolved lookup tables for one sorting run.
///
/// A run borrows the configuration and never mutates it; reloading a file
/// has no effect on a run already in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Lowercase extension (no leading dot) to category path,
    /// e.g. `"txt" -> "Documents/Text"`.
    #[serde(default = "defaults::extension_categories")]
    pub extension_categories: HashMap<String, String>,

    /// Category path for files with no extension or an unrecognized one.
    #[serde(default = "defaults::default_category")]
    pub default_category: String,

    /// Child names whose exact presence marks a directory as a project
    /// (marker files, e.g. `Cargo.toml`).
    #[serde(default = "defaults::project_file_markers")]
    pub project_file_markers: Vec<String>,

    /// Child names whose exact presence marks a directory as a project
    /// (marker directories, e.g. `node_modules`).
    #[serde(default = "defaults::project_dir_markers")]
    pub project_dir_markers: Vec<String>,

    /// Directory-name suffixes treated as opaque application bundles,
    /// e.g. `.app`.
    #[serde(default = "defaults::app_bundle_suffixes")]
    pub app_bundle_suffixes: Vec<String>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            extension_categories: defaults::extension_categories(),
            default_category: defaults::default_category(),
            project_file_markers: defaults::project_file_markers(),
            project_dir_markers: defaults::project_dir_markers(),
            app_bundle_suffixes: defaults::app_bundle_suffixes(),
        }
    }
}

impl SortConfig {
    /// Load configuration with fallback to the built-in defaults.
    ///
    /// Attempts to load in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `treesort.json` in the current directory
    /// 3. Look for `~/.config/treesort/config.json`
    /// 4. Fall back to the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file was found (or explicitly
    /// given) but cannot be read, parsed, or validated.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from("treesort.json");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("treesort")
                .join("config.json");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Lowercases extension keys so lookups can assume lowercase.
    fn normalize(&mut self) {
        self.extension_categories = std::mem::take(&mut self.extension_categories)
            .into_iter()
            .map(|(ext, category)| (ext.to_lowercase(), category))
            .collect();
    }

    /// Checks the constraints serde cannot express.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_category.trim().is_empty() {
            return Err(ConfigError::ConfigInvalid(
                "default_category must not be empty".to_string(),
            ));
        }
        for (ext, category) in &self.extension_categories {
            if ext.is_empty() {
                return Err(ConfigError::ConfigInvalid(
                    "extension_categories keys must not be empty".to_string(),
                ));
            }
            if category.trim().is_empty() {
                return Err(ConfigError::ConfigInvalid(format!(
                    "extension_categories entry '{}' has an empty category",
                    ext
                )));
            }
        }
        Ok(())
    }
}

/// Built-in fallback tables, used key-by-key when a configuration file omits
/// a key and wholesale when no configuration file is found.
mod defaults {
    use std::collections::HashMap;

    pub(super) fn extension_categories() -> HashMap<String, String> {
        let mut map = HashMap::new();
        let mut add = |extensions: &[&str], category: &str| {
            for ext in extensions {
                map.insert((*ext).to_string(), category.to_string());
            }
        };

        add(&["txt", "md", "rtf", "odt", "tex"], "Documents/Text");
        add(
            &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "ods", "odp", "csv"],
            "Documents/Office",
        );
        add(&["pdf"], "Documents/PDF");
        add(
            &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "svg", "ico"],
            "Images/Photos",
        );
        add(&["psd", "ai", "sketch"], "Images/Design");
        add(&["mp3", "wav", "flac", "ogg", "m4a", "aac", "wma"], "Audio/Music");
        add(&["m3u", "pls"], "Audio/Playlists");
        add(&["mp4", "mkv", "avi", "mov", "wmv", "webm", "flv"], "Video/Movies");
        add(&["zip", "rar", "7z", "tar", "gz", "bz2", "xz"], "Archives/Compressed");
        add(&["js", "jsx", "ts", "tsx"], "SourceCode/Web/JavaScript");
        add(&["html", "htm"], "SourceCode/Web/Markup");
        add(&["css", "scss"], "SourceCode/Web/Styles");
        add(&["py"], "SourceCode/Python");
        add(&["sh", "zsh", "bash"], "SourceCode/Shell");
        add(&["c", "cpp", "h", "hpp", "rs", "go"], "SourceCode/Systems");
        add(&["java", "kt"], "SourceCode/JVM");
        add(&["json", "xml", "yaml", "yml", "toml"], "SourceCode/Data");
        add(&["ttf", "otf", "woff", "woff2"], "Fonts");

        map
    }

    pub(super) fn default_category() -> String {
        "Miscellaneous/Other".to_string()
    }

    pub(super) fn project_file_markers() -> Vec<String> {
        vec![
            ".git",
            "package.json",
            "Cargo.toml",
            "pyproject.toml",
            "setup.py",
            "requirements.txt",
            "go.mod",
            "pom.xml",
            "build.gradle",
            "Makefile",
            "CMakeLists.txt",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub(super) fn project_dir_markers() -> Vec<String> {
        vec!["node_modules", "venv", ".venv", ".idea"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub(super) fn app_bundle_suffixes() -> Vec<String> {
        vec![".app".to_string()]
    }
}
