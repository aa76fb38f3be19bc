//! Extension-based category resolution.
//!
//! Maps file names to destination category paths (e.g. `Documents/Text`)
//! using the configured extension table with a fallback default. Resolution
//! is a pure function of the file name and the configuration; file contents
//! are never inspected.

use crate::config::SortConfig;
use std::collections::HashMap;
use std::path::Path;

/// Resolves file names to category paths.
///
/// Built once per run from the configuration. Keys are held lowercase so
/// lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    extensions: HashMap<String, String>,
    default_category: String,
}

impl CategoryMap {
    pub fn from_config(config: &SortConfig) -> Self {
        Self {
            extensions: config
                .extension_categories
                .iter()
                .map(|(ext, category)| (ext.to_lowercase(), category.clone()))
                .collect(),
            default_category: config.default_category.clone(),
        }
    }

    /// Returns the category path for a file name.
    ///
    /// The extension is everything after the last `.`, compared
    /// case-insensitively. Names with no extension, and names whose
    /// extension is not in the table, resolve to the default category.
    ///
    /// # Examples
    ///
    /// ```
    /// use treesort::category::CategoryMap;
    /// use treesort::config::SortConfig;
    ///
    /// let categories = CategoryMap::from_config(&SortConfig::default());
    /// assert_eq!(categories.resolve("report.txt"), "Documents/Text");
    /// assert_eq!(categories.resolve("mystery.xyz"), "Miscellaneous/Other");
    /// ```
    pub fn resolve(&self, file_name: &str) -> &str {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.extensions.get(&ext.to_lowercase()))
            .map(String::as_str)
            .unwrap_or(&self.default_category)
    }

    /// The category used when no extension matches.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }
}
