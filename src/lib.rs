//! treesort - sort messy directory trees into predictable hierarchies
//!
//! Loose files are routed into category folders keyed by their extension,
//! while directories recognized as software projects or application bundles
//! are relocated intact into a dedicated area, never split apart. Sorting
//! runs in two phases (projects first, then files), optionally followed by
//! reclamation of the directories the moves left empty.

pub mod category;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;
pub mod project;
pub mod sorter;

pub use category::CategoryMap;
pub use config::{ConfigError, SortConfig};
pub use progress::SortingProgress;
pub use project::{ClaimedPaths, PROJECTS_DIR_NAME, ProjectMove, ProjectScanner};
pub use sorter::{SortError, SortReport, SortRequest, TreeSorter};
