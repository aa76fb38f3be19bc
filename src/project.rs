//! Project and application-bundle detection, and the discovery pass that
//! claims whole directories for relocation as units.

use crate::config::SortConfig;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the output root that receives relocated projects.
pub const PROJECTS_DIR_NAME: &str = "Applications_And_Projects";

/// A whole-directory relocation decided by the discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMove {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Source directories already claimed for relocation as units.
///
/// Invariant: no entry is an ancestor or descendant of another, and entries
/// are never removed during a run. The containment check is a linear scan,
/// which is fine for the modest claim counts a single tree produces.
#[derive(Debug, Default)]
pub struct ClaimedPaths {
    paths: Vec<PathBuf>,
}

impl ClaimedPaths {
    /// True if `path` equals a claimed path or lies beneath one.
    pub fn covers(&self, path: &Path) -> bool {
        self.paths.iter().any(|claimed| path.starts_with(claimed))
    }

    pub fn insert(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

/// Applies the marker rules and runs the top-down discovery pass.
pub struct ProjectScanner<'a> {
    config: &'a SortConfig,
}

impl<'a> ProjectScanner<'a> {
    pub fn new(config: &'a SortConfig) -> Self {
        Self { config }
    }

    /// Decides whether a directory is a project or application unit.
    ///
    /// Checked in order: the directory's own name against the bundle
    /// suffixes, then each child name against the two marker lists. Does not
    /// touch the filesystem; the caller supplies the child listing so one
    /// `read_dir` can serve both this check and the traversal.
    pub fn is_project_or_app(&self, dir_path: &Path, child_names: &[String]) -> bool {
        if let Some(name) = dir_path.file_name().and_then(|n| n.to_str())
            && self
                .config
                .app_bundle_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
        {
            return true;
        }

        child_names.iter().any(|name| {
            self.config.project_file_markers.contains(name)
                || self.config.project_dir_markers.contains(name)
        })
    }

    /// Walks the tree top-down and returns the project relocations, claiming
    /// each matched directory so later passes skip its whole subtree.
    ///
    /// At each directory the classifier is applied to the directory itself,
    /// then to each immediate child; a match prunes descent, so project-like
    /// directories nested inside a claimed one are never claimed separately.
    /// All destinations land directly under `Applications_And_Projects` in
    /// the output root, independent of traversal order. A directory that
    /// cannot be listed is treated as a plain directory and skipped.
    pub fn identify_projects(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        claimed: &mut ClaimedPaths,
    ) -> Vec<ProjectMove> {
        let projects_root = output_dir.join(PROJECTS_DIR_NAME);
        let mut moves = Vec::new();
        let mut pending = vec![input_dir.to_path_buf()];

        while let Some(dir) = pending.pop() {
            if claimed.covers(&dir) {
                continue;
            }

            let listing = read_child_names(&dir);
            if let Some(names) = &listing
                && self.is_project_or_app(&dir, names)
            {
                claim(&dir, &projects_root, claimed, &mut moves);
                continue;
            }

            let Some(names) = listing else {
                continue;
            };

            for name in &names {
                let child = dir.join(name);
                if !is_real_dir(&child) || claimed.covers(&child) {
                    continue;
                }
                match read_child_names(&child) {
                    Some(child_names) if self.is_project_or_app(&child, &child_names) => {
                        claim(&child, &projects_root, claimed, &mut moves);
                    }
                    // Unlistable children stay in the walk; they classify as
                    // plain directories per the failure policy.
                    _ => pending.push(child),
                }
            }
        }

        moves
    }
}

fn claim(
    source: &Path,
    projects_root: &Path,
    claimed: &mut ClaimedPaths,
    moves: &mut Vec<ProjectMove>,
) {
    let Some(name) = source.file_name() else {
        return;
    };
    let destination = projects_root.join(name);
    debug!(
        "Claimed project '{}' -> '{}'",
        source.display(),
        destination.display()
    );
    claimed.insert(source.to_path_buf());
    moves.push(ProjectMove {
        source: source.to_path_buf(),
        destination,
    });
}

/// Lists a directory's immediate child names, or `None` if it cannot be
/// read. Failures are logged and never abort the enclosing pass.
pub(crate) fn read_child_names(dir: &Path) -> Option<Vec<String>> {
    match fs::read_dir(dir) {
        Ok(entries) => Some(
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
        ),
        Err(e) => {
            warn!("Cannot read directory '{}': {}", dir.display(), e);
            None
        }
    }
}

/// True for an actual directory; symlinks to directories are excluded so the
/// traversal never follows links.
pub(crate) fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|meta| meta.file_type().is_dir())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_marker_file_classifies_as_project() {
        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);

        let children = names(&[".git", "main.py", "README"]);
        assert!(scanner.is_project_or_app(Path::new("/src/proj"), &children));
    }

    #[test]
    fn test_marker_dir_classifies_as_project() {
        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);

        let children = names(&["node_modules", "index.js"]);
        assert!(scanner.is_project_or_app(Path::new("/src/webapp"), &children));
    }

    #[test]
    fn test_bundle_suffix_classifies_without_markers() {
        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);

        assert!(scanner.is_project_or_app(Path::new("/Applications/Foo.app"), &names(&[])));
    }

    #[test]
    fn test_plain_directory_is_not_a_project() {
        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);

        let children = names(&["notes.txt", "photo.jpg"]);
        assert!(!scanner.is_project_or_app(Path::new("/home/user/stuff"), &children));
    }

    #[test]
    fn test_marker_must_match_exactly() {
        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);

        // Substrings and different casing do not count.
        let children = names(&["my.git.backup", "cargo.toml"]);
        assert!(!scanner.is_project_or_app(Path::new("/home/user/stuff"), &children));
    }

    #[test]
    fn test_claimed_paths_covers_self_and_descendants() {
        let mut claimed = ClaimedPaths::default();
        claimed.insert(PathBuf::from("/input/proj"));

        assert!(claimed.covers(Path::new("/input/proj")));
        assert!(claimed.covers(Path::new("/input/proj/src/main.rs")));
        assert!(!claimed.covers(Path::new("/input/project-b")));
        assert!(!claimed.covers(Path::new("/input")));
    }

    #[test]
    fn test_discovery_claims_top_level_project() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir_all(input.join("proj/.git")).expect("Failed to create tree");
        fs::write(input.join("proj/main.py"), "print()").expect("Failed to write file");

        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);
        let mut claimed = ClaimedPaths::default();
        let moves = scanner.identify_projects(&input, &output, &mut claimed);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].source, input.join("proj"));
        assert_eq!(
            moves[0].destination,
            output.join(PROJECTS_DIR_NAME).join("proj")
        );
        assert!(claimed.covers(&input.join("proj")));
    }

    #[test]
    fn test_discovery_flattens_nested_project_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir_all(input.join("archive/old/proj/.git")).expect("Failed to create tree");

        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);
        let mut claimed = ClaimedPaths::default();
        let moves = scanner.identify_projects(&input, &output, &mut claimed);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].source, input.join("archive/old/proj"));
        assert_eq!(
            moves[0].destination,
            output.join(PROJECTS_DIR_NAME).join("proj")
        );
    }

    #[test]
    fn test_discovery_outer_project_wins() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        // Both outer and outer/vendor/inner carry markers; only the outer
        // boundary may be claimed.
        fs::create_dir_all(input.join("outer/.git")).expect("Failed to create tree");
        fs::create_dir_all(input.join("outer/vendor/inner/.git")).expect("Failed to create tree");

        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);
        let mut claimed = ClaimedPaths::default();
        let moves = scanner.identify_projects(&input, &output, &mut claimed);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].source, input.join("outer"));
    }

    #[test]
    fn test_discovery_never_claims_ancestor_and_descendant() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir_all(input.join("a/proj1/.git")).expect("Failed to create tree");
        fs::create_dir_all(input.join("a/proj1/sub/proj2/node_modules")).expect("Failed to create tree");
        fs::create_dir_all(input.join("b/proj3/.git")).expect("Failed to create tree");

        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);
        let mut claimed = ClaimedPaths::default();
        scanner.identify_projects(&input, &output, &mut claimed);

        let paths: Vec<_> = claimed.iter().collect();
        for first in &paths {
            for second in &paths {
                if first != second {
                    assert!(
                        !first.starts_with(second),
                        "{} is nested under {}",
                        first.display(),
                        second.display()
                    );
                }
            }
        }
    }

    #[test]
    fn test_discovery_claims_bundle_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir_all(input.join("TestApp.app/Contents")).expect("Failed to create tree");

        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);
        let mut claimed = ClaimedPaths::default();
        let moves = scanner.identify_projects(&input, &output, &mut claimed);

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].source, input.join("TestApp.app"));
    }

    #[test]
    fn test_discovery_ignores_plain_tree() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir_all(input.join("docs/old")).expect("Failed to create tree");
        fs::write(input.join("docs/notes.txt"), "notes").expect("Failed to write file");

        let config = SortConfig::default();
        let scanner = ProjectScanner::new(&config);
        let mut claimed = ClaimedPaths::default();
        let moves = scanner.identify_projects(&input, &output, &mut claimed);

        assert!(moves.is_empty());
        assert!(claimed.is_empty());
    }
}
