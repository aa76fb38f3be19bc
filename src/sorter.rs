//! The two-phase sorting engine.
//!
//! A run proceeds through fixed, strictly sequential phases: validate the
//! paths, discover and relocate project directories as units, relocate the
//! remaining loose files into category folders, then optionally reclaim
//! directories the moves left empty. Only structural path problems abort a
//! run; every per-item failure is logged, counted, and stepped over.

use crate::category::CategoryMap;
use crate::config::SortConfig;
use crate::progress::SortingProgress;
use crate::project::{ClaimedPaths, ProjectMove, ProjectScanner, is_real_dir};
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Upper bound on the collision-suffix search before giving up.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Structural errors that abort a run before any phase starts.
#[derive(Debug)]
pub enum SortError {
    /// The input path does not exist.
    InputNotFound(PathBuf),
    /// The input path exists but is not a directory.
    InputNotADirectory(PathBuf),
    /// The input directory cannot be resolved or listed.
    InputNotReadable { path: PathBuf, source: io::Error },
    /// Input and output resolve to the same directory.
    OutputEqualsInput(PathBuf),
    /// The output directory lies inside the input tree, which would make the
    /// relocation pass feed on its own output.
    OutputInsideInput { output: PathBuf, input: PathBuf },
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputNotFound(path) => {
                write!(f, "Input directory '{}' does not exist", path.display())
            }
            Self::InputNotADirectory(path) => {
                write!(f, "Input path '{}' is not a directory", path.display())
            }
            Self::InputNotReadable { path, source } => {
                write!(f, "Cannot read input directory '{}': {}", path.display(), source)
            }
            Self::OutputEqualsInput(path) => {
                write!(
                    f,
                    "Input and output directories cannot be the same ('{}')",
                    path.display()
                )
            }
            Self::OutputInsideInput { output, input } => {
                write!(
                    f,
                    "Output directory '{}' cannot be inside input directory '{}'",
                    output.display(),
                    input.display()
                )
            }
        }
    }
}

impl std::error::Error for SortError {}

/// Result type for structural sorting failures.
pub type SortResult<T> = Result<T, SortError>;

/// Parameters for one sorting run.
#[derive(Debug, Clone)]
pub struct SortRequest {
    pub input_dir: PathBuf,
    /// Defaults to `<input>_Sorted` beside the input when `None`.
    pub output_dir: Option<PathBuf>,
    /// Log and count every decision without touching the filesystem.
    pub dry_run: bool,
    /// Remove directories left empty after the moves.
    pub delete_empty_dirs: bool,
    /// Draw a terminal progress bar while sorting.
    pub show_progress: bool,
}

impl SortRequest {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            dry_run: false,
            delete_empty_dirs: false,
            show_progress: false,
        }
    }
}

/// Final accounting for one run.
#[derive(Debug, Clone)]
pub struct SortReport {
    /// Files plus directories found under the input root before the run.
    pub total_items: usize,
    pub projects_moved: usize,
    pub files_moved: usize,
    pub errors: usize,
    pub directories_removed: usize,
    /// Files routed per category path; dry-run decisions are included.
    pub category_counts: HashMap<String, usize>,
    pub elapsed: Duration,
}

impl SortReport {
    /// True iff the run recorded no errors at all.
    pub fn success(&self) -> bool {
        self.errors == 0
    }
}

/// Resolves and validates the run's paths.
///
/// The input must exist, be a directory, and be listable. The output, when
/// given, must differ from the input and must not be nested inside it; when
/// omitted it defaults to `<input>_Sorted` beside the input.
pub fn validate_paths(input_dir: &Path, output_dir: Option<&Path>) -> SortResult<(PathBuf, PathBuf)> {
    if !input_dir.exists() {
        return Err(SortError::InputNotFound(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(SortError::InputNotADirectory(input_dir.to_path_buf()));
    }
    let input = input_dir
        .canonicalize()
        .map_err(|e| SortError::InputNotReadable {
            path: input_dir.to_path_buf(),
            source: e,
        })?;
    fs::read_dir(&input).map_err(|e| SortError::InputNotReadable {
        path: input.clone(),
        source: e,
    })?;

    let output = match output_dir {
        Some(path) => absolute_path(path),
        None => {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            input
                .parent()
                .unwrap_or_else(|| Path::new("/"))
                .join(format!("{name}_Sorted"))
        }
    };

    if output == input {
        return Err(SortError::OutputEqualsInput(input));
    }
    if output.starts_with(&input) {
        return Err(SortError::OutputInsideInput { output, input });
    }

    Ok((input, output))
}

/// Resolves a path that may not exist yet into an absolute normal form so
/// the containment checks in [`validate_paths`] are meaningful.
fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Returns `desired` untouched when unoccupied, otherwise the first
/// `{stem} ({n}){extension}` sibling that is free.
///
/// Gives up after [`MAX_NAME_ATTEMPTS`] and returns the original colliding
/// path, logging the failure, so a pathological destination cannot hang the
/// run. Not safe against a concurrent writer racing the check; a run assumes
/// it is the sole writer.
pub fn unique_destination(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = desired
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = desired.parent().unwrap_or_else(|| Path::new(""));

    for counter in 1..=MAX_NAME_ATTEMPTS {
        let candidate = parent.join(format!("{stem} ({counter}){extension}"));
        if !candidate.exists() {
            return candidate;
        }
    }

    error!("Too many filename collisions for '{}'", desired.display());
    desired.to_path_buf()
}

/// Runs the two-phase sort for one configuration.
pub struct TreeSorter<'a> {
    config: &'a SortConfig,
    categories: CategoryMap,
}

impl<'a> TreeSorter<'a> {
    pub fn new(config: &'a SortConfig) -> Self {
        Self {
            config,
            categories: CategoryMap::from_config(config),
        }
    }

    /// Executes a full run: validate, discover and relocate projects,
    /// relocate loose files, reclaim empty directories, report.
    ///
    /// # Errors
    ///
    /// Only structural path problems produce an `Err`; per-item failures are
    /// logged, reflected in the report's error count, and never abort a
    /// phase.
    pub fn sort(&self, request: &SortRequest) -> SortResult<SortReport> {
        let (input_dir, output_dir) =
            validate_paths(&request.input_dir, request.output_dir.as_deref())?;

        info!(
            "Sorting '{}' into '{}'",
            input_dir.display(),
            output_dir.display()
        );
        if request.dry_run {
            info!("Dry-run mode: no files will be moved");
        }
        if request.delete_empty_dirs {
            info!("Empty source directories will be removed after sorting");
        }

        let total_items = count_items(&input_dir);
        let mut progress = if request.show_progress {
            SortingProgress::with_bar(total_items)
        } else {
            SortingProgress::new(total_items)
        };
        if total_items > 0 {
            info!("Processing {} items", total_items);
        }

        info!("Phase 1: identifying project directories");
        let scanner = ProjectScanner::new(self.config);
        let mut claimed = ClaimedPaths::default();
        let project_moves = scanner.identify_projects(&input_dir, &output_dir, &mut claimed);

        info!("Phase 1: relocating {} project(s)", project_moves.len());
        for project_move in &project_moves {
            match move_project(project_move, request.dry_run) {
                Ok(()) => progress.record_project(true),
                Err(e) => {
                    error!(
                        "Failed to move project '{}': {}",
                        project_move.source.display(),
                        e
                    );
                    progress.record_project(false);
                }
            }
        }

        info!("Phase 2: relocating loose files");
        let mut cleanup_candidates: HashSet<PathBuf> = HashSet::new();
        let category_counts = self.relocate_files(
            &input_dir,
            &output_dir,
            &claimed,
            &mut progress,
            request.delete_empty_dirs.then_some(&mut cleanup_candidates),
            request.dry_run,
        );

        let directories_removed = if request.delete_empty_dirs {
            info!("Phase 3: reclaiming empty directories");
            reclaim_empty_dirs(&input_dir, cleanup_candidates, request.dry_run, &mut progress)
        } else {
            0
        };

        progress.finish();
        let elapsed = progress.elapsed();
        info!(
            "Sorting completed in {:.1}s. Projects moved: {}, Files moved: {}, Errors: {}",
            elapsed.as_secs_f64(),
            progress.projects_moved,
            progress.files_moved,
            progress.errors
        );

        Ok(SortReport {
            total_items,
            projects_moved: progress.projects_moved,
            files_moved: progress.files_moved,
            errors: progress.errors,
            directories_removed,
            category_counts,
            elapsed,
        })
    }

    /// Phase 2: walks the tree top-down, skipping claimed subtrees, and
    /// routes every remaining file into its category directory under the
    /// output root. Visited directories are collected as reclamation
    /// candidates when requested.
    fn relocate_files(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        claimed: &ClaimedPaths,
        progress: &mut SortingProgress,
        mut cleanup_candidates: Option<&mut HashSet<PathBuf>>,
        dry_run: bool,
    ) -> HashMap<String, usize> {
        let mut category_counts = HashMap::new();

        // The whole input may have been claimed (and moved) in phase 1.
        if claimed.covers(input_dir) {
            return category_counts;
        }

        let mut pending = vec![input_dir.to_path_buf()];
        while let Some(dir) = pending.pop() {
            if claimed.covers(&dir) {
                continue;
            }
            if let Some(candidates) = cleanup_candidates.as_deref_mut() {
                candidates.insert(dir.clone());
            }

            // Take the full listing up front; entries are renamed out of the
            // directory while it is being processed.
            let entries: Vec<PathBuf> = match fs::read_dir(&dir) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .collect(),
                Err(e) => {
                    warn!("Cannot read directory '{}': {}", dir.display(), e);
                    continue;
                }
            };

            for path in entries {
                if is_real_dir(&path) {
                    pending.push(path);
                    continue;
                }
                if claimed.covers(&path) {
                    continue;
                }
                match self.categorize_and_move(&path, output_dir, dry_run) {
                    Ok(category) => {
                        *category_counts.entry(category).or_insert(0) += 1;
                        progress.record_file(true);
                    }
                    Err(e) => {
                        error!("Failed to move file '{}': {}", path.display(), e);
                        progress.record_file(false);
                    }
                }
            }
        }

        category_counts
    }

    /// Routes one file: resolve its category, pick a collision-free
    /// destination, and move it (or only log the decision under dry-run).
    /// Returns the category path used.
    fn categorize_and_move(
        &self,
        file_path: &Path,
        output_dir: &Path,
        dry_run: bool,
    ) -> io::Result<String> {
        let file_name = file_path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "file has no name component")
        })?;

        let category = self
            .categories
            .resolve(&file_name.to_string_lossy())
            .to_string();
        let target_dir = output_dir.join(&category);
        let destination = unique_destination(&target_dir.join(file_name));

        debug!("'{}' -> '{}'", file_path.display(), destination.display());
        if dry_run {
            return Ok(category);
        }

        fs::create_dir_all(&target_dir)?;
        move_entry(file_path, &destination)?;
        Ok(category)
    }
}

/// Moves a claimed project directory to its destination as a unit.
fn move_project(project_move: &ProjectMove, dry_run: bool) -> io::Result<()> {
    info!(
        "[project] '{}' -> '{}'",
        project_move.source.display(),
        project_move.destination.display()
    );
    if dry_run {
        return Ok(());
    }
    if let Some(parent) = project_move.destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&project_move.source, &project_move.destination)
}

/// Moves one file-like entry, falling back to copy-then-remove when the
/// rename crosses a device boundary.
fn move_entry(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

/// Counts files and directories under the root (root excluded) so progress
/// can be reported as a percentage. Subtrees that cannot be listed are
/// omitted; the count is advisory only.
fn count_items(input_dir: &Path) -> usize {
    let mut total = 0;
    let mut pending = vec![input_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            total += 1;
            let path = entry.path();
            if is_real_dir(&path) {
                pending.push(path);
            }
        }
    }
    total
}

/// Phase 3: removes empty candidate directories, deepest first, so a
/// child's removal can make its parent eligible within the same pass. The
/// input root is never removed. Candidates that vanished or still hold
/// content are skipped silently; a failed removal of a genuinely empty
/// directory is logged and counted.
fn reclaim_empty_dirs(
    input_dir: &Path,
    candidates: HashSet<PathBuf>,
    dry_run: bool,
    progress: &mut SortingProgress,
) -> usize {
    if dry_run {
        return 0;
    }
    info!("Cleaning up empty directories");

    let mut by_depth: Vec<PathBuf> = candidates.into_iter().collect();
    by_depth.sort_by_key(|path| std::cmp::Reverse(path.components().count()));

    let mut removed = 0;
    for dir in by_depth {
        if dir == *input_dir {
            continue;
        }
        let is_empty = match fs::read_dir(&dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => continue,
        };
        if !is_empty {
            continue;
        }
        match fs::remove_dir(&dir) {
            Ok(()) => {
                debug!("Deleted empty directory '{}'", dir.display());
                removed += 1;
            }
            Err(e) => {
                warn!("Could not delete directory '{}': {}", dir.display(), e);
                progress.record_error();
            }
        }
    }

    if removed > 0 {
        info!("Deleted {} empty directories", removed);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_destination_free_path_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let desired = temp_dir.path().join("test.txt");
        assert_eq!(unique_destination(&desired), desired);
    }

    #[test]
    fn test_unique_destination_appends_counter() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let desired = temp_dir.path().join("test.txt");
        fs::write(&desired, "taken").expect("Failed to write file");

        assert_eq!(
            unique_destination(&desired),
            temp_dir.path().join("test (1).txt")
        );
    }

    #[test]
    fn test_unique_destination_skips_taken_counters() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let desired = temp_dir.path().join("test.txt");
        fs::write(&desired, "taken").expect("Failed to write file");
        fs::write(temp_dir.path().join("test (1).txt"), "also taken")
            .expect("Failed to write file");

        assert_eq!(
            unique_destination(&desired),
            temp_dir.path().join("test (2).txt")
        );
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let desired = temp_dir.path().join("README");
        fs::write(&desired, "taken").expect("Failed to write file");

        assert_eq!(
            unique_destination(&desired),
            temp_dir.path().join("README (1)")
        );
    }

    #[test]
    fn test_validate_paths_missing_input() {
        let result = validate_paths(Path::new("/non/existent/input"), None);
        assert!(matches!(result, Err(SortError::InputNotFound(_))));
    }

    #[test]
    fn test_validate_paths_input_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("not_a_dir.txt");
        fs::write(&file, "x").expect("Failed to write file");

        let result = validate_paths(&file, None);
        assert!(matches!(result, Err(SortError::InputNotADirectory(_))));
    }

    #[test]
    fn test_validate_paths_same_input_and_output() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = validate_paths(temp_dir.path(), Some(temp_dir.path()));
        assert!(matches!(result, Err(SortError::OutputEqualsInput(_))));
    }

    #[test]
    fn test_validate_paths_output_nested_in_input() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("sorted");
        let result = validate_paths(temp_dir.path(), Some(&nested));
        assert!(matches!(result, Err(SortError::OutputInsideInput { .. })));
    }

    #[test]
    fn test_validate_paths_nested_output_through_parent_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        fs::create_dir(&input).expect("Failed to create input");
        // Lexically escapes and re-enters the input; still nested.
        let sneaky = input.join("..").join("input").join("sorted");
        let result = validate_paths(&input, Some(&sneaky));
        assert!(matches!(result, Err(SortError::OutputInsideInput { .. })));
    }

    #[test]
    fn test_validate_paths_default_output_beside_input() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("messy");
        fs::create_dir(&input).expect("Failed to create input");

        let (resolved_input, output) = validate_paths(&input, None).expect("Validation failed");
        assert_eq!(output, resolved_input.parent().unwrap().join("messy_Sorted"));
    }

    #[test]
    fn test_reclaim_removes_nested_empty_dirs_deepest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let deep = input.join("a/b/c");
        fs::create_dir_all(&deep).expect("Failed to create tree");

        let candidates: HashSet<PathBuf> = [
            input.clone(),
            input.join("a"),
            input.join("a/b"),
            deep.clone(),
        ]
        .into_iter()
        .collect();

        let mut progress = SortingProgress::new(0);
        let removed = reclaim_empty_dirs(&input, candidates, false, &mut progress);

        assert_eq!(removed, 3);
        assert!(input.exists(), "input root must survive reclamation");
        assert!(!input.join("a").exists());
        assert_eq!(progress.errors, 0);
    }

    #[test]
    fn test_reclaim_keeps_non_empty_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let keeper = input.join("keeper");
        fs::create_dir_all(&keeper).expect("Failed to create tree");
        fs::write(keeper.join("leftover.txt"), "still here").expect("Failed to write file");

        let candidates: HashSet<PathBuf> = [keeper.clone()].into_iter().collect();
        let mut progress = SortingProgress::new(0);
        let removed = reclaim_empty_dirs(&input, candidates, false, &mut progress);

        assert_eq!(removed, 0);
        assert!(keeper.exists());
        assert_eq!(progress.errors, 0);
    }

    #[test]
    fn test_reclaim_is_noop_under_dry_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let empty = input.join("empty");
        fs::create_dir_all(&empty).expect("Failed to create tree");

        let candidates: HashSet<PathBuf> = [empty.clone()].into_iter().collect();
        let mut progress = SortingProgress::new(0);
        let removed = reclaim_empty_dirs(&input, candidates, true, &mut progress);

        assert_eq!(removed, 0);
        assert!(empty.exists());
    }

    #[test]
    fn test_reclaim_skips_vanished_candidate() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        fs::create_dir_all(&input).expect("Failed to create tree");

        let candidates: HashSet<PathBuf> = [input.join("never_existed")].into_iter().collect();
        let mut progress = SortingProgress::new(0);
        let removed = reclaim_empty_dirs(&input, candidates, false, &mut progress);

        assert_eq!(removed, 0);
        assert_eq!(progress.errors, 0);
    }
}
