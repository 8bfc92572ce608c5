//! Watch target computation.
//!
//! Decides which locations are registered with the notifier: the files
//! themselves in direct mode, or their parent directories otherwise.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::WatchError;

/// How watched paths map to notifier registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// Watch each path itself. The file must only be modified in place,
    /// never replaced, for as long as the watch runs.
    Direct,
    /// Watch each path's parent directory. Survives delete+recreate and
    /// rename-over replacement of the file.
    #[default]
    Indirect,
}

/// Compute the ordered set of locations to register.
///
/// In indirect mode the parent directories are deduplicated (first-seen
/// order) and a directory is dropped when another computed parent is its
/// ancestor. Only the computed parents are compared against each other.
pub fn resolve_targets(paths: &[PathBuf], mode: WatchMode) -> Result<IndexSet<PathBuf>, WatchError> {
    if paths.is_empty() {
        return Err(WatchError::invalid_config("no paths to watch"));
    }

    let targets = match mode {
        WatchMode::Direct => paths.iter().cloned().collect(),
        WatchMode::Indirect => {
            let parents: IndexSet<PathBuf> = paths.iter().map(|p| parent_dir(p)).collect();
            collapse_nested(parents)
        }
    };

    Ok(targets)
}

/// Parent directory of a watched path.
///
/// A bare file name maps to `.`, the filesystem root maps to itself.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => path.to_path_buf(),
    }
}

fn collapse_nested(dirs: IndexSet<PathBuf>) -> IndexSet<PathBuf> {
    dirs.iter()
        .filter(|dir| {
            !dirs
                .iter()
                .any(|other| other != *dir && dir.starts_with(other))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    fn targets(items: &[&str], mode: WatchMode) -> Vec<PathBuf> {
        resolve_targets(&paths(items), mode)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_empty_paths_rejected() {
        let err = resolve_targets(&[], WatchMode::Indirect).unwrap_err();
        assert!(matches!(err, WatchError::InvalidConfig { .. }));

        let err = resolve_targets(&[], WatchMode::Direct).unwrap_err();
        assert!(matches!(err, WatchError::InvalidConfig { .. }));
    }

    #[test]
    fn test_direct_keeps_paths() {
        let result = targets(&["/etc/app/b.toml", "/etc/app/a.toml"], WatchMode::Direct);
        assert_eq!(result, paths(&["/etc/app/b.toml", "/etc/app/a.toml"]));
    }

    #[test]
    fn test_direct_dedupes() {
        let result = targets(&["/etc/app/a.toml", "/etc/app/a.toml"], WatchMode::Direct);
        assert_eq!(result, paths(&["/etc/app/a.toml"]));
    }

    #[test]
    fn test_indirect_dedupes_parents() {
        let result = targets(
            &["/project/src/main.rs", "/project/src/lib.rs", "/project/tests/test.rs"],
            WatchMode::Indirect,
        );
        assert_eq!(result, paths(&["/project/src", "/project/tests"]));
    }

    #[test]
    fn test_indirect_collapses_nested_parents() {
        let result = targets(
            &["/a/b/deep.txt", "/a/top.txt", "/c/other.txt"],
            WatchMode::Indirect,
        );
        assert_eq!(result, paths(&["/a", "/c"]));
    }

    #[test]
    fn test_indirect_sibling_prefix_not_collapsed() {
        // "/ab" shares a string prefix with "/a" but is not inside it
        let result = targets(&["/a/x.txt", "/ab/y.txt"], WatchMode::Indirect);
        assert_eq!(result, paths(&["/a", "/ab"]));
    }

    #[test]
    fn test_indirect_root_and_bare_names() {
        assert_eq!(targets(&["/config.json"], WatchMode::Indirect), paths(&["/"]));
        assert_eq!(targets(&["Cargo.toml"], WatchMode::Indirect), paths(&["."]));
    }

    #[test]
    fn test_no_target_nested_in_another() {
        let result = targets(
            &["/srv/a/b/c/1", "/srv/a/b/2", "/srv/a/3", "/srv/x/4", "/srv/a/b/c/5"],
            WatchMode::Indirect,
        );

        for target in &result {
            for other in &result {
                if target != other {
                    assert!(!target.starts_with(other), "{target:?} nested in {other:?}");
                }
            }
        }
        assert_eq!(result, paths(&["/srv/a", "/srv/x"]));
    }
}
