//! Filesystem operations on the generated site and temporary sources.

use crate::error::{SiteError, SiteResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copy the contents of `from` into `to`, overwriting existing files.
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> SiteResult<usize> {
    if !from.is_dir() {
        return Err(SiteError::OutputMissing(from.to_path_buf()));
    }

    let mut copied = 0usize;
    for entry in WalkDir::new(from).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| SiteError::Walk {
            path: from.to_path_buf(),
            message: e.to_string(),
        })?;
        let source = entry.path();
        let relative = match source.strip_prefix(from) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| SiteError::Copy {
                path: target.clone(),
                source: e,
            })?;
            continue;
        }

        // A directory left where a file should go would make fs::copy fail
        if target.is_dir() {
            fs::remove_dir_all(&target).map_err(|e| SiteError::Remove {
                path: target.clone(),
                source: e,
            })?;
        }
        fs::copy(source, &target).map_err(|e| SiteError::Copy {
            path: source.to_path_buf(),
            source: e,
        })?;
        copied += 1;
    }

    tracing::debug!("Copied {} files from {:?} to {:?}", copied, from, to);
    Ok(copied)
}

/// Remove files or directories below `root`, ignoring ones that do not exist
pub fn remove_paths(root: &Path, paths: &[PathBuf]) -> SiteResult<()> {
    for relative in paths {
        let path = root.join(relative);
        let result = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => Err(e),
        };
        result.map_err(|e| SiteError::Remove {
            path: path.clone(),
            source: e,
        })?;
    }
    Ok(())
}

/// Delete the git index so the whole tree becomes untracked
pub fn remove_index(git_dir: &Path) -> SiteResult<()> {
    let index = git_dir.join("index");
    fs::remove_file(&index).map_err(|e| SiteError::Remove {
        path: index,
        source: e,
    })
}
