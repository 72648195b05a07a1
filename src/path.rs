// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine the project root that all changelog scopes and release files are
//! resolved against.

use git2::Repository;
use std::path::{Path, PathBuf};

/// Determine project root from a path somewhere inside it.
///
/// Walks up from `start` to the nearest work tree. Nested submodules are
/// escaped, i.e., starting inside "plugins/python/plugins" still yields the
/// outermost project that records them.
///
/// # Errors
///
/// - Return [`NoProjectRoot`] if `start` is not inside a work tree.
pub fn project_root(start: impl AsRef<Path>) -> Result<PathBuf> {
    let mut root = work_tree_of(start.as_ref())?;

    // INVARIANT: Keep climbing while the work tree is itself a submodule.
    while let Some(parent) = root.parent() {
        match work_tree_of(parent) {
            Ok(outer) if records_submodule(&outer, &root) => root = outer,
            _ => break,
        }
    }

    Ok(root)
}

fn work_tree_of(path: &Path) -> Result<PathBuf> {
    Repository::discover(path)
        .ok()
        .and_then(|repository| repository.workdir().map(Path::to_path_buf))
        .ok_or_else(|| NoProjectRoot {
            path: path.to_path_buf(),
        })
}

fn records_submodule(outer: &Path, inner: &Path) -> bool {
    let Ok(relative) = inner.strip_prefix(outer) else {
        return false;
    };

    let Ok(repository) = Repository::open(outer) else {
        return false;
    };

    repository
        .submodules()
        .map(|submodules| submodules.iter().any(|submodule| submodule.path() == relative))
        .unwrap_or(false)
}

/// No work tree contains a given path.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{:?} is not inside a git work tree", path.display())]
pub struct NoProjectRoot {
    path: PathBuf,
}

/// Friendly result alias :3
pub type Result<T, E = NoProjectRoot> = std::result::Result<T, E>;
