// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control queries.
//!
//! The changelog aggregator only ever reads history. It needs to know the
//! latest release tag, what a submodule pointer looked like at some commit,
//! and which commit messages sit between a lower bound and the current branch
//! tip. These queries are modeled through the [`VersionControl`] trait so the
//! aggregation rules can be exercised without real repositories.
//!
//! Every query receives the path of the repository it targets. Nothing here
//! depends on the working directory of the current process.

use git2::{
    DescribeFormatOptions, DescribeOptions, ErrorClass, ErrorCode, ObjectType, Repository, Sort,
};
use std::path::Path;
use tracing::{debug, instrument};

/// Read-only history queries against a repository at a given path.
///
/// Answers of the "there is no such thing" kind are reported as `Ok(None)`.
/// Any other failure is a [`VcsError`].
pub trait VersionControl {
    /// Most recent tag reachable from the current branch tip.
    fn latest_tag(&self, repo: &Path) -> Result<Option<String>>;

    /// Commit id of submodule pointer at `path` in the tree of `reference`.
    ///
    /// Entries that are not submodule pointers count as absent.
    fn tree_entry(&self, repo: &Path, reference: &str, path: &Path) -> Result<Option<String>>;

    /// Full message bodies of commits in `since..HEAD`, newest first.
    fn log(&self, repo: &Path, since: &str) -> Result<Vec<String>>;

    /// Short name of the currently checked out branch.
    fn current_branch(&self, repo: &Path) -> Result<String>;
}

impl<T> VersionControl for &T
where
    T: VersionControl + ?Sized,
{
    fn latest_tag(&self, repo: &Path) -> Result<Option<String>> {
        (**self).latest_tag(repo)
    }

    fn tree_entry(&self, repo: &Path, reference: &str, path: &Path) -> Result<Option<String>> {
        (**self).tree_entry(repo, reference, path)
    }

    fn log(&self, repo: &Path, since: &str) -> Result<Vec<String>> {
        (**self).log(repo, since)
    }

    fn current_branch(&self, repo: &Path) -> Result<String> {
        (**self).current_branch(repo)
    }
}

/// Version control queries through libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Vcs;

impl Git2Vcs {
    /// Construct new libgit2 query handler.
    pub fn new() -> Self {
        Self
    }

    fn open(repo: &Path) -> Result<Repository> {
        Repository::open(repo).map_err(|err| VcsError::Open {
            source: err,
            path: repo.display().to_string(),
        })
    }
}

impl VersionControl for Git2Vcs {
    /// Behaves like `git describe --tags --abbrev=0`.
    #[instrument(skip(self), level = "debug")]
    fn latest_tag(&self, repo: &Path) -> Result<Option<String>> {
        let repository = Self::open(repo)?;
        let mut opts = DescribeOptions::new();
        opts.describe_tags();

        let describe = match repository.describe(&opts) {
            Ok(describe) => describe,
            // INVARIANT: libgit2 reports "nothing to describe" as a generic describe error.
            Err(err)
                if err.code() == ErrorCode::NotFound || err.class() == ErrorClass::Describe =>
            {
                debug!("no tag describes HEAD of {}", repo.display());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        Ok(Some(describe.format(Some(&format))?))
    }

    #[instrument(skip(self), level = "debug")]
    fn tree_entry(&self, repo: &Path, reference: &str, path: &Path) -> Result<Option<String>> {
        let repository = Self::open(repo)?;
        let tree = repository.revparse_single(reference)?.peel_to_tree()?;

        match tree.get_path(path) {
            Ok(entry) if entry.kind() == Some(ObjectType::Commit) => {
                Ok(Some(entry.id().to_string()))
            }
            Ok(entry) => {
                debug!("{:?} is a {:?}, not a submodule pointer", path.display(), entry.kind());
                Ok(None)
            }
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self), level = "debug")]
    fn log(&self, repo: &Path, since: &str) -> Result<Vec<String>> {
        let repository = Self::open(repo)?;
        let lower = repository.revparse_single(since)?.peel_to_commit()?;

        let mut revwalk = repository.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;
        revwalk.hide(lower.id())?;

        let mut messages = Vec::new();
        for oid in revwalk {
            let commit = repository.find_commit(oid?)?;
            messages.push(String::from_utf8_lossy(commit.message_bytes()).into_owned());
        }
        debug!("{} commits in {since}..HEAD", messages.len());

        Ok(messages)
    }

    fn current_branch(&self, repo: &Path) -> Result<String> {
        let repository = Self::open(repo)?;
        let head = repository.head()?;

        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }
}

/// Version control query error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Repository cannot be opened.
    #[error("failed to open repository at {path:?}")]
    Open {
        #[source]
        source: git2::Error,
        path: String,
    },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
