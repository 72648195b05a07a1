// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Hierarchical changelog aggregation.
//!
//! A project can be spread across several independently versioned
//! repositories. Albert keeps its native plugins in a submodule at "plugins",
//! and that submodule in turn keeps the python plugins in its own submodule at
//! "python/plugins". Each of these repositories is a __scope__, and each scope
//! contributes one section to the changelog.
//!
//! # Commit Ranges
//!
//! The changelog covers everything since the last release, but only the outer
//! project is tagged. Submodule pointers advance independently of the outer
//! commit graph, so the lower bound of a nested scope is the pointer its
//! parent recorded at the parent's own lower bound:
//!
//! 1. Outer project: latest tag reachable from HEAD.
//! 2. Native plugins: pointer at "plugins" in the outer tree at that tag.
//! 3. Python plugins: pointer at "python/plugins" in the native plugins tree
//!    at the commit found in step 2.
//!
//! The upper bound is always the current branch tip of each scope.
//!
//! # Failure Policy
//!
//! A scope whose lower bound cannot be determined fails the whole run. A
//! missing tag or pointer is never treated as "no history", because that
//! would silently drop changes from the changelog. A scope with zero commits
//! in its range is fine, and simply has no section.
//!
//! # See Also
//!
//! 1. [`format`] for the exact text layout.
//! 2. [`ProjectConfig`](crate::config::ProjectConfig) for the scope layout.

pub mod format;
pub mod vcs;

use crate::{
    changelog::{
        format::{assemble, format_log, Section},
        vcs::{Git2Vcs, VersionControl},
    },
    config::{ChangelogSettings, ProjectConfig},
};

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Independently versioned repository contributing a changelog section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Heading of the scope's changelog section.
    pub heading: String,

    /// Root of the scope's work tree.
    pub root: PathBuf,

    /// Parent scope recording this scope as a submodule.
    pub parent: Option<ScopeParent>,
}

/// Link from a nested scope to the scope that records its pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeParent {
    /// Position of parent in scope list.
    pub index: usize,

    /// Path of submodule pointer inside parent's tree.
    pub pointer: PathBuf,
}

impl Scope {
    /// Construct new top-level scope.
    pub fn outer(heading: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            heading: heading.into(),
            root: root.into(),
            parent: None,
        }
    }

    /// Construct new scope nested in the scope at `parent`.
    pub fn nested(
        heading: impl Into<String>,
        root: impl Into<PathBuf>,
        parent: usize,
        pointer: impl Into<PathBuf>,
    ) -> Self {
        Self {
            heading: heading.into(),
            root: root.into(),
            parent: Some(ScopeParent {
                index: parent,
                pointer: pointer.into(),
            }),
        }
    }
}

/// Build chain of scopes from changelog settings.
///
/// The first scope is the project root. Every following scope is nested in
/// the scope right before it, recorded as a submodule at its path relative to
/// that scope.
///
/// # Errors
///
/// - Return [`ChangelogError::NoScopes`] if no scopes are configured.
/// - Return [`ChangelogError::OuterScopePath`] if the first scope has a path.
/// - Return [`ChangelogError::ScopeNotNested`] if a scope does not live inside
///   the scope before it.
pub fn scope_chain(root: impl AsRef<Path>, settings: &ChangelogSettings) -> Result<Vec<Scope>> {
    let root = root.as_ref();
    let mut settings = settings.scopes.iter();
    let outer = settings.next().ok_or(ChangelogError::NoScopes)?;
    if let Some(path) = &outer.path {
        return Err(ChangelogError::OuterScopePath { path: path.clone() });
    }

    let mut scopes = vec![Scope::outer(&outer.heading, root)];
    let mut parent_path = PathBuf::new();
    for setting in settings {
        let path = setting.path.clone().unwrap_or_default();
        let pointer = match path.strip_prefix(&parent_path) {
            Ok(pointer) if !pointer.as_os_str().is_empty() => pointer.to_path_buf(),
            _ => {
                return Err(ChangelogError::ScopeNotNested {
                    path,
                    parent: parent_path,
                })
            }
        };

        scopes.push(Scope::nested(
            &setting.heading,
            root.join(&path),
            scopes.len() - 1,
            pointer,
        ));
        parent_path = path;
    }

    Ok(scopes)
}

/// Changelog aggregator over a fixed set of scopes.
#[derive(Debug)]
pub struct Changelog<V = Git2Vcs>
where
    V: VersionControl,
{
    scopes: Vec<Scope>,
    vcs: V,
}

impl<V> Changelog<V>
where
    V: VersionControl,
{
    /// Construct new changelog aggregator.
    ///
    /// # Errors
    ///
    /// - Return [`ChangelogError::NoScopes`] if scope list is empty.
    /// - Return [`ChangelogError::ScopeOrder`] if a scope refers to a parent
    ///   that does not come before it.
    pub fn new(scopes: Vec<Scope>, vcs: V) -> Result<Self> {
        if scopes.is_empty() {
            return Err(ChangelogError::NoScopes);
        }

        // INVARIANT: Parents are resolved before their children.
        for (index, scope) in scopes.iter().enumerate() {
            if let Some(parent) = &scope.parent {
                if parent.index >= index {
                    return Err(ChangelogError::ScopeOrder {
                        heading: scope.heading.clone(),
                    });
                }
            }
        }

        Ok(Self { scopes, vcs })
    }

    /// Scopes in section order.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Generate changelog document.
    ///
    /// Resolves the commit range of every scope, extracts and formats its
    /// commit messages, and assembles the non-empty sections in scope order.
    ///
    /// # Errors
    ///
    /// - Return [`ChangelogError::MissingTag`] if the outer project has no
    ///   reachable tag.
    /// - Return [`ChangelogError::MissingPointer`] if a parent tree has no
    ///   entry for a nested scope at the parent's lower bound.
    /// - Return [`ChangelogError::Vcs`] if any history query fails.
    #[instrument(skip(self), level = "debug")]
    pub fn generate(&self) -> Result<String> {
        let mut bounds: Vec<String> = Vec::with_capacity(self.scopes.len());
        let mut sections = Vec::with_capacity(self.scopes.len());

        for scope in &self.scopes {
            let lower = self.resolve_lower_bound(scope, &bounds)?;
            let entries = self.vcs.log(&scope.root, &lower)?;
            info!("{}: {} commits since {lower}", scope.heading, entries.len());

            sections.push(Section::new(&scope.heading, format_log(&entries)));
            bounds.push(lower);
        }

        Ok(assemble(&sections))
    }

    fn resolve_lower_bound(&self, scope: &Scope, bounds: &[String]) -> Result<String> {
        let Some(parent) = &scope.parent else {
            return self
                .vcs
                .latest_tag(&scope.root)?
                .ok_or_else(|| ChangelogError::MissingTag {
                    repo: scope.root.clone(),
                });
        };

        let parent_scope = &self.scopes[parent.index];
        let parent_bound = &bounds[parent.index];
        let pointer = self
            .vcs
            .tree_entry(&parent_scope.root, parent_bound, &parent.pointer)?
            .ok_or_else(|| ChangelogError::MissingPointer {
                repo: parent_scope.root.clone(),
                reference: parent_bound.clone(),
                path: parent.pointer.clone(),
            })?;
        debug!(
            "{}: pointer {:?} at {parent_bound} is {pointer}",
            scope.heading, parent.pointer
        );

        Ok(pointer)
    }
}

/// Generate changelog for project at `root`.
///
/// Reads the scope layout from the project configuration, and queries history
/// through libgit2. Performs no writes.
///
/// # Errors
///
/// - Return [`ChangelogError::Config`] if project configuration is invalid.
/// - Return any error of [`Changelog::generate`].
pub fn generate_changelog(root: impl AsRef<Path>) -> Result<String> {
    let config = ProjectConfig::load(root.as_ref())?;
    let scopes = scope_chain(root.as_ref(), &config.changelog)?;

    Changelog::new(scopes, Git2Vcs::new())?.generate()
}

/// Changelog aggregation error types.
#[derive(Debug, thiserror::Error)]
pub enum ChangelogError {
    /// No tag to start the outer project's range from.
    #[error("no release tag reachable from HEAD in {:?}", repo.display())]
    MissingTag { repo: PathBuf },

    /// Parent tree records no submodule pointer for nested scope.
    #[error(
        "no entry for {:?} in tree of {reference} in {:?}",
        path.display(),
        repo.display()
    )]
    MissingPointer {
        repo: PathBuf,
        reference: String,
        path: PathBuf,
    },

    /// No scopes to aggregate.
    #[error("changelog needs at least one scope")]
    NoScopes,

    /// Outer scope must be the project root.
    #[error("first changelog scope must be project root, got {:?}", path.display())]
    OuterScopePath { path: PathBuf },

    /// Scope does not live inside the scope listed before it.
    #[error("scope {:?} is not nested in {:?}", path.display(), parent.display())]
    ScopeNotNested { path: PathBuf, parent: PathBuf },

    /// Scope refers to a parent that is not resolved before it.
    #[error("parent of scope {heading:?} must come before it")]
    ScopeOrder { heading: String },

    /// History query fails.
    #[error(transparent)]
    Vcs(#[from] crate::changelog::vcs::VcsError),

    /// Project configuration cannot be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Friendly result alias :3
pub type Result<T, E = ChangelogError> = std::result::Result<T, E>;
