// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release workflow.
//!
//! A release happens in two steps, with a human in between:
//!
//! 1. __Prepare__: generate the changelog since the last tag, and write it
//!    into a fragment file named `changelog_v<version>` at the project root.
//!    The maintainer then edits the fragment into something meaningful to
//!    humans.
//! 2. __Publish__: prepend the edited fragment to the changelog file, bump the
//!    CMake project version, commit, tag, and push the release. Finally, post
//!    an announcement to the documentation site.
//!
//! Both steps refuse to run off the release branch, or for a version that is
//! not newer than the latest tag.

pub mod edit;
mod syscall;

pub use syscall::SyscallError;

use crate::{
    changelog::{
        scope_chain,
        vcs::{Git2Vcs, VersionControl},
        Changelog,
    },
    config::ProjectConfig,
    release::{
        edit::{announcement_file_name, announcement_post, bump_cmake_version, prepend_changelog},
        syscall::GitCall,
    },
};

use chrono::{DateTime, TimeZone};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{create_dir_all, read_to_string, remove_file, write},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{info, instrument, warn};

/// Semantic version number of a release.
///
/// Accepts `major.minor.patch` with an optional leading "v".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Construct new version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Name of release tag for this version.
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let invalid = || ReleaseError::InvalidVersion {
            version: data.to_string(),
        };
        let number = data.strip_prefix('v').unwrap_or(data);

        let mut parts = number.split('.').map(|part| {
            if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        });

        let version = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), Some(patch), None) => Version::new(major?, minor?, patch?),
            _ => return Err(invalid()),
        };

        Ok(version)
    }
}

impl Display for Version {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Release workflow of a project.
#[derive(Debug)]
pub struct Release<V = Git2Vcs>
where
    V: VersionControl,
{
    root: PathBuf,
    config: ProjectConfig,
    vcs: V,
}

impl Release<Git2Vcs> {
    /// Open release workflow for project at `root`.
    ///
    /// # Errors
    ///
    /// - Return [`ReleaseError::Config`] if project configuration is invalid.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = ProjectConfig::load(&root)?;

        Ok(Self::new(root, config, Git2Vcs::new()))
    }
}

impl<V> Release<V>
where
    V: VersionControl,
{
    /// Construct new release workflow.
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig, vcs: V) -> Self {
        Self {
            root: root.into(),
            config,
            vcs,
        }
    }

    /// Path of changelog fragment for a version.
    pub fn fragment_path(&self, version: &Version) -> PathBuf {
        self.root.join(format!("changelog_v{version}"))
    }

    /// Check that a release of `version` can be cut.
    ///
    /// # Errors
    ///
    /// - Return [`ReleaseError::WrongBranch`] if current branch is not the
    ///   release branch.
    /// - Return [`ReleaseError::NotNewer`] if latest tag is a version that is
    ///   not older than `version`.
    /// - Return [`ReleaseError::Vcs`] if history queries fail.
    pub fn check(&self, version: &Version) -> Result<()> {
        let branch = self.vcs.current_branch(&self.root)?;
        if branch != self.config.release.branch {
            return Err(ReleaseError::WrongBranch {
                expected: self.config.release.branch.clone(),
                found: branch,
            });
        }

        match self.vcs.latest_tag(&self.root)? {
            Some(tag) => match tag.parse::<Version>() {
                Ok(latest) if latest >= *version => {
                    return Err(ReleaseError::NotNewer {
                        version: *version,
                        latest: tag,
                    })
                }
                Ok(_) => {}
                Err(_) => warn!("latest tag {tag:?} is not a version, skipping version check"),
            },
            None => warn!("no previous release tag found"),
        }

        Ok(())
    }

    /// Write generated changelog into fragment file for manual editing.
    ///
    /// Returns path to the fragment file.
    ///
    /// # Errors
    ///
    /// - Return any error of [`Release::check`].
    /// - Return [`ReleaseError::Changelog`] if changelog generation fails.
    /// - Return [`ReleaseError::Write`] if fragment cannot be written.
    #[instrument(skip(self), level = "debug")]
    pub fn prepare(&self, version: &Version) -> Result<PathBuf> {
        self.check(version)?;

        let scopes = scope_chain(&self.root, &self.config.changelog)?;
        let changelog = Changelog::new(scopes, &self.vcs)?.generate()?;

        let path = self.fragment_path(version);
        write_file(&path, &changelog)?;
        info!("changelog fragment written to {}", path.display());

        Ok(path)
    }

    /// Publish release of `version` from its edited changelog fragment.
    ///
    /// # Errors
    ///
    /// - Return any error of [`Release::check`].
    /// - Return [`ReleaseError::MissingFragment`] if fragment was not prepared.
    /// - Return [`ReleaseError::MissingProjectVersion`] if CMake file does not
    ///   set a project version.
    /// - Return [`ReleaseError::Syscall`] if a Git call fails.
    #[instrument(skip(self, now), level = "debug")]
    pub fn publish<Tz>(&self, version: &Version, now: &DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.check(version)?;

        let fragment_path = self.fragment_path(version);
        if !fragment_path.exists() {
            return Err(ReleaseError::MissingFragment {
                path: fragment_path,
            });
        }
        let fragment = read_file(&fragment_path)?;
        let fragment = fragment.trim();
        let settings = &self.config.release;

        info!("append changelog of v{version}");
        let changelog_path = self.root.join(&settings.changelog_file);
        let existing = if changelog_path.exists() {
            read_file(&changelog_path)?
        } else {
            String::new()
        };
        let changelog = prepend_changelog(&existing, version, now.date_naive(), fragment);
        write_file(&changelog_path, &changelog)?;

        info!("update project version to {version}");
        let cmake_path = self.root.join(&settings.cmake_file);
        let cmake = bump_cmake_version(&read_file(&cmake_path)?, version).ok_or_else(|| {
            ReleaseError::MissingProjectVersion {
                path: cmake_path.clone(),
            }
        })?;
        write_file(&cmake_path, &cmake)?;

        info!("commit, tag, and push {}", version.tag());
        let git = GitCall::new(&self.root);
        git.run([
            "add".into(),
            settings.changelog_file.clone().into_os_string(),
            settings.cmake_file.clone().into_os_string(),
        ])?;
        git.run(["commit", "-m", version.tag().as_str()])?;
        git.run(["tag", version.tag().as_str()])?;
        git.run([
            "push",
            "--tags",
            "--atomic",
            settings.remote.as_str(),
            settings.branch.as_str(),
        ])?;

        remove_file(&fragment_path).map_err(|err| ReleaseError::Remove {
            source: err,
            path: fragment_path.clone(),
        })?;

        if settings.announce {
            self.announce(version, now, fragment)?;
        }

        Ok(())
    }

    /// Post release announcement to documentation site.
    ///
    /// Pulls the documentation site checkout, or clones it if missing. Then
    /// writes, commits, and pushes the announcement post.
    ///
    /// # Errors
    ///
    /// - Return [`ReleaseError::Syscall`] if a Git call fails.
    /// - Return [`ReleaseError::Write`] if post cannot be written.
    #[instrument(skip(self, now, fragment), level = "debug")]
    pub fn announce<Tz>(&self, version: &Version, now: &DateTime<Tz>, fragment: &str) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let settings = &self.config.release;
        let announcement = &settings.announcement;
        let docs_dir = self.root.join(&announcement.docs_dir);

        if docs_dir.exists() {
            info!("pull documentation site at {}", docs_dir.display());
            GitCall::new(&docs_dir).run(["pull"])?;
        } else {
            info!("clone documentation site into {}", docs_dir.display());
            GitCall::new(&self.root).run([
                "clone".into(),
                announcement.docs_url.clone().into(),
                docs_dir.clone().into_os_string(),
            ])?;
        }

        let post = announcement
            .posts_dir
            .join(announcement_file_name(&settings.project, version, now.date_naive()));
        let contents = announcement_post(
            &settings.project,
            version,
            now,
            fragment,
            &announcement.commits_url,
        );
        let posts_dir = docs_dir.join(&announcement.posts_dir);
        create_dir_all(&posts_dir).map_err(|err| ReleaseError::Write {
            source: err,
            path: posts_dir.clone(),
        })?;
        write_file(&docs_dir.join(&post), &contents)?;

        let git = GitCall::new(&docs_dir);
        info!("publish announcement {} in {}", post.display(), git.workdir().display());
        git.run(["add".into(), post.into_os_string()])?;
        git.run([
            "commit".to_string(),
            "-m".to_string(),
            format!("{} v{version} released", settings.project),
        ])?;
        git.run(["push"])?;

        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String> {
    read_to_string(path).map_err(|err| ReleaseError::Read {
        source: err,
        path: path.to_path_buf(),
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    write(path, contents.as_bytes()).map_err(|err| ReleaseError::Write {
        source: err,
        path: path.to_path_buf(),
    })
}

/// Release workflow error types.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// Version is not of the form major.minor.patch.
    #[error("expected version number as major.minor.patch, got {version:?}")]
    InvalidVersion { version: String },

    /// Release is not cut from release branch.
    #[error("not on {expected} branch, currently on {found}")]
    WrongBranch { expected: String, found: String },

    /// Version does not advance past latest release.
    #[error("v{version} is not newer than latest release {latest}")]
    NotNewer { version: Version, latest: String },

    /// Changelog fragment was never prepared.
    #[error("no changelog fragment at {:?}, run release prepare first", path.display())]
    MissingFragment { path: PathBuf },

    /// CMake file does not set project version.
    #[error("no set(PROJECT_VERSION ...) line in {:?}", path.display())]
    MissingProjectVersion { path: PathBuf },

    /// File cannot be read.
    #[error("failed to read from {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written.
    #[error("failed to write to {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Changelog generation fails.
    #[error(transparent)]
    Changelog(#[from] crate::changelog::ChangelogError),

    /// Project configuration cannot be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// History query fails.
    #[error(transparent)]
    Vcs(#[from] crate::changelog::vcs::VcsError),

    /// External Git call fails.
    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = ReleaseError> = std::result::Result<T, E>;
