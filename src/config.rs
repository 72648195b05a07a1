// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the optional `metatool.toml` file at the top-level
//! of a project. The file tells metatool which nested repositories contribute
//! to the changelog, and how a release gets published. A project without the
//! file gets the Albert layout, i.e., the outer project, the native plugins
//! submodule at "plugins", and the python plugins submodule nested inside it
//! at "plugins/python/plugins".

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Name of configuration file at the top-level of a project.
pub const CONFIG_FILE_NAME: &str = "metatool.toml";

/// Project configuration layout.
///
/// Composed of two parts: the changelog scope layout, and the release
/// settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Scopes contributing to the changelog.
    pub changelog: ChangelogSettings,

    /// Release publication settings.
    pub release: ReleaseSettings,
}

impl ProjectConfig {
    /// Load configuration of project at `root`.
    ///
    /// Falls back to the default layout if the project has no configuration
    /// file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if configuration file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if configuration is malformed.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!("no {CONFIG_FILE_NAME} in {}, using defaults", root.as_ref().display());
            return Ok(Self::default());
        }

        read_to_string(&path)
            .map_err(|err| ConfigError::Read { source: err, path })?
            .parse()
    }
}

impl FromStr for ProjectConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: ProjectConfig =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on documentation checkout path.
        let docs_dir = &mut config.release.announcement.docs_dir;
        *docs_dir = PathBuf::from(
            shellexpand::full(docs_dir.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        Ok(config)
    }
}

impl Display for ProjectConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Changelog scope layout.
///
/// Scopes are listed outermost first. Each scope after the first one must
/// live inside the scope listed right before it.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ChangelogSettings {
    #[serde(rename = "scope")]
    pub scopes: Vec<ScopeSettings>,
}

impl Default for ChangelogSettings {
    fn default() -> Self {
        Self {
            scopes: vec![
                ScopeSettings::new("Albert", None::<PathBuf>),
                ScopeSettings::new("Plugins", Some("plugins")),
                ScopeSettings::new("Python plugins", Some("plugins/python/plugins")),
            ],
        }
    }
}

/// Single changelog scope.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ScopeSettings {
    /// Heading of the changelog section.
    pub heading: String,

    /// Path of repository relative to project root. Project root if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ScopeSettings {
    /// Construct new scope setting.
    pub fn new(heading: impl Into<String>, path: Option<impl Into<PathBuf>>) -> Self {
        Self {
            heading: heading.into(),
            path: path.map(Into::into),
        }
    }
}

/// Release settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReleaseSettings {
    /// Display name of project.
    pub project: String,

    /// Branch releases are cut from.
    pub branch: String,

    /// Remote to push release commit and tag to.
    pub remote: String,

    /// Changelog file relative to project root.
    pub changelog_file: PathBuf,

    /// CMake file holding the project version relative to project root.
    pub cmake_file: PathBuf,

    /// Publish announcement post to documentation site.
    pub announce: bool,

    /// Announcement post settings.
    pub announcement: AnnouncementSettings,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            project: "Albert".into(),
            branch: "master".into(),
            remote: "origin".into(),
            changelog_file: "CHANGELOG.md".into(),
            cmake_file: "CMakeLists.txt".into(),
            announce: true,
            announcement: AnnouncementSettings::default(),
        }
    }
}

/// Release announcement settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnouncementSettings {
    /// Checkout of documentation site. Relative paths start at project root.
    pub docs_dir: PathBuf,

    /// Remote URL to clone documentation site from.
    pub docs_url: String,

    /// Directory of posts inside documentation site.
    pub posts_dir: PathBuf,

    /// URL prefix of commit listing per tag.
    pub commits_url: String,
}

impl Default for AnnouncementSettings {
    fn default() -> Self {
        Self {
            docs_dir: "documentation".into(),
            docs_url: "git@github.com:albertlauncher/documentation.git".into(),
            posts_dir: "src/_posts".into(),
            commits_url: "https://github.com/albertlauncher/albert/commits".into(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file cannot be read.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("DOCS", "/home/blah/docs")])]
    fn deserialize_project_config() -> anyhow::Result<()> {
        let result: ProjectConfig = r#"
            [[changelog.scope]]
            heading = "Launcher"

            [[changelog.scope]]
            heading = "Extensions"
            path = "ext"

            [release]
            project = "Launcher"
            branch = "main"
            remote = "upstream"
            changelog_file = "NEWS.md"
            cmake_file = "CMakeLists.txt"

            [release.announcement]
            docs_dir = "$DOCS"
            docs_url = "https://blah.org/docs.git"
            posts_dir = "_posts"
            commits_url = "https://blah.org/launcher/commits"
        "#
        .parse()?;

        let expect = ProjectConfig {
            changelog: ChangelogSettings {
                scopes: vec![
                    ScopeSettings::new("Launcher", None::<PathBuf>),
                    ScopeSettings::new("Extensions", Some("ext")),
                ],
            },
            release: ReleaseSettings {
                project: "Launcher".into(),
                branch: "main".into(),
                remote: "upstream".into(),
                changelog_file: "NEWS.md".into(),
                cmake_file: "CMakeLists.txt".into(),
                announce: true,
                announcement: AnnouncementSettings {
                    docs_dir: "/home/blah/docs".into(),
                    docs_url: "https://blah.org/docs.git".into(),
                    posts_dir: "_posts".into(),
                    commits_url: "https://blah.org/launcher/commits".into(),
                },
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_partial_config_uses_defaults() -> anyhow::Result<()> {
        let result: ProjectConfig = r#"
            [release]
            branch = "main"
        "#
        .parse()?;

        assert_eq!(result.changelog, ChangelogSettings::default());
        assert_eq!(result.release.branch, "main");
        assert_eq!(result.release.remote, "origin");
        assert!(result.release.announce);
        assert_eq!(result.release.announcement, AnnouncementSettings::default());

        Ok(())
    }

    #[test]
    fn serialize_project_config() -> anyhow::Result<()> {
        let config = ProjectConfig {
            changelog: ChangelogSettings {
                scopes: vec![
                    ScopeSettings::new("Launcher", None::<PathBuf>),
                    ScopeSettings::new("Extensions", Some("ext")),
                ],
            },
            release: ReleaseSettings {
                announce: false,
                ..Default::default()
            },
        };

        let result = config.to_string();
        assert!(result.contains("[[changelog.scope]]"));
        assert!(result.contains(r#"path = "ext""#));
        assert!(result.contains("announce = false"));
        assert_eq!(result.parse::<ProjectConfig>()?, config);

        Ok(())
    }

    #[sealed_test]
    fn load_without_config_file() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        assert_eq!(ProjectConfig::load(root)?, ProjectConfig::default());

        Ok(())
    }
}
