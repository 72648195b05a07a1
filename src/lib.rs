// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release automation for the Albert launcher.
//!
//! Albert is spread across three repositories: the launcher itself, the
//! native plugins submodule, and the python plugins submodule nested inside
//! the native plugins. Metatool aggregates the commit history of all three
//! since the last release into one human-editable changelog, and walks a
//! maintainer through publishing a release with it.
//!
//! # See Also
//!
//! 1. [`changelog`] for range resolution across nested repositories.
//! 2. [`release`] for the release workflow.

pub mod changelog;
pub mod config;
pub mod path;
pub mod release;

pub use changelog::{generate_changelog, Changelog, ChangelogError, Scope};
pub use config::ProjectConfig;
pub use release::{Release, ReleaseError, Version};
