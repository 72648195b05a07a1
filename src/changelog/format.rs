// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Changelog text layout.
//!
//! Turn raw commit message bodies into Markdown bullets, and stitch the
//! bullets of each scope together under their headings. Everything here is
//! pure text manipulation, so it never touches a repository.
//!
//! # Layout
//!
//! The produced text is appended verbatim into `CHANGELOG.md` and the release
//! announcement post, so its exact shape matters:
//!
//! ```markdown
//! ## Albert
//!
//! - Subject line of newest commit
//!   Body line of newest commit
//! - Subject line of older commit
//!
//! ## Plugins
//!
//! - Subject line
//! ```

/// Format raw commit message bodies into a bullet block.
///
/// The first non-blank line of each entry becomes a `- ` bullet. All later
/// non-blank lines of that entry are indented by two spaces under it. Blank
/// lines are dropped entirely, and entries made up of nothing but blank lines
/// produce no bullet at all.
///
/// Returns an empty string for an empty sequence of entries.
pub fn format_log(entries: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let mut lines = Vec::new();
    for entry in entries {
        let mut body = entry
            .as_ref()
            .lines()
            .filter(|line| !line.trim().is_empty());

        if let Some(subject) = body.next() {
            lines.push(format!("- {subject}"));
            lines.extend(body.map(|line| format!("  {line}")));
        }
    }

    lines.join("\n")
}

/// Formatted log block of a scope under its heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading text, without the Markdown marker.
    pub heading: String,

    /// Formatted log block produced by [`format_log`].
    pub block: String,
}

impl Section {
    /// Construct new section.
    pub fn new(heading: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            block: block.into(),
        }
    }

    /// Section has nothing to report.
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }
}

/// Assemble sections into the final changelog document.
///
/// Sections keep their given order. Empty sections are skipped, so no
/// heading ever shows up without bullets below it. Emitted sections are
/// separated by exactly one blank line.
pub fn assemble<'a>(sections: impl IntoIterator<Item = &'a Section>) -> String {
    sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .map(|section| format!("## {}\n\n{}", section.heading, section.block))
        .collect::<Vec<_>>()
        .join("\n\n")
}
