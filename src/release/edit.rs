// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release text edits.
//!
//! Pure transformations of the files a release touches. File I/O is left to
//! the caller.

use crate::release::Version;

use chrono::{DateTime, NaiveDate, TimeZone};
use regex::Regex;
use std::{fmt::Display, sync::LazyLock};

static PROJECT_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^set\(PROJECT_VERSION\b.*$").expect("Invalid project version regex")
});

/// Prepend release entry to existing changelog content.
///
/// The entry is headed by the version and release date, followed by the
/// edited changelog fragment.
pub fn prepend_changelog(
    existing: &str,
    version: &Version,
    date: NaiveDate,
    fragment: &str,
) -> String {
    format!(
        "v{version} ({})\n\n{}\n\n{existing}",
        date.format("%Y-%m-%d"),
        fragment.trim()
    )
}

/// Replace project version of a CMake file.
///
/// Rewrites every `set(PROJECT_VERSION ...)` line to the new version.
/// Returns `None` if there is no such line.
pub fn bump_cmake_version(contents: &str, version: &Version) -> Option<String> {
    if !PROJECT_VERSION_REGEX.is_match(contents) {
        return None;
    }

    let replacement = format!("set(PROJECT_VERSION {version})");
    Some(
        PROJECT_VERSION_REGEX
            .replace_all(contents, regex::NoExpand(&replacement))
            .into_owned(),
    )
}

/// File name of release announcement post.
pub fn announcement_file_name(project: &str, version: &Version, date: NaiveDate) -> String {
    format!(
        "{}-{}-v{version}-released.md",
        date.format("%Y-%m-%d"),
        project.to_lowercase().replace(' ', "-")
    )
}

/// Render release announcement post.
///
/// Produces a Jekyll post with front matter, the changelog fragment, and a
/// link to the commits of the release tag.
pub fn announcement_post<Tz>(
    project: &str,
    version: &Version,
    now: &DateTime<Tz>,
    fragment: &str,
    commits_url: &str,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "---\n\
         layout: docs\n\
         title:  \"{project} v{version} released\"\n\
         date: {}\n\
         ---\n\
         \n\
         {}\n\
         \n\
         Check the [GitHub repositories]({}/v{version}) for details.\n",
        now.format("%Y-%m-%d %H:%M%z"),
        fragment.trim(),
        commits_url.trim_end_matches('/'),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn version() -> Version {
        "v0.23.0".parse().unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn prepend_changelog_entry() {
        let existing = indoc! {"
            v0.22.0 (2023-11-02)

            ## Albert

            - Old change
        "};
        let fragment = "## Albert\n\n- Add search feature\n\n";

        let expect = indoc! {"
            v0.23.0 (2024-03-09)

            ## Albert

            - Add search feature

            v0.22.0 (2023-11-02)

            ## Albert

            - Old change
        "};
        assert_eq!(prepend_changelog(existing, &version(), date(), fragment), expect);
    }

    #[test]
    fn bump_cmake_project_version() {
        let contents = indoc! {"
            cmake_minimum_required(VERSION 3.16)
            project(albert VERSION ${PROJECT_VERSION})
            set(PROJECT_VERSION 0.22.0)
            set(PROJECT_VERSION_MAJOR 0)
        "};

        let expect = indoc! {"
            cmake_minimum_required(VERSION 3.16)
            project(albert VERSION ${PROJECT_VERSION})
            set(PROJECT_VERSION 0.23.0)
            set(PROJECT_VERSION_MAJOR 0)
        "};
        assert_eq!(bump_cmake_version(contents, &version()).as_deref(), Some(expect));
    }

    #[test]
    fn bump_cmake_without_project_version() {
        let contents = "project(albert VERSION 0.22.0)\n";
        assert_eq!(bump_cmake_version(contents, &version()), None);
    }

    #[test]
    fn announcement_post_layout() {
        let now = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 0)
            .unwrap();
        let fragment = "## Albert\n\n- Add search feature\n";

        let expect = indoc! {r#"
            ---
            layout: docs
            title:  "Albert v0.23.0 released"
            date: 2024-03-09 14:05+0100
            ---

            ## Albert

            - Add search feature

            Check the [GitHub repositories](https://github.com/albertlauncher/albert/commits/v0.23.0) for details.
        "#};
        let result = announcement_post(
            "Albert",
            &version(),
            &now,
            fragment,
            "https://github.com/albertlauncher/albert/commits/",
        );
        assert_eq!(result, expect);
    }

    #[test]
    fn announcement_post_file_name() {
        assert_eq!(
            announcement_file_name("Albert", &version(), date()),
            "2024-03-09-albert-v0.23.0-released.md"
        );
    }
}
