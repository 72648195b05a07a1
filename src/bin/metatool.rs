// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use metatool::{generate_changelog, path::project_root, Release, Version};

use anyhow::{bail, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::Confirm;
use std::{fs::write, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  metatool [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path inside the project to operate on.
    #[arg(short, long, global = true, value_name = "path")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let root = match self.root {
            Some(path) => project_root(path)?,
            None => project_root(std::env::current_dir()?)?,
        };

        match self.command {
            Command::Changelog(opts) => run_changelog(root, opts),
            Command::Release(ReleaseCommand::Prepare(opts)) => run_prepare(root, opts),
            Command::Release(ReleaseCommand::Publish(opts)) => run_publish(root, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create raw changelog since the last release.
    #[command(override_usage = "metatool changelog [options]")]
    Changelog(ChangelogOptions),

    /// Release a new version.
    #[command(subcommand)]
    Release(ReleaseCommand),
}

#[derive(Debug, Clone, Subcommand)]
enum ReleaseCommand {
    /// Write changelog fragment of new version for editing.
    #[command(override_usage = "metatool release prepare [options] <version>")]
    Prepare(PrepareOptions),

    /// Commit, tag, push, and announce new version.
    #[command(override_usage = "metatool release publish [options] <version>")]
    Publish(PublishOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ChangelogOptions {
    /// Write changelog to file instead of standard output.
    #[arg(short, long, value_name = "file")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PrepareOptions {
    /// Semantic version to release as major.minor.patch.
    #[arg(required = true, value_name = "version")]
    pub version: Version,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PublishOptions {
    /// Semantic version to release as major.minor.patch.
    #[arg(required = true, value_name = "version")]
    pub version: Version,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_changelog(root: PathBuf, opts: ChangelogOptions) -> Result<()> {
    let changelog = generate_changelog(&root)?;
    match opts.output {
        Some(path) => {
            write(&path, changelog.as_bytes())?;
            info!("changelog written to {}", path.display());
        }
        None => println!("{changelog}"),
    }

    Ok(())
}

fn run_prepare(root: PathBuf, opts: PrepareOptions) -> Result<()> {
    let release = Release::open(root)?;
    let path = release.prepare(&opts.version)?;
    info!(
        "edit {} to be meaningful to humans, then run: metatool release publish {}",
        path.display(),
        opts.version
    );

    Ok(())
}

fn run_publish(root: PathBuf, opts: PublishOptions) -> Result<()> {
    let release = Release::open(root)?;
    release.check(&opts.version)?;

    if !opts.yes {
        let confirmed = Confirm::new(&format!(
            "Release {} (changelog, version, tagged push)?",
            opts.version.tag()
        ))
        .with_default(false)
        .prompt()?;

        if !confirmed {
            bail!("release of {} aborted", opts.version.tag());
        }
    }

    release.publish(&opts.version, &Local::now())?;
    info!("released {}", opts.version.tag());

    Ok(())
}
