use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::{Path, PathBuf};

use announce::config::{self, resolve_token, Config, PrepareConfig, PublishConfig, ReleaseConfig};
use announce::git::Git2Repository;
use announce::host::{GitHost, HostTokens};
use announce::pipeline::{
    run_prepare, run_publish, run_release, upstream_identity, NpmPublisher, PrepareOptions,
    PublishOptions, ReleaseOptions, Stage,
};
use announce::ui::{self, Progress};
use announce::{logging, ExecMode, Verbosity};

#[derive(Parser)]
#[command(
    name = "announce",
    version,
    about = "Bump the version, tag, release and publish from conventional commits"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Show debug output")]
    debug: bool,

    #[arg(short, long, global = true, help = "Only show errors")]
    quiet: bool,

    #[arg(long, global = true, help = "Show nothing but fatal errors")]
    silent: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the next version and write it into the project files
    #[command(alias = "prep")]
    Prepare(PrepareArgs),

    /// Update the changelog, tag, push and create a hosted release
    Release(ReleaseArgs),

    /// Publish the hosted release tarball to npm
    #[command(alias = "pub")]
    Publish(PublishArgs),
}

#[derive(Args)]
struct PrepareArgs {
    #[arg(short = 'w', long, help = "Project root (defaults to the current directory)")]
    current_working_directory: Option<PathBuf>,

    #[arg(short, long, help = "current, next, patch, minor, major or an explicit version")]
    series: Option<String>,

    #[arg(long, help = "Comma-separated prerelease stages, least mature first")]
    version_ladder: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Extra folders to leave untouched")]
    ignore_folders: Vec<String>,

    #[arg(long, help = "Use this version instead of reading the manifest")]
    current_version: Option<String>,
}

impl PrepareArgs {
    fn apply(&self, config: &mut PrepareConfig) {
        if let Some(dir) = &self.current_working_directory {
            config.current_working_directory = Some(dir.clone());
        }
        if let Some(series) = &self.series {
            config.series = series.clone();
        }
        if let Some(ladder) = &self.version_ladder {
            config.version_ladder = ladder.clone();
        }
        if !self.ignore_folders.is_empty() {
            config.ignore_folders = self.ignore_folders.clone();
        }
    }
}

#[derive(Args)]
struct ReleaseArgs {
    #[arg(short = 'w', long, help = "Project root (defaults to the current directory)")]
    current_working_directory: Option<PathBuf>,

    #[arg(long, help = "Commit a dirty working tree instead of stashing it")]
    commit: bool,

    #[arg(short, long, help = "Commit message for a dirty working tree")]
    message: Option<String>,

    #[arg(long, help = "Do not update the changelog or tag the code")]
    dont_tag: bool,

    #[arg(long, help = "Release this existing tag instead of tagging now")]
    tag: Option<String>,

    #[arg(long, help = "Tag name pattern, e.g. V{version}")]
    tag_name: Option<String>,

    #[arg(long, help = "Annotated tag message pattern")]
    tag_message: Option<String>,

    #[arg(long, help = "Do not create a release on the git host")]
    dont_release: bool,

    #[arg(long, help = "Release name pattern, e.g. V{version} Release")]
    release_name: Option<String>,

    #[arg(long, help = "Release notes template file")]
    release_message: Option<PathBuf>,

    #[arg(short, long, help = "Remote that hosts the project")]
    upstream: Option<String>,

    #[arg(long, help = "GitHub access token (falls back to GITHUB_TOKEN)")]
    github_token: Option<String>,

    #[arg(long, help = "GitLab access token (falls back to GITLAB_TOKEN)")]
    gitlab_token: Option<String>,
}

impl ReleaseArgs {
    fn apply(&self, config: &mut ReleaseConfig) {
        if let Some(dir) = &self.current_working_directory {
            config.current_working_directory = Some(dir.clone());
        }
        config.commit |= self.commit;
        if let Some(message) = &self.message {
            config.message = message.clone();
        }
        config.dont_tag |= self.dont_tag;
        if let Some(tag) = &self.tag {
            config.tag = Some(tag.clone());
        }
        if let Some(tag_name) = &self.tag_name {
            config.tag_name = tag_name.clone();
        }
        if let Some(tag_message) = &self.tag_message {
            config.tag_message = tag_message.clone();
        }
        config.dont_release |= self.dont_release;
        if let Some(release_name) = &self.release_name {
            config.release_name = release_name.clone();
        }
        if let Some(template) = &self.release_message {
            config.release_message = Some(template.clone());
        }
        if let Some(upstream) = &self.upstream {
            config.upstream = upstream.clone();
        }
    }
}

#[derive(Args)]
struct PublishArgs {
    #[arg(short = 'w', long, help = "Project root (defaults to the current directory)")]
    current_working_directory: Option<PathBuf>,

    #[arg(long, help = "npm access level (public or restricted)")]
    access: Option<String>,

    #[arg(long, help = "npm dist-tag (defaults to next for prereleases, latest otherwise)")]
    dist_tag: Option<String>,

    #[arg(long, help = "Run npm publish with --dry-run")]
    dry_run: bool,

    #[arg(long, help = "npm token (falls back to NPM_TOKEN)")]
    npm_token: Option<String>,

    #[arg(long, help = "Name of the release to publish")]
    release_name: Option<String>,

    #[arg(short, long, help = "Remote that hosts the project")]
    upstream: Option<String>,

    #[arg(long, help = "GitHub access token (falls back to GITHUB_TOKEN)")]
    github_token: Option<String>,

    #[arg(long, help = "GitLab access token (falls back to GITLAB_TOKEN)")]
    gitlab_token: Option<String>,
}

impl PublishArgs {
    fn apply(&self, config: &mut PublishConfig) {
        if let Some(dir) = &self.current_working_directory {
            config.current_working_directory = Some(dir.clone());
        }
        if let Some(access) = &self.access {
            config.access = access.clone();
        }
        if let Some(dist_tag) = &self.dist_tag {
            config.dist_tag = Some(dist_tag.clone());
        }
        config.dry_run |= self.dry_run;
        if let Some(release_name) = &self.release_name {
            config.release_name = release_name.clone();
        }
        if let Some(upstream) = &self.upstream {
            config.upstream = upstream.clone();
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let verbosity = Verbosity::from_flags(cli.debug, cli.quiet, cli.silent);
    logging::init_tracing(verbosity)?;
    let progress = Progress::new(ExecMode::Cli, verbosity);

    let mut config = config::load_config(cli.config.as_deref()).context("Error loading config")?;

    match cli.command {
        Command::Prepare(args) => prepare(&args, &mut config, &progress),
        Command::Release(args) => release(&args, &mut config, &progress),
        Command::Publish(args) => publish(&args, &mut config, &progress),
    }
}

fn project_root(configured: Option<&Path>) -> Result<PathBuf> {
    let cwd = env::current_dir().context("cannot determine the current directory")?;
    Ok(match configured {
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}

fn prepare(args: &PrepareArgs, config: &mut Config, progress: &Progress) -> Result<()> {
    args.apply(&mut config.prepare);
    let root = project_root(config.prepare.current_working_directory.as_deref())?;

    let mut options = PrepareOptions::from_config(&config.prepare, root)?;
    options.current_version = args.current_version.clone();

    let outcome = run_prepare(&options, progress)?;
    if let Stage::Ran(report) = outcome.replacement {
        report.into_result()?;
    }
    Ok(())
}

fn release(args: &ReleaseArgs, config: &mut Config, progress: &Progress) -> Result<()> {
    args.apply(&mut config.release);
    let root = project_root(config.release.current_working_directory.as_deref())?;

    let tokens = HostTokens {
        github: resolve_token(
            args.github_token.as_deref(),
            config.release.github_token.as_deref(),
            "GITHUB_TOKEN",
        ),
        gitlab: resolve_token(
            args.gitlab_token.as_deref(),
            config.release.gitlab_token.as_deref(),
            "GITLAB_TOKEN",
        ),
    };

    let options = ReleaseOptions::from_config(&config.release, root);
    let mut repo = Git2Repository::open(&options.root)?;
    let identity = upstream_identity(&repo, &options.upstream)?;
    let host = GitHost::for_repository(&identity, &tokens)?;

    let outcome = run_release(&options, &mut repo, &host, progress)?;
    if let Stage::Ran(release) = &outcome.release {
        progress.done(&format!("Released {} ({})", release.name, release.tag));
    }
    Ok(())
}

fn publish(args: &PublishArgs, config: &mut Config, progress: &Progress) -> Result<()> {
    args.apply(&mut config.publish);
    let root = project_root(config.publish.current_working_directory.as_deref())?;

    let tokens = HostTokens {
        github: resolve_token(
            args.github_token.as_deref(),
            config.publish.github_token.as_deref(),
            "GITHUB_TOKEN",
        ),
        gitlab: resolve_token(
            args.gitlab_token.as_deref(),
            config.publish.gitlab_token.as_deref(),
            "GITLAB_TOKEN",
        ),
    };

    let mut options = PublishOptions::from_config(&config.publish, root);
    options.npm_token = resolve_token(
        args.npm_token.as_deref(),
        config.publish.npm_token.as_deref(),
        "NPM_TOKEN",
    );

    let repo = Git2Repository::open(&options.root)?;
    let identity = upstream_identity(&repo, &options.upstream)?;
    let host = GitHost::for_repository(&identity, &tokens)?;

    run_publish(&options, &repo, &host, &NpmPublisher::new(), progress)?;
    Ok(())
}
