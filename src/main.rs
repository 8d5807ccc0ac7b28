use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use lpm::deps::PromptPolicy;
use lpm::http::HttpClient;
use lpm::ops::{
    InstallAction, OpReport, RefreshAction, RemoveAction, RunAction, SearchAction, UpdateAction,
};
use lpm::runtime::RealRuntime;
use lpm::source::{DEFAULT_API_URL, DEFAULT_ARCHIVE_URL, GithubSource};
use lpm::store::StateStore;

/// lpm - LFF package manager
///
/// Fetches packages from the LFF-Linux-Packages organization, installs
/// their declared dependencies, and runs the commands they ship.
#[derive(Parser, Debug)]
#[command(author, version = env!("LPM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// State directory (overrides the per-user default; also via LPM_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "LPM_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// API URL for the package listing (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Base URL for package archives (defaults to https://github.com)
    #[arg(long = "archive-url", value_name = "URL", global = true)]
    pub archive_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install a package by name
    Install(PackageArgs),

    /// Remove an installed package
    Remove(PackageArgs),

    /// List the packages available from the remote source
    Search,

    /// Re-sync all installed packages against upstream
    Update,

    /// Run a command shipped by an installed package
    Run(RunArgs),

    /// Refresh the cached host inventory
    Refresh,
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    /// The package name (also the remote repository name)
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// The command name, without extension
    #[arg(value_name = "COMMAND")]
    pub command: String,
}

fn build_source(cli: &Cli) -> GithubSource {
    let http_client = HttpClient::new(reqwest::Client::new());
    let api_url = cli.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let archive_url = cli.archive_url.as_deref().unwrap_or(DEFAULT_ARCHIVE_URL);
    GithubSource::with_urls(http_client, api_url, archive_url)
}

fn report_outcome(report: OpReport) -> Result<()> {
    if !report.message.is_empty() {
        println!("{}", report.message);
    }
    if report.is_ok() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => StateStore::default_root(&runtime)?,
    };

    match &cli.command {
        Commands::Install(args) => {
            let source = build_source(&cli);
            let action = InstallAction::new(&runtime, &source, root);
            let policy = PromptPolicy::new(&runtime);
            report_outcome(action.install(&args.name, &policy).await?)
        }
        Commands::Remove(args) => {
            let action = RemoveAction::new(&runtime, root);
            report_outcome(action.remove(&args.name)?)
        }
        Commands::Search => {
            let source = build_source(&cli);
            let action = SearchAction::new(&source);
            report_outcome(action.search().await?)
        }
        Commands::Update => {
            let source = build_source(&cli);
            let action = UpdateAction::new(&runtime, &source, root);
            report_outcome(action.update().await?)
        }
        Commands::Run(args) => {
            let action = RunAction::new(&runtime, root);
            match action.resolve_and_run(&args.command)? {
                Some(report) => report_outcome(report),
                None => {
                    println!("Unknown command: {}", args.command);
                    std::process::exit(127);
                }
            }
        }
        Commands::Refresh => {
            let action = RefreshAction::new(&runtime, root);
            report_outcome(action.refresh()?)
        }
    }
}
