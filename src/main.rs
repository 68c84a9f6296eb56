use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use binfilter::filter::{Filter, FilterOptions};
use binfilter::http::HttpClient;
use binfilter::runtime::{RealRuntime, Runtime};
use binfilter::sark::{FilterKind, FilterRule, SarkConfig};

/// binfilter - binhost package filter
///
/// Curates a binhost directory of binary packages: classifies every artifact
/// against a whitelist/blacklist rule matrix and removes the excluded set.
///
/// Examples:
///   binfilter filter -d /usr/portage/packages -f ./rules.yaml
#[derive(Parser, Debug)]
#[command(author, version = env!("BINFILTER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Filter binhost packages against whitelist/blacklist rules
    Filter(FilterArgs),
}

#[derive(clap::Args, Debug)]
pub struct FilterArgs {
    /// Binhost directory with the packages to filter (also via
    /// BINFILTER_BINHOST_DIR)
    #[arg(
        long = "binhost-dir",
        short = 'd',
        env = "BINFILTER_BINHOST_DIR",
        value_name = "PATH"
    )]
    pub binhost_dir: PathBuf,

    /// SARK configuration file with filter rules or targets
    #[arg(long = "sark-config", short = 'f', value_name = "FILE")]
    pub sark_config: Option<PathBuf>,

    /// Filter type (whitelist|blacklist); overrides the configuration
    #[arg(long = "filter-type", short = 't', value_name = "TYPE")]
    pub filter_type: Option<FilterKind>,

    /// Filter a specific package (repeatable)
    #[arg(long = "package", short = 'p', value_name = "ATOM")]
    pub packages: Vec<String>,

    /// Filter a whole category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Directory or file prefix for the JSON report
    #[arg(long = "report-prefix", value_name = "PATH")]
    pub report_prefix: Option<PathBuf>,

    /// Classify and report only, do not remove files
    #[arg(long = "dry-run", short = 'n')]
    pub dry_run: bool,

    /// Bearer api key for fetching remote rule resources (also via
    /// BINFILTER_APIKEY)
    #[arg(long = "api-key", env = "BINFILTER_APIKEY", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Skip TLS certificate verification on remote fetches
    #[arg(long = "insecure-skip-verify")]
    pub insecure_skip_verify: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Filter(args) => run_filter(args).await,
    }
}

async fn run_filter(args: FilterArgs) -> Result<()> {
    let runtime = RealRuntime;
    let fetcher = HttpClient::new(args.api_key.as_deref(), args.insecure_skip_verify)?;

    let config = build_config(&runtime, &args)?;
    let options = FilterOptions {
        report_prefix: args.report_prefix.clone(),
        dry_run: args.dry_run,
    };

    let filter = Filter::new(&runtime, &fetcher, config, options);
    filter.run(&args.binhost_dir).await?;
    Ok(())
}

/// Assemble the effective configuration from the config file and the inline
/// package/category/type flags.
fn build_config<R: Runtime>(runtime: &R, args: &FilterArgs) -> Result<Option<SarkConfig>> {
    let mut config = match &args.sark_config {
        Some(path) => Some(SarkConfig::from_file(runtime, path)?),
        None => args.filter_type.map(|kind| {
            let mut config = SarkConfig::with_filter_type(kind);
            config.id = "cli".to_string();
            config
        }),
    };

    if !args.packages.is_empty() || !args.categories.is_empty() {
        let rule = FilterRule {
            description: "command line".to_string(),
            pkgs: args.packages.clone(),
            categories: args.categories.clone(),
            ..Default::default()
        };
        let config = config.get_or_insert_with(|| {
            let mut config = SarkConfig::with_filter_type(FilterKind::Whitelist);
            config.id = "cli".to_string();
            config
        });
        config.injector.filter.rules.push(rule);
    }

    if let (Some(kind), Some(config)) = (args.filter_type, config.as_mut()) {
        config.injector.filter.filter_type = Some(kind);
    }

    Ok(config)
}
