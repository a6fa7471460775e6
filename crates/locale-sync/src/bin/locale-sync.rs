use std::{env, fs, path::PathBuf, process};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use locale_sync::cli_i18n as i18n;
use locale_sync::config::{SyncConfig, resolve_api_key};
use locale_sync::paths::expand_tilde;
use locale_sync::{
    GoogleTranslateProvider, Layout, PairStatus, SyncOptions, Synchronizer, default_root, logging,
    sync,
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "locale-sync",
    version,
    about = "i18n:cli.about",
    disable_version_flag = true
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "version",
        global = true,
        action = ArgAction::SetTrue,
        help = "i18n:cli.version_flag_help"
    )]
    show_version: bool,
    #[arg(long, global = true, value_name = "DIR", help = "i18n:cli.root_help")]
    root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "FILE", help = "i18n:cli.config_help")]
    config: Option<PathBuf>,
    #[arg(long, global = true, action = ArgAction::SetTrue, help = "i18n:cli.verbose_help")]
    verbose: bool,
    #[arg(long, global = true, value_name = "DIR", help = "i18n:cli.log_dir_help")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "i18n:command.init.about")]
    Init,

    #[command(about = "i18n:command.sync.about")]
    Sync(SyncArgs),

    #[command(about = "i18n:command.check.about")]
    Check(FilterArgs),
}

#[derive(Args, Debug)]
struct SyncArgs {
    #[arg(long, value_name = "KEY", help = "i18n:args.sync.api_key")]
    api_key: Option<String>,

    #[arg(long, help = "i18n:args.sync.dry_run")]
    dry_run: bool,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(
        long = "namespace",
        value_name = "NAME",
        action = ArgAction::Append,
        help = "i18n:args.filter.namespace"
    )]
    namespaces: Vec<String>,

    #[arg(
        long = "lang",
        value_name = "TAG",
        action = ArgAction::Append,
        help = "i18n:args.filter.lang"
    )]
    languages: Vec<String>,
}

#[tokio::main]
async fn main() {
    let messages = i18n::messages();
    let command = i18n::localize_command(Cli::command(), messages);

    let mut matches = command.get_matches();
    let cli = Cli::from_arg_matches_mut(&mut matches).unwrap_or_else(|err| err.exit());

    if cli.show_version {
        if let Some(version) = Cli::command().get_version() {
            println!("{version}");
        }
        return;
    }

    let _log_guard = match logging::init_tracing(cli.verbose, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{} {}", messages.error_prefix(), messages.render_anyhow(&err));
            process::exit(1);
        }
    };

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            let rendered = messages.render_anyhow(&err);
            eprintln!("{} {}", messages.error_prefix(), rendered);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but the outcome should fail the process.
async fn run(cli: Cli) -> Result<bool> {
    let layout = resolve_layout(cli.root.clone(), cli.config.clone())?;
    debug!(
        root = %layout.root().display(),
        config = %layout.config_path().display(),
        "resolved layout"
    );
    match cli.command {
        Command::Init => handle_init(&layout),
        Command::Sync(args) => handle_sync(&layout, args).await,
        Command::Check(args) => handle_check(&layout, args).await,
    }
}

fn resolve_layout(
    root_override: Option<PathBuf>,
    config_override: Option<PathBuf>,
) -> Result<Layout> {
    let root = match root_override {
        Some(path) => expand_tilde(path)?,
        None => default_root()?,
    };
    let layout = Layout::new(root);
    Ok(match config_override {
        Some(path) => layout.with_config_path(expand_tilde(path)?),
        None => layout,
    })
}

fn handle_init(layout: &Layout) -> Result<bool> {
    let messages = i18n::messages();
    let path = layout.config_path();
    if path.exists() {
        println!("{}", messages.config_exists(path));
        return Ok(true);
    }

    let toml = SyncConfig::default().to_toml_string()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| messages.config_write_failed(path))?;
    }
    fs::write(path, toml).with_context(|| messages.config_write_failed(path))?;
    println!("{}", messages.config_created(path));
    Ok(true)
}

async fn handle_sync(layout: &Layout, args: SyncArgs) -> Result<bool> {
    let messages = i18n::messages();
    let config = SyncConfig::load_or_default(layout.config_path())?;

    let env_value = env::var(&config.provider.api_key_env).ok();
    let api_key =
        resolve_api_key(args.api_key.as_deref(), env_value.as_deref(), &config.provider, layout.root())?;
    let provider = GoogleTranslateProvider::from_config(&config.provider, api_key.expose())?;

    let options = SyncOptions {
        dry_run: args.dry_run,
        namespaces: args.filter.namespaces,
        languages: args.filter.languages,
    };
    let synchronizer = Synchronizer::new(&config, layout, provider);
    let report = synchronizer
        .run_with(&options, |pair| match &pair.status {
            PairStatus::Written => println!("{}", messages.tree_updated(&pair.path)),
            PairStatus::DryRun => {
                println!("{}", messages.tree_would_update(&pair.path, pair.missing.len()))
            }
            PairStatus::WriteFailed(error) => {
                eprintln!("{}", messages.tree_write_failed(&pair.path, error))
            }
        })
        .await?;

    println!("{}", messages.sync_summary(report.written(), report.added()));

    let failures = report.failures().count();
    if failures > 0 {
        eprintln!("{}", messages.sync_failures(failures));
        return Ok(false);
    }
    Ok(true)
}

async fn handle_check(layout: &Layout, args: FilterArgs) -> Result<bool> {
    let messages = i18n::messages();
    let config = SyncConfig::load_or_default(layout.config_path())?;
    let options =
        SyncOptions { dry_run: true, namespaces: args.namespaces, languages: args.languages };

    let pairs = sync::check(&config, layout, &options).await?;
    let mut total = 0;
    let mut files = 0;
    for pair in pairs.iter().filter(|pair| !pair.missing.is_empty()) {
        println!("{}", messages.check_pair_missing(&pair.path, pair.missing.len()));
        for key_path in &pair.missing {
            println!("  - {key_path}");
        }
        total += pair.missing.len();
        files += 1;
    }

    if total == 0 {
        println!("{}", messages.check_up_to_date());
        return Ok(true);
    }
    println!("{}", messages.check_summary(total, files));
    Ok(false)
}
