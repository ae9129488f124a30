use clap::{Parser, Subcommand};
use log::{error, warn};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use bucket_explorer::explorer::NoticeKind;
use bucket_explorer::prefs::Preferences;
use bucket_explorer::upload::collect_dropped_paths;
use bucket_explorer::{
    AppConfig, Explorer, PreviewLoader, PreviewState, Result, S3Store, StorageItem, ViewMode,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file. Environment variables override its values.
    #[arg(short, long, env = "EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a folder
    Ls {
        #[arg(default_value = "")]
        path: String,
        #[arg(long, value_parser = parse_view_mode, help = "grid, list or detail")]
        view: Option<ViewMode>,
        #[arg(long, help = "Print rows as JSON")]
        json: bool,
    },
    /// Upload files or directories
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "")]
        to: String,
    },
    /// Create a folder
    Mkdir { path: String },
    /// Delete a file or a folder with its contents
    Rm { key: String },
    /// Rename a file or folder in place
    Mv { key: String, new_name: String },
    /// Make a file public
    Public { key: String },
    /// Make a file private
    Private { key: String },
    /// Print a URL for a file or folder
    Url { key: String },
    /// Resolve a file for viewing, retrying until it loads
    View { key: String },
    /// Show or set the default view mode
    ViewMode {
        #[arg(value_parser = parse_view_mode)]
        mode: Option<ViewMode>,
    },
}

fn parse_view_mode(value: &str) -> std::result::Result<ViewMode, String> {
    value.parse().map_err(|e: bucket_explorer::Error| e.to_string())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let store = Arc::new(S3Store::new(&config.store));
    let mut explorer = Explorer::new(store, config.upload.clone());

    if let Some(path) = config.preferences_path() {
        match Preferences::open(&path).await {
            Ok(prefs) => explorer = explorer.with_preferences(prefs).await,
            Err(e) => warn!("preferences unavailable at {}: {}", path.display(), e),
        }
    }

    let outcome = dispatch(&mut explorer, cli.command).await;
    for notice in explorer.take_notifications() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => eprintln!("{}", notice.message),
        }
    }
    outcome
}

/// Locate `key` in its parent folder's listing.
async fn find_item(explorer: &mut Explorer, key: &str) -> Result<StorageItem> {
    let key = key.trim_start_matches('/');
    explorer
        .navigate(&bucket_explorer::path::parent_path(key))
        .await?;
    let wanted = key.trim_end_matches('/');
    explorer
        .state()
        .items
        .iter()
        .find(|i| i.key.trim_end_matches('/') == wanted)
        .cloned()
        .ok_or_else(|| bucket_explorer::Error::InvalidName(format!("{} not found", key)))
}

async fn dispatch(explorer: &mut Explorer, command: Commands) -> Result<()> {
    match command {
        Commands::Ls { path, view, json } => {
            if let Some(mode) = view {
                explorer.set_view_mode(mode).await;
            }
            explorer.navigate(&path).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&explorer.rows())?);
                return Ok(());
            }
            println!("{}", explorer.route());
            for row in explorer.rows() {
                println!("{}", row.render());
            }
        }
        Commands::Upload { files, to } => {
            let files = collect_dropped_paths(&files)?;
            let summary = explorer.upload(files, Some(to.as_str())).await;
            for failed in &summary.failed {
                eprintln!("{}: {}", failed.key, failed.error);
            }
        }
        Commands::Mkdir { path } => {
            let path = path.trim_matches('/');
            let (parent, name) = path.rsplit_once('/').unwrap_or(("", path));
            explorer.navigate(parent).await?;
            explorer.create_folder(name).await?;
        }
        Commands::Rm { key } => {
            let item = find_item(explorer, &key).await?;
            explorer.delete(&item).await?;
        }
        Commands::Mv { key, new_name } => {
            let item = find_item(explorer, &key).await?;
            explorer.rename(&item, &new_name).await?;
        }
        Commands::Public { key } | Commands::Private { key } if key.ends_with('/') => {
            return Err(bucket_explorer::Error::InvalidName(format!(
                "{} is a folder",
                key
            )));
        }
        Commands::Public { key } => {
            let item = find_item(explorer, &key).await?;
            if !item.is_public {
                explorer.toggle_public(&item).await?;
            }
        }
        Commands::Private { key } => {
            let item = find_item(explorer, &key).await?;
            if item.is_public {
                explorer.toggle_public(&item).await?;
            }
        }
        Commands::Url { key } => {
            let item = find_item(explorer, &key).await?;
            let url = explorer.copy_url(&item).await?;
            explorer.take_notifications();
            println!("{}", url);
        }
        Commands::View { key } => {
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let loader = PreviewLoader::new(
                explorer.store(),
                key.trim_start_matches('/'),
                explorer.settings().presign_expiry_secs,
            );
            let end = loader
                .run(cancel, |state| {
                    if let PreviewState::Retrying { attempt, error } = state {
                        eprintln!("retrying (attempt {}): {}", attempt, error);
                    }
                })
                .await;
            match end {
                PreviewState::Loaded { url } => println!("{}", url),
                PreviewState::Forbidden { error } => {
                    return Err(bucket_explorer::Error::AccessDenied(error))
                }
                _ => {}
            }
        }
        Commands::ViewMode { mode } => match mode {
            Some(mode) => explorer.set_view_mode(mode).await,
            None => println!("{}", explorer.state().view_mode),
        },
    }
    Ok(())
}
