//! Folio CLI
//!
//! Inspect and maintain the content edits stored by the Folio site.
//!
//! ## Commands
//!
//! - `folio get|set|reset <key>` - one content key
//! - `folio list|count` - which keys carry edits
//! - `folio export` - dump all edits as JSON
//! - `folio reset-all` - discard every edit (asks first)
//! - `folio watch` - follow the number of edits live

mod bulk_cmd;
mod edit_cmd;

pub use bulk_cmd::{ExportArgs, ResetAllArgs, WatchArgs};
pub use edit_cmd::{GetArgs, OriginalArgs, ResetArgs, SetArgs};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use folio_store::{Folio, FolioConfig};
use std::io::Write;
use std::path::PathBuf;

/// Exit code for any failure
pub const EXIT_FAILURE: i32 = 1;

/// Inspect and maintain Folio content edits
#[derive(Debug, Parser)]
#[command(name = "folio", version)]
pub struct FolioCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: FolioSubcommand,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Config file (default: $FOLIO_CONFIG or ~/.config/folio/folio.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file, overriding `db_path` from the config
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn load_config(&self) -> anyhow::Result<FolioConfig> {
        let mut cfg = match &self.config {
            Some(path) => FolioConfig::load_from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => FolioConfig::load().context("failed to load config")?,
        };
        if let Some(db) = &self.db {
            cfg.db_path = db.to_string_lossy().into_owned();
        }
        Ok(cfg)
    }

    pub fn open(&self) -> anyhow::Result<Folio> {
        let cfg = self.load_config()?;
        Folio::with_config(cfg).context("failed to open edit storage")
    }
}

#[derive(Debug, Subcommand)]
pub enum FolioSubcommand {
    /// Print the effective value of a content key
    Get(GetArgs),

    /// Save a new value for a content key
    ///
    /// Saving the original value back removes the edit.
    Set(SetArgs),

    /// Restore the original value of a content key
    Reset(ResetArgs),

    /// List content keys that carry an edit, one per line
    List,

    /// Print how many content keys carry an edit
    Count,

    /// Export every edit as a flat JSON object
    Export(ExportArgs),

    /// Discard every edit
    ResetAll(ResetAllArgs),

    /// Print the number of edits whenever it changes, until Ctrl+C
    Watch(WatchArgs),
}

impl FolioCli {
    pub async fn run(self) -> i32 {
        let folio = match self.global.open() {
            Ok(folio) => folio,
            Err(err) => {
                report_error(&err);
                return EXIT_FAILURE;
            }
        };

        let mut out = std::io::stdout();
        let result = match self.command {
            FolioSubcommand::Get(args) => edit_cmd::run_get(&folio, args, &mut out),
            FolioSubcommand::Set(args) => edit_cmd::run_set(&folio, args, &mut out),
            FolioSubcommand::Reset(args) => edit_cmd::run_reset(&folio, args, &mut out),
            FolioSubcommand::List => bulk_cmd::run_list(&folio, &mut out),
            FolioSubcommand::Count => bulk_cmd::run_count(&folio, &mut out),
            FolioSubcommand::Export(args) => bulk_cmd::run_export(&folio, args, &mut out),
            FolioSubcommand::ResetAll(args) => {
                let mut input = std::io::stdin().lock();
                bulk_cmd::run_reset_all(&folio, args, &mut input, &mut out)
            }
            FolioSubcommand::Watch(args) => {
                let shutdown = async {
                    let _ = tokio::signal::ctrl_c().await;
                };
                bulk_cmd::run_watch(&folio, args, &mut out, shutdown).await
            }
        };

        let _ = out.flush();
        match result {
            Ok(code) => code,
            Err(err) => {
                report_error(&err);
                EXIT_FAILURE
            }
        }
    }
}

fn report_error(err: &anyhow::Error) {
    eprintln!("folio: {err:#}");
}
