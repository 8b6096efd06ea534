//! Whole-store commands: `list`, `count`, `export`, `reset-all`, `watch`.

use crate::EXIT_FAILURE;
use anyhow::Context;
use clap::Args;
use folio_store::{Folio, ModifiedCountWatcher};
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write to this file, or into this directory, instead of stdout
    #[arg(long, short, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ResetAllArgs {
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Fallback rescan period (default: `poll_interval_ms` from the config)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,
}

pub(crate) fn run_list(folio: &Folio, out: &mut impl Write) -> anyhow::Result<i32> {
    let keys = folio
        .store()
        .try_list_modified_keys()
        .context("failed to scan edits")?;
    for key in keys {
        writeln!(out, "{key}")?;
    }
    Ok(0)
}

pub(crate) fn run_count(folio: &Folio, out: &mut impl Write) -> anyhow::Result<i32> {
    let keys = folio
        .store()
        .try_list_modified_keys()
        .context("failed to scan edits")?;
    writeln!(out, "{}", keys.len())?;
    Ok(0)
}

pub(crate) fn run_export(
    folio: &Folio,
    args: ExportArgs,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    let doc = folio.store().export_all();
    match args.out {
        Some(target) => {
            let path = doc.write_to_path(&target, &folio.config().export_filename)?;
            writeln!(out, "Exported {} edits to {}", doc.len(), path.display())?;
        }
        None => writeln!(out, "{}", doc.to_json_pretty()?)?,
    }
    Ok(0)
}

pub(crate) fn run_reset_all(
    folio: &Folio,
    args: ResetAllArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    let pending = folio
        .store()
        .try_list_modified_keys()
        .context("failed to scan edits")?
        .len();

    if pending == 0 {
        writeln!(out, "No edits to reset.")?;
        return Ok(0);
    }

    if !args.yes && !confirm(input, out, &format!("Reset all {pending} edits? [y/N] "))? {
        writeln!(out, "Aborted.")?;
        return Ok(0);
    }

    let removed = folio.store().reset_all();
    writeln!(out, "Reset {removed} edits.")?;

    if removed < pending {
        tracing::warn!(removed, pending, "Some edits could not be reset");
        return Ok(EXIT_FAILURE);
    }
    Ok(0)
}

/// Ask a yes/no question. Anything but `y`/`yes` (including EOF) is no.
fn confirm(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> anyhow::Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Print the edit count now and after every change, until `shutdown`
/// completes.
pub(crate) async fn run_watch(
    folio: &Folio,
    args: WatchArgs,
    out: &mut impl Write,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<i32> {
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| folio.config().poll_interval());

    let mut watcher = ModifiedCountWatcher::spawn_with_file_watch(folio.store().clone(), interval)
        .context("failed to start count watcher")?;

    writeln!(out, "{}", watcher.count())?;
    out.flush()?;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = watcher.changed() => match changed {
                Some(count) => {
                    writeln!(out, "{count}")?;
                    out.flush()?;
                }
                None => break,
            },
            () = &mut shutdown => break,
        }
    }

    tracing::debug!("Count watch stopped");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::FolioConfig;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn folio_with_edits(keys: &[&str]) -> Folio {
        let folio = Folio::in_memory(FolioConfig::default());
        for key in keys {
            folio.store().save(key, "original", "edited");
        }
        folio
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn test_list_is_sorted() {
        let folio = folio_with_edits(&["b.key", "a.key"]);
        let mut out = Vec::new();
        assert_eq!(run_list(&folio, &mut out).expect("list"), 0);
        assert_eq!(output(out), "a.key\nb.key\n");
    }

    #[test]
    fn test_count() {
        let folio = folio_with_edits(&["a", "b", "c"]);
        let mut out = Vec::new();
        run_count(&folio, &mut out).expect("count");
        assert_eq!(output(out), "3\n");
    }

    #[test]
    fn test_export_to_stdout_is_json() {
        let folio = folio_with_edits(&["a"]);
        let mut out = Vec::new();
        run_export(&folio, ExportArgs { out: None }, &mut out).expect("export");
        let value: serde_json::Value = serde_json::from_str(&output(out)).expect("json");
        assert_eq!(value, serde_json::json!({"a": "edited"}));
    }

    #[test]
    fn test_reset_all_declined() {
        let folio = folio_with_edits(&["a", "b"]);
        let mut input = Cursor::new("n\n");
        let mut out = Vec::new();

        let code = run_reset_all(&folio, ResetAllArgs { yes: false }, &mut input, &mut out)
            .expect("reset-all");
        assert_eq!(code, 0);
        assert_eq!(output(out), "Reset all 2 edits? [y/N] Aborted.\n");
        assert_eq!(folio.store().modified_count(), 2);
    }

    #[test]
    fn test_reset_all_eof_is_no() {
        let folio = folio_with_edits(&["a"]);
        let mut input = Cursor::new("");
        let mut out = Vec::new();
        run_reset_all(&folio, ResetAllArgs { yes: false }, &mut input, &mut out)
            .expect("reset-all");
        assert_eq!(folio.store().modified_count(), 1);
    }

    #[test]
    fn test_reset_all_confirmed() {
        let folio = folio_with_edits(&["a", "b"]);
        let mut input = Cursor::new("Y\n");
        let mut out = Vec::new();

        run_reset_all(&folio, ResetAllArgs { yes: false }, &mut input, &mut out)
            .expect("reset-all");
        assert_eq!(output(out), "Reset all 2 edits? [y/N] Reset 2 edits.\n");
        assert_eq!(folio.store().modified_count(), 0);
    }

    #[test]
    fn test_reset_all_with_nothing_to_do_skips_prompt() {
        let folio = folio_with_edits(&[]);
        let mut input = Cursor::new("");
        let mut out = Vec::new();
        run_reset_all(&folio, ResetAllArgs { yes: false }, &mut input, &mut out)
            .expect("reset-all");
        assert_eq!(output(out), "No edits to reset.\n");
    }

    #[tokio::test]
    async fn test_watch_prints_each_change() {
        let folio = folio_with_edits(&["a"]);
        let store = folio.store().clone();
        let shutdown = async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            store.save("b", "original", "edited");
            tokio::time::sleep(Duration::from_millis(200)).await;
        };

        let mut out = Vec::new();
        let code = run_watch(
            &folio,
            WatchArgs {
                interval_ms: Some(60_000),
            },
            &mut out,
            shutdown,
        )
        .await
        .expect("watch");
        assert_eq!(code, 0);
        assert_eq!(output(out), "1\n2\n");
    }
}
