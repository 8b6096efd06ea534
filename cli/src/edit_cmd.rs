//! Per-key commands: `get`, `set`, `reset`.
//!
//! The site keeps the original content; the CLI has to be told what it is,
//! either inline (`--original`) or from a file (`--original-file`). With
//! `--list` the original and the value are framed text (paragraphs or
//! bullets) and are stored as lists.

use crate::EXIT_FAILURE;
use anyhow::Context;
use clap::Args;
use folio_store::{EditState, Folio, ListEditState, ListFraming};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct OriginalArgs {
    /// Original content as authored on the page
    #[arg(
        long,
        value_name = "TEXT",
        conflicts_with = "original_file",
        required_unless_present = "original_file"
    )]
    pub original: Option<String>,

    /// Read the original content from a file
    #[arg(long, value_name = "PATH")]
    pub original_file: Option<PathBuf>,

    /// Treat the content as a list framed as `paragraphs` or `bullets`
    #[arg(long, value_name = "FRAMING", value_parser = parse_framing)]
    pub list: Option<ListFraming>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Content key, e.g. `overview.intro`
    pub key: String,

    #[command(flatten)]
    pub original: OriginalArgs,

    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Content key, e.g. `overview.intro`
    pub key: String,

    /// New value (framed text with `--list`)
    pub value: String,

    #[command(flatten)]
    pub original: OriginalArgs,

    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Content key, e.g. `overview.intro`
    pub key: String,

    #[command(flatten)]
    pub original: OriginalArgs,

    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

fn parse_framing(s: &str) -> Result<ListFraming, String> {
    ListFraming::parse(s).ok_or_else(|| format!("unknown list framing '{s}' (paragraphs|bullets)"))
}

/// Original content after reading and framing
enum Original {
    Text(String),
    List(ListFraming, Vec<String>),
}

impl OriginalArgs {
    fn resolve(&self) -> anyhow::Result<Original> {
        let text = match (&self.original, &self.original_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                strip_line_ending(contents)
            }
            (None, None) => anyhow::bail!("one of --original or --original-file is required"),
        };

        Ok(match self.list {
            Some(framing) => Original::List(framing, framing.items_from_text(&text)),
            None => Original::Text(text),
        })
    }
}

/// Files usually end in a newline the page content does not have.
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

pub(crate) fn run_get(folio: &Folio, args: GetArgs, out: &mut impl Write) -> anyhow::Result<i32> {
    let synced = match args.original.resolve()? {
        Original::Text(original) => {
            let state = folio.store().initialize(&args.key, &original);
            write_value(out, &args.key, &state, args.json, true)?;
            state.synced
        }
        Original::List(framing, original) => {
            let state = folio.lists().initialize(&args.key, &original);
            write_list(out, &args.key, framing, &state, args.json, true)?;
            state.synced
        }
    };
    Ok(exit_code(synced))
}

pub(crate) fn run_set(folio: &Folio, args: SetArgs, out: &mut impl Write) -> anyhow::Result<i32> {
    let synced = match args.original.resolve()? {
        Original::Text(original) => {
            let state = folio.store().save(&args.key, &original, &args.value);
            write_value(out, &args.key, &state, args.json, false)?;
            state.synced
        }
        Original::List(framing, original) => {
            let items = framing.items_from_text(&args.value);
            let state = folio.lists().save(&args.key, &original, &items);
            write_list(out, &args.key, framing, &state, args.json, false)?;
            state.synced
        }
    };
    Ok(exit_code(synced))
}

pub(crate) fn run_reset(
    folio: &Folio,
    args: ResetArgs,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    let synced = match args.original.resolve()? {
        Original::Text(original) => {
            let state = folio.store().reset(&args.key, &original);
            write_value(out, &args.key, &state, args.json, false)?;
            state.synced
        }
        Original::List(framing, original) => {
            let state = folio.lists().reset(&args.key, &original);
            write_list(out, &args.key, framing, &state, args.json, false)?;
            state.synced
        }
    };
    Ok(exit_code(synced))
}

fn exit_code(synced: bool) -> i32 {
    if synced { 0 } else { EXIT_FAILURE }
}

fn status_label(is_modified: bool) -> &'static str {
    if is_modified { "modified" } else { "original" }
}

/// `show_value` prints the content itself; otherwise just the key's status.
fn write_value(
    out: &mut impl Write,
    key: &str,
    state: &EditState,
    json: bool,
    show_value: bool,
) -> anyhow::Result<()> {
    if json {
        let doc = serde_json::json!({
            "key": key,
            "value": state.value,
            "is_modified": state.is_modified,
            "synced": state.synced,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
    } else if show_value {
        writeln!(out, "{}", state.value)?;
    } else {
        writeln!(out, "{key}: {}", status_label(state.is_modified))?;
    }
    Ok(())
}

fn write_list(
    out: &mut impl Write,
    key: &str,
    framing: ListFraming,
    state: &ListEditState,
    json: bool,
    show_value: bool,
) -> anyhow::Result<()> {
    if json {
        let doc = serde_json::json!({
            "key": key,
            "framing": framing.as_str(),
            "items": state.items,
            "is_modified": state.is_modified,
            "synced": state.synced,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
    } else if show_value {
        writeln!(out, "{}", framing.text_from_items(&state.items))?;
    } else {
        writeln!(out, "{key}: {}", status_label(state.is_modified))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::FolioConfig;
    use pretty_assertions::assert_eq;

    fn original(text: &str) -> OriginalArgs {
        OriginalArgs {
            original: Some(text.to_string()),
            original_file: None,
            list: None,
        }
    }

    fn run<F>(f: F) -> (i32, String)
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<i32>,
    {
        let mut out = Vec::new();
        let code = f(&mut out).expect("command should succeed");
        (code, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn test_set_then_get() {
        let folio = Folio::in_memory(FolioConfig::default());

        let (code, output) = run(|out| {
            run_set(
                &folio,
                SetArgs {
                    key: "overview.intro".into(),
                    value: "Hello there".into(),
                    original: original("Hello world"),
                    json: false,
                },
                out,
            )
        });
        assert_eq!(code, 0);
        assert_eq!(output, "overview.intro: modified\n");

        let (_, output) = run(|out| {
            run_get(
                &folio,
                GetArgs {
                    key: "overview.intro".into(),
                    original: original("Hello world"),
                    json: false,
                },
                out,
            )
        });
        assert_eq!(output, "Hello there\n");
    }

    #[test]
    fn test_reset_json_output() {
        let folio = Folio::in_memory(FolioConfig::default());
        folio.store().save("k", "O", "V");

        let (code, output) = run(|out| {
            run_reset(
                &folio,
                ResetArgs {
                    key: "k".into(),
                    original: original("O"),
                    json: true,
                },
                out,
            )
        });
        assert_eq!(code, 0);
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(
            value,
            serde_json::json!({"key": "k", "value": "O", "is_modified": false, "synced": true})
        );
        assert_eq!(folio.store().modified_count(), 0);
    }

    #[test]
    fn test_list_set_and_get_as_bullets() {
        let folio = Folio::in_memory(FolioConfig::default());
        let bullets = || OriginalArgs {
            original: Some("• Fast\n• Cheap".into()),
            original_file: None,
            list: Some(ListFraming::Bullets),
        };

        run(|out| {
            run_set(
                &folio,
                SetArgs {
                    key: "perks".into(),
                    value: "- Fast\n- Cheap\n- Good".into(),
                    original: bullets(),
                    json: false,
                },
                out,
            )
        });

        assert_eq!(
            folio.store().read_override("perks").expect("read"),
            Some("Fast\n|||\nCheap\n|||\nGood".to_string())
        );

        let (_, output) = run(|out| {
            run_get(
                &folio,
                GetArgs {
                    key: "perks".into(),
                    original: bullets(),
                    json: false,
                },
                out,
            )
        });
        assert_eq!(output, "• Fast\n• Cheap\n• Good\n");
    }

    #[test]
    fn test_original_from_file_drops_final_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("intro.txt");
        std::fs::write(&path, "Hello world\n").expect("write");
        let folio = Folio::in_memory(FolioConfig::default());

        let (_, output) = run(|out| {
            run_set(
                &folio,
                SetArgs {
                    key: "intro".into(),
                    value: "Hello world".into(),
                    original: OriginalArgs {
                        original: None,
                        original_file: Some(path),
                        list: None,
                    },
                    json: false,
                },
                out,
            )
        });
        assert_eq!(output, "intro: original\n");
        assert_eq!(folio.store().modified_count(), 0);
    }

    #[test]
    fn test_parse_framing_rejects_unknown() {
        assert_eq!(parse_framing("bullets"), Ok(ListFraming::Bullets));
        assert!(parse_framing("table").is_err());
    }
}
