//! Array adapter
//!
//! Stores an ordered list of strings (paragraphs, bullets) as a single
//! override record, with the same initialize/save/reset contract as
//! [`EditStore`].

use crate::config::FolioConfig;
use crate::errors::{FolioError, Result};
use crate::store::{EditState, EditStore};
use serde::Deserialize;

/// How a list is packed into one stored string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListEncoding {
    /// Items joined with a reserved token. Readable in raw storage, but an
    /// item containing the token splits on read.
    #[default]
    Separator,
    /// A JSON array of strings. Any item content survives.
    Json,
}

/// Encoder/decoder for list content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCodec {
    Separator(String),
    Json,
}

/// Stored form of the empty list under the separator encoding, so that it
/// stays distinct from `[""]` (stored as the empty string).
const EMPTY_LIST: &str = "[]";

impl ListCodec {
    pub fn from_config(cfg: &FolioConfig) -> Self {
        match cfg.list_encoding {
            ListEncoding::Separator => Self::Separator(cfg.separator.clone()),
            ListEncoding::Json => Self::Json,
        }
    }

    /// True when `items` would not survive an encode/decode cycle.
    ///
    /// Under the separator encoding this covers an item containing the
    /// separator, a separator formed across two neighbouring items and the
    /// single item `"[]"`.
    pub fn collides<S: AsRef<str>>(&self, items: &[S]) -> bool {
        match self {
            Self::Separator(sep) => !round_trips(items, &split_items(sep, &join_items(sep, items))),
            Self::Json => false,
        }
    }

    pub fn encode<S: AsRef<str>>(&self, items: &[S]) -> String {
        match self {
            Self::Separator(sep) => {
                let joined = join_items(sep, items);
                if !round_trips(items, &split_items(sep, &joined)) {
                    tracing::warn!(
                        items = items.len(),
                        "List items collide with the reserved separator and will split differently on read"
                    );
                }
                joined
            }
            Self::Json => {
                let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
                // Serializing a list of strings cannot fail.
                serde_json::to_string(&items).unwrap_or_default()
            }
        }
    }

    /// Decode a stored string.
    ///
    /// A value that is not valid for this codec (hand-edited storage, or a
    /// record written before the encoding was switched) becomes one item.
    pub fn decode(&self, raw: &str) -> Vec<String> {
        self.try_decode(raw).unwrap_or_else(|err| {
            tracing::warn!(
                category = err.category().as_str(),
                error = %err,
                "Stored list is malformed, treating it as a single item"
            );
            vec![raw.to_string()]
        })
    }

    /// Like [`Self::decode`] but reports malformed values.
    pub fn try_decode(&self, raw: &str) -> Result<Vec<String>> {
        match self {
            Self::Separator(sep) => Ok(split_items(sep, raw)),
            Self::Json if raw.is_empty() => Ok(Vec::new()),
            Self::Json => serde_json::from_str(raw).map_err(|e| {
                FolioError::encoding_with_source("stored list is not a JSON array of strings", e)
            }),
        }
    }
}

fn join_items<S: AsRef<str>>(sep: &str, items: &[S]) -> String {
    if items.is_empty() {
        return EMPTY_LIST.to_string();
    }
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(sep)
}

fn split_items(sep: &str, raw: &str) -> Vec<String> {
    if raw == EMPTY_LIST {
        return Vec::new();
    }
    raw.split(sep).map(str::to_string).collect()
}

fn round_trips<S: AsRef<str>>(items: &[S], decoded: &[String]) -> bool {
    items.len() == decoded.len() && items.iter().zip(decoded).all(|(i, d)| i.as_ref() == d.as_str())
}

/// Effective state of list content after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEditState {
    pub items: Vec<String>,
    pub is_modified: bool,
    pub synced: bool,
}

/// [`EditStore`] over lists of strings.
#[derive(Debug, Clone)]
pub struct ListStore {
    store: EditStore,
    codec: ListCodec,
}

impl ListStore {
    pub fn new(store: EditStore, codec: ListCodec) -> Self {
        Self { store, codec }
    }

    pub fn store(&self) -> &EditStore {
        &self.store
    }

    pub fn codec(&self) -> &ListCodec {
        &self.codec
    }

    pub fn initialize<S: AsRef<str>>(&self, content_key: &str, original: &[S]) -> ListEditState {
        let baseline = self.codec.encode(original);
        self.decode_state(self.store.initialize(content_key, &baseline))
    }

    pub fn save<S: AsRef<str>, T: AsRef<str>>(
        &self,
        content_key: &str,
        original: &[S],
        new_items: &[T],
    ) -> ListEditState {
        let baseline = self.codec.encode(original);
        let encoded = self.codec.encode(new_items);
        self.decode_state(self.store.save(content_key, &baseline, &encoded))
    }

    pub fn reset<S: AsRef<str>>(&self, content_key: &str, original: &[S]) -> ListEditState {
        let baseline = self.codec.encode(original);
        self.decode_state(self.store.reset(content_key, &baseline))
    }

    fn decode_state(&self, state: EditState) -> ListEditState {
        ListEditState {
            items: self.codec.decode(&state.value),
            is_modified: state.is_modified,
            synced: state.synced,
        }
    }
}
