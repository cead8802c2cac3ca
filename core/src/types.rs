//! Domain types and the catalog wire envelope.
//!
//! # Design
//! `Character` and `Page` are what the rest of the crate works with. The
//! `Wire*` structs mirror the provider's JSON and exist only to be mapped
//! into the domain types; the mock server defines its own copies and the
//! integration tests catch schema drift.

use serde::{Deserialize, Serialize};

pub type CharacterId = u64;

/// A catalog entry as displayed to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
}

/// One page of characters plus the server-side count of all matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub characters: Vec<Character>,
    pub total: u64,
}

impl Page {
    /// The canonical empty page, also the fail-soft result.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Local changes to a character. Only the name is patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterPatch {
    pub name: Option<String>,
}

impl CharacterPatch {
    /// Fold `other` into `self`; fields set in `other` win.
    pub fn merge(&mut self, other: CharacterPatch) {
        if other.name.is_some() {
            self.name = other.name;
        }
    }

    pub fn apply(&self, character: &mut Character) {
        if let Some(name) = &self.name {
            character.name.clone_from(name);
        }
    }
}

/// Pagination and filter for a single characters request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub offset: u64,
    pub limit: u64,
    pub name_starts_with: Option<String>,
}

impl PageQuery {
    pub fn new(offset: u64, limit: u64, search: &str) -> Self {
        Self {
            offset,
            limit,
            name_starts_with: (!search.is_empty()).then(|| search.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCharacterData {
    pub results: Vec<WireCharacter>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTotal {
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCharacter {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub thumbnail: WireThumbnail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireThumbnail {
    pub path: String,
    pub extension: String,
}

impl From<WireCharacter> for Character {
    fn from(raw: WireCharacter) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            thumbnail: format!("{}.{}", raw.thumbnail.path, raw.thumbnail.extension),
        }
    }
}
