//! Client-side edits and tombstones layered over fetched pages.

use std::collections::{HashMap, HashSet};

use crate::types::{CharacterId, CharacterPatch, Page};

/// In-memory edits keyed by character id. Never sent to the server and
/// lives as long as the owning controller.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    patches: HashMap<CharacterId, CharacterPatch>,
    tombstones: HashSet<CharacterId>,
}

impl Overlay {
    pub fn rename(&mut self, id: CharacterId, name: impl Into<String>) {
        self.patches.entry(id).or_default().merge(CharacterPatch {
            name: Some(name.into()),
        });
    }

    pub fn patch(&self, id: CharacterId) -> Option<&CharacterPatch> {
        self.patches.get(&id)
    }

    pub fn tombstone(&mut self, id: CharacterId) {
        self.tombstones.insert(id);
    }

    pub fn is_deleted(&self, id: CharacterId) -> bool {
        self.tombstones.contains(&id)
    }

    /// Drop tombstoned characters, then apply pending patches.
    ///
    /// `total` is left as the server reported it.
    pub fn apply(&self, mut page: Page) -> Page {
        page.characters.retain(|c| !self.tombstones.contains(&c.id));
        for character in &mut page.characters {
            if let Some(patch) = self.patches.get(&character.id) {
                patch.apply(character);
            }
        }
        page
    }
}
