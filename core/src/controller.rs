//! Paging, search and local-edit state for one list view.
//!
//! # Design
//! `ListController` does no I/O. Operations that need data return a
//! `FetchRequest`; the caller runs it through `CatalogClient` and hands
//! the page back to `apply`. Requests are tagged with an increasing
//! `seq` and a response older than the last applied one is dropped, so
//! overlapping fetches can complete in any order.

use tokio::time::Instant;
use tracing::debug;

use crate::config::ListConfig;
use crate::debounce::Debouncer;
use crate::error::ConfigError;
use crate::overlay::Overlay;
use crate::types::{Character, CharacterId, Page, PageQuery};

/// A fetch the caller must execute and feed back through `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: PageQuery,
}

/// What the user chose in the character detail dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Save(String),
    Delete,
    Cancel,
}

/// Presentation-layer detail view for a single character.
pub trait CharacterDialog {
    fn present(&mut self, character: &Character) -> DialogOutcome;
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub page: Page,
    pub current_page: u64,
    pub total_pages: u64,
    pub page_size: u64,
    pub found_any: bool,
    pub search: String,
}

impl ListView {
    /// 1-based `(first, last)` positions shown on this page, or `None`
    /// when nothing matches.
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        if self.page.total == 0 || self.current_page == 0 {
            return None;
        }
        let first = (self.current_page - 1) * self.page_size + 1;
        let last = (self.current_page * self.page_size).min(self.page.total);
        (first <= last).then_some((first, last))
    }
}

#[derive(Debug)]
pub struct ListController {
    config: ListConfig,
    current_page: u64,
    total_pages: u64,
    published: Page,
    found_any: bool,
    search: String,
    overlay: Overlay,
    debouncer: Debouncer<String>,
    next_seq: u64,
    applied_seq: Option<u64>,
}

impl ListController {
    /// Fails if `config` does not pass `ListConfig::validate`.
    pub fn new(config: ListConfig) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let debouncer = Debouncer::new(config.debounce);
        Ok(Self {
            config,
            current_page: 1,
            total_pages: 1,
            published: Page::empty(),
            found_any: true,
            search: String::new(),
            overlay: Overlay::default(),
            debouncer,
            next_seq: 0,
            applied_seq: None,
        })
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn found_any(&self) -> bool {
        self.found_any
    }

    pub fn published(&self) -> &Page {
        &self.published
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn view(&self) -> ListView {
        ListView {
            page: self.published.clone(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            page_size: self.config.page_size,
            found_any: self.found_any,
            search: self.search.clone(),
        }
    }

    pub fn init(&mut self) -> FetchRequest {
        self.refresh()
    }

    /// First fetch already filtered by `search`, skipping the quiet period.
    /// The term counts as settled, so typing it again does not refetch.
    pub fn init_with_search(&mut self, search: impl Into<String>) -> FetchRequest {
        let search = search.into();
        self.debouncer.settle(search.clone());
        self.search = search;
        self.refresh()
    }

    /// Request the current page with the current search text.
    pub fn refresh(&mut self) -> FetchRequest {
        let seq = self.next_seq;
        self.next_seq += 1;
        let offset = self.current_page.saturating_sub(1) * self.config.page_size;
        FetchRequest {
            seq,
            query: PageQuery::new(offset, self.config.page_size, &self.search),
        }
    }

    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if self.current_page < self.total_pages {
            self.current_page += 1;
            Some(self.refresh())
        } else {
            None
        }
    }

    pub fn prev_page(&mut self) -> Option<FetchRequest> {
        if self.current_page > 1 {
            self.current_page -= 1;
            Some(self.refresh())
        } else {
            None
        }
    }

    /// Feed raw search input; nothing is fetched until it settles.
    pub fn search_input(&mut self, text: impl Into<String>, now: Instant) {
        self.debouncer.input(text.into(), now);
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Honor settled search input, if any, by refreshing.
    pub fn poll_search(&mut self, now: Instant) -> Option<FetchRequest> {
        let term = self.debouncer.poll(now)?;
        debug!(search = %term, "search term settled");
        self.search = term;
        if self.config.reset_page_on_search {
            self.current_page = 1;
        }
        Some(self.refresh())
    }

    /// Merge a fetched page into the published state.
    ///
    /// Returns a follow-up fetch when the current page fell past the end
    /// and had to be clamped.
    pub fn apply(&mut self, request: &FetchRequest, page: Page) -> Option<FetchRequest> {
        if self.applied_seq.is_some_and(|applied| request.seq < applied) {
            debug!(seq = request.seq, "discarding stale page");
            return None;
        }
        self.applied_seq = Some(request.seq);

        let merged = self.overlay.apply(page);
        self.total_pages = merged.total.div_ceil(self.config.page_size);
        self.found_any = !merged.characters.is_empty();

        if merged.total == 0 {
            self.published = Page::empty();
            self.total_pages = 0;
            return None;
        }

        self.published = merged;
        if self.current_page > self.total_pages {
            self.current_page = self.total_pages;
            return Some(self.refresh());
        }
        None
    }

    /// Rename locally and re-merge the published page without fetching.
    pub fn rename(&mut self, id: CharacterId, name: impl Into<String>) {
        self.overlay.rename(id, name);
        let published = std::mem::take(&mut self.published);
        self.published = self.overlay.apply(published);
    }

    /// Hide a character from this and every later page. Returns whether
    /// it was on the published page.
    pub fn delete(&mut self, id: CharacterId) -> bool {
        self.overlay.tombstone(id);
        match self.published.characters.iter().position(|c| c.id == id) {
            Some(index) => {
                self.published.characters.remove(index);
                self.published.total = self.published.total.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.published.characters.iter().find(|c| c.id == id)
    }

    pub fn resolve(&mut self, id: CharacterId, outcome: DialogOutcome) {
        match outcome {
            DialogOutcome::Save(name) => self.rename(id, name),
            DialogOutcome::Delete => {
                self.delete(id);
            }
            DialogOutcome::Cancel => {}
        }
    }

    /// Show the detail dialog for a published character and act on the
    /// outcome. `None` if the id is not on the current page.
    pub fn review(
        &mut self,
        id: CharacterId,
        dialog: &mut impl CharacterDialog,
    ) -> Option<DialogOutcome> {
        let outcome = dialog.present(self.character(id)?);
        self.resolve(id, outcome.clone());
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn character(id: CharacterId, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            description: "...".to_string(),
            thumbnail: "...".to_string(),
        }
    }

    fn page(ids: std::ops::RangeInclusive<CharacterId>, total: u64) -> Page {
        Page {
            characters: ids.map(|id| character(id, &format!("Hero {id}"))).collect(),
            total,
        }
    }

    fn controller() -> ListController {
        ListController::new(ListConfig::default()).unwrap()
    }

    /// Controller that has loaded page 1 of a 100-character catalog.
    fn loaded() -> ListController {
        let mut c = controller();
        let req = c.init();
        assert_eq!(c.apply(&req, page(1..=20, 100)), None);
        c
    }

    fn ids(c: &ListController) -> Vec<CharacterId> {
        c.published().characters.iter().map(|ch| ch.id).collect()
    }

    struct Scripted(Option<DialogOutcome>, Vec<CharacterId>);

    impl CharacterDialog for Scripted {
        fn present(&mut self, character: &Character) -> DialogOutcome {
            self.1.push(character.id);
            self.0.take().unwrap_or(DialogOutcome::Cancel)
        }
    }

    #[test]
    fn init_requests_first_page() {
        let req = controller().init();
        assert_eq!(req.query, PageQuery::new(0, 20, ""));
    }

    #[test]
    fn third_page_requests_offset_forty() {
        let mut c = loaded();
        c.next_page().unwrap();
        let req = c.next_page().unwrap();
        assert_eq!(c.current_page(), 3);
        assert_eq!(req.query.offset, 40);
        assert_eq!(req.query.limit, 20);
        assert_eq!(req.query.name_starts_with, None);
    }

    #[test]
    fn apply_computes_total_pages_and_found_flag() {
        let c = loaded();
        assert_eq!(c.total_pages(), 5);
        assert!(c.found_any());
        assert_eq!(c.published().characters.len(), 20);
    }

    #[test]
    fn single_result_gives_one_page() {
        let mut c = controller();
        let req = c.init();
        c.apply(&req, page(1..=1, 1));
        assert_eq!(c.total_pages(), 1);
        assert!(c.found_any());
    }

    #[test]
    fn next_page_at_last_page_is_noop() {
        let mut c = controller();
        let req = c.init();
        c.apply(&req, page(1..=20, 40));
        assert!(c.next_page().is_some());
        assert_eq!(c.current_page(), 2);
        assert!(c.next_page().is_none());
        assert_eq!(c.current_page(), 2);
    }

    #[test]
    fn prev_page_at_first_page_is_noop() {
        let mut c = loaded();
        assert!(c.prev_page().is_none());
        assert_eq!(c.current_page(), 1);
    }

    #[test]
    fn prev_page_decrements() {
        let mut c = loaded();
        c.next_page();
        let req = c.prev_page().unwrap();
        assert_eq!(c.current_page(), 1);
        assert_eq!(req.query.offset, 0);
    }

    #[test]
    fn zero_total_publishes_canonical_empty_page() {
        let mut c = loaded();
        let req = c.refresh();
        assert_eq!(c.apply(&req, Page::empty()), None);
        assert_eq!(c.published(), &Page::empty());
        assert_eq!(c.total_pages(), 0);
        assert!(!c.found_any());
        assert!(c.next_page().is_none());
    }

    #[test]
    fn out_of_range_page_is_clamped_and_refetched() {
        let mut c = loaded();
        c.next_page();
        let req = c.next_page().unwrap();
        let refetch = c.apply(&req, page(41..=45, 25)).unwrap();
        assert_eq!(c.current_page(), 2);
        assert_eq!(c.total_pages(), 2);
        assert_eq!(refetch.query.offset, 20);
        assert!(refetch.seq > req.seq);
        assert_eq!(c.apply(&refetch, page(21..=25, 25)), None);
        assert_eq!(ids(&c), vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn delete_hides_and_decrements_total() {
        let mut c = controller();
        let req = c.init();
        c.apply(&req, page(1..=1, 1));
        assert!(c.delete(1));
        assert!(c.overlay().is_deleted(1));
        assert!(c.published().characters.is_empty());
        assert_eq!(c.published().total, 0);
    }

    #[test]
    fn deleted_character_stays_hidden_after_refresh() {
        let mut c = loaded();
        c.delete(3);
        assert_eq!(c.published().total, 99);
        let req = c.refresh();
        c.apply(&req, page(1..=20, 100));
        assert!(!ids(&c).contains(&3));
        assert_eq!(c.published().characters.len(), 19);
    }

    #[test]
    fn deleting_an_unlisted_character_only_tombstones() {
        let mut c = loaded();
        assert!(!c.delete(999));
        assert!(c.overlay().is_deleted(999));
        assert_eq!(c.published().total, 100);
    }

    #[test]
    fn rename_is_immediate_and_survives_refresh() {
        let mut c = controller();
        let req = c.init();
        c.apply(
            &req,
            Page {
                characters: vec![character(1, "Spider-Man")],
                total: 1,
            },
        );
        c.rename(1, "Super Spider-Man");
        assert_eq!(c.character(1).unwrap().name, "Super Spider-Man");

        let req = c.refresh();
        c.apply(
            &req,
            Page {
                characters: vec![character(1, "Spider-Man")],
                total: 1,
            },
        );
        assert_eq!(c.character(1).unwrap().name, "Super Spider-Man");
        assert_eq!(
            c.overlay().patch(1).and_then(|p| p.name.as_deref()),
            Some("Super Spider-Man")
        );
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut c = loaded();
        let first = c.next_page().unwrap();
        let second = c.next_page().unwrap();
        assert_eq!(c.apply(&second, page(41..=60, 100)), None);
        assert_eq!(c.apply(&first, page(21..=40, 100)), None);
        assert_eq!(ids(&c)[0], 41);
    }

    #[test]
    fn settled_search_refreshes_with_prefix_and_keeps_page() {
        let mut c = loaded();
        c.next_page();
        let t0 = Instant::now();
        c.search_input("Spi", t0);
        assert!(c.poll_search(t0 + Duration::from_millis(100)).is_none());
        let req = c.poll_search(t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(c.search(), "Spi");
        assert_eq!(req.query.name_starts_with.as_deref(), Some("Spi"));
        assert_eq!(req.query.offset, 20);
    }

    #[test]
    fn search_can_reset_to_first_page() {
        let mut c = ListController::new(ListConfig {
            reset_page_on_search: true,
            ..ListConfig::default()
        })
        .unwrap();
        let req = c.init();
        c.apply(&req, page(1..=20, 100));
        c.next_page();
        let t0 = Instant::now();
        c.search_input("Hulk", t0);
        let req = c.poll_search(t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(c.current_page(), 1);
        assert_eq!(req.query.offset, 0);
    }

    #[test]
    fn later_fetches_use_settled_search() {
        let mut c = loaded();
        let t0 = Instant::now();
        c.search_input("Thor", t0);
        let req = c.poll_search(t0 + Duration::from_millis(300)).unwrap();
        c.apply(&req, page(1..=20, 60));
        let req = c.next_page().unwrap();
        assert_eq!(req.query.name_starts_with.as_deref(), Some("Thor"));
    }

    #[test]
    fn resolve_applies_dialog_outcomes() {
        let mut c = loaded();
        c.resolve(1, DialogOutcome::Save("Renamed".into()));
        assert_eq!(c.character(1).unwrap().name, "Renamed");
        c.resolve(2, DialogOutcome::Cancel);
        assert!(c.character(2).is_some());
        c.resolve(2, DialogOutcome::Delete);
        assert!(c.character(2).is_none());
    }

    #[test]
    fn review_presents_published_characters_only() {
        let mut c = loaded();
        let mut dialog = Scripted(Some(DialogOutcome::Delete), Vec::new());
        assert_eq!(c.review(5, &mut dialog), Some(DialogOutcome::Delete));
        assert_eq!(dialog.1, vec![5]);
        assert!(c.character(5).is_none());
        assert_eq!(c.review(5, &mut dialog), None);
    }

    #[test]
    fn visible_range_clamps_to_total() {
        let mut c = controller();
        let req = c.init();
        c.apply(&req, page(1..=20, 45));
        c.next_page();
        let req = c.next_page().unwrap();
        c.apply(&req, page(41..=45, 45));
        assert_eq!(c.view().visible_range(), Some((41, 45)));
    }

    #[test]
    fn visible_range_is_none_when_empty() {
        let mut c = controller();
        let req = c.init();
        c.apply(&req, Page::empty());
        assert_eq!(c.view().visible_range(), None);
    }

    #[test]
    fn zero_page_size_is_refused() {
        let result = ListController::new(ListConfig {
            page_size: 0,
            ..ListConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidPageSize(0))));
    }

    #[test]
    fn init_with_search_filters_the_first_fetch() {
        let mut c = controller();
        let req = c.init_with_search("Spi");
        assert_eq!(req.query.offset, 0);
        assert_eq!(req.query.name_starts_with.as_deref(), Some("Spi"));
        assert_eq!(c.search(), "Spi");
        assert_eq!(c.search_deadline(), None);

        let t0 = Instant::now();
        c.search_input("Spi", t0);
        assert!(c.poll_search(t0 + Duration::from_millis(300)).is_none());
    }
}
