//! Forward-only cursor over the chat list, with an in-flight guard.

use ardath_shared::ChatId;

/// Identifies one page subscription of a chat feed.
pub type PageId = u64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum LoadState {
    #[default]
    Idle,
    /// A load was granted but its page subscription is not attached yet.
    Starting,
    InFlight(PageId),
}

/// Tracks the last key seen and whether a page load is pending.
#[derive(Debug, Clone, Default)]
pub struct PageCursor {
    last_key: Option<ChatId>,
    load: LoadState,
}

impl PageCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to load the next page. `None` while a load is pending;
    /// otherwise the key the next page starts after (`Some(None)` for the
    /// first page).
    pub fn begin(&mut self) -> Option<Option<ChatId>> {
        if self.is_loading() {
            return None;
        }
        self.load = LoadState::Starting;
        Some(self.last_key.clone())
    }

    /// The granted load is now backed by page `page`.
    pub fn started(&mut self, page: PageId) {
        if self.load == LoadState::Starting {
            self.load = LoadState::InFlight(page);
        }
    }

    /// The granted load could not start.
    pub fn abort(&mut self) {
        if self.load == LoadState::Starting {
            self.load = LoadState::Idle;
        }
    }

    /// Record that `page` finished its initial load, its window ending at
    /// `last_key`. Returns `true` if this completes the pending load.
    pub fn finish(&mut self, page: PageId, last_key: Option<&ChatId>) -> bool {
        if let Some(key) = last_key {
            if self.last_key.as_ref().map_or(true, |current| key > current) {
                self.last_key = Some(key.clone());
            }
        }
        if self.load == LoadState::InFlight(page) {
            self.load = LoadState::Idle;
            true
        } else {
            false
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load != LoadState::Idle
    }

    pub fn last_key(&self) -> Option<&ChatId> {
        self.last_key.as_ref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_load_in_flight() {
        let mut cursor = PageCursor::new();
        assert_eq!(cursor.begin(), Some(None));
        assert_eq!(cursor.begin(), None);
        cursor.started(0);
        assert_eq!(cursor.begin(), None);

        assert!(cursor.finish(0, Some(&ChatId::from("c2"))));
        assert_eq!(cursor.begin(), Some(Some(ChatId::from("c2"))));
    }

    #[test]
    fn results_from_other_pages_do_not_complete_the_load() {
        let mut cursor = PageCursor::new();
        cursor.begin();
        cursor.started(0);
        cursor.finish(0, Some(&ChatId::from("c2")));

        cursor.begin();
        cursor.started(1);
        assert!(!cursor.finish(0, Some(&ChatId::from("c2"))));
        assert!(cursor.is_loading());
        assert!(cursor.finish(1, Some(&ChatId::from("c4"))));
    }

    #[test]
    fn cursor_only_advances() {
        let mut cursor = PageCursor::new();
        cursor.begin();
        cursor.started(0);
        cursor.finish(0, Some(&ChatId::from("c4")));
        cursor.finish(0, Some(&ChatId::from("c3")));
        assert_eq!(cursor.last_key(), Some(&ChatId::from("c4")));
    }

    #[test]
    fn abort_and_reset() {
        let mut cursor = PageCursor::new();
        cursor.begin();
        cursor.abort();
        assert!(!cursor.is_loading());

        cursor.begin();
        cursor.started(0);
        cursor.finish(0, Some(&ChatId::from("c1")));
        cursor.reset();
        assert_eq!(cursor.last_key(), None);
        assert_eq!(cursor.begin(), Some(None));
    }
}
