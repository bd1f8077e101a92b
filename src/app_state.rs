// Application state: the read-only fake items database

use std::sync::Arc;

use crate::models::FakeItem;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    items: Vec<FakeItem>,
}

impl AppState {
    pub fn new() -> Self {
        let items = ["Foo", "Bar", "Baz"]
            .into_iter()
            .map(|name| FakeItem {
                item_name: name.to_string(),
            })
            .collect();
        Self { items }
    }

    pub fn shared() -> SharedState {
        Arc::new(Self::new())
    }

    /// `items[skip : skip + limit]` with negative indices counted from the
    /// end and out-of-range bounds clamped
    pub fn page(&self, skip: i64, limit: i64) -> &[FakeItem] {
        let len = self.items.len() as i64;
        let clamp = |index: i64| -> usize {
            let index = if index < 0 { index + len } else { index };
            index.clamp(0, len) as usize
        };

        let start = clamp(skip);
        let stop = clamp(skip.saturating_add(limit));
        if stop <= start {
            return &[];
        }
        &self.items[start..stop]
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[FakeItem]) -> Vec<&str> {
        items.iter().map(|i| i.item_name.as_str()).collect()
    }

    #[test]
    fn test_default_page_returns_everything() {
        let state = AppState::new();
        assert_eq!(names(state.page(0, 10)), vec!["Foo", "Bar", "Baz"]);
    }

    #[test]
    fn test_page_window() {
        let state = AppState::new();
        assert_eq!(names(state.page(1, 1)), vec!["Bar"]);
        assert_eq!(names(state.page(2, 5)), vec!["Baz"]);
        assert!(state.page(3, 10).is_empty());
        assert!(state.page(0, 0).is_empty());
    }

    #[test]
    fn test_page_negative_indices_count_from_end() {
        let state = AppState::new();
        assert_eq!(names(state.page(-2, 10)), vec!["Bar", "Baz"]);
        // stop = -1 + 1 = 0, which is before start
        assert!(state.page(-1, 1).is_empty());
        assert_eq!(names(state.page(0, -1)), vec!["Foo", "Bar"]);
        assert_eq!(names(state.page(-10, 8)), vec!["Foo"]);
    }

    #[test]
    fn test_page_does_not_overflow() {
        let state = AppState::new();
        assert_eq!(names(state.page(1, i64::MAX)), vec!["Bar", "Baz"]);
    }
}
