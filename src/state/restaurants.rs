// Restaurants tab state management.
// Handles list loading, filter selectors, and selection for the restaurants list.

use ratatui::widgets::ListState;

use crate::api::Restaurant;
use crate::data::{Filter, Origin};

use super::detail::RestaurantDetailState;
use super::navigation::{NavigationStack, ViewLevel};

/// Loading state for async data.
#[derive(Debug, Clone, Default)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// State for a selectable list with keyboard navigation.
#[derive(Debug, Clone)]
pub struct SelectableList<T> {
    pub data: LoadingState<Vec<T>>,
    pub list_state: ListState,
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self {
            data: LoadingState::Idle,
            list_state: ListState::default(),
        }
    }
}

impl<T> SelectableList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Select the next item in the list.
    pub fn select_next(&mut self) {
        if let Some(items) = self.data.data() {
            if items.is_empty() {
                return;
            }
            let i = match self.list_state.selected() {
                Some(i) if i >= items.len() - 1 => i,
                Some(i) => i + 1,
                None => 0,
            };
            self.list_state.select(Some(i));
        }
    }

    /// Select the previous item in the list.
    pub fn select_prev(&mut self) {
        if let Some(items) = self.data.data() {
            if items.is_empty() {
                return;
            }
            let i = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
            self.list_state.select(Some(i));
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        let index = self.list_state.selected()?;
        self.data.data()?.get(index)
    }

    /// Reset selection to first item.
    pub fn reset_selection(&mut self) {
        let has_items = self.data.data().is_some_and(|items| !items.is_empty());
        self.list_state.select(if has_items { Some(0) } else { None });
    }

    pub fn set_loaded(&mut self, items: Vec<T>) {
        self.data = LoadingState::Loaded(items);
        self.reset_selection();
    }

    pub fn set_loading(&mut self) {
        self.data = LoadingState::Loading;
    }

    pub fn set_error(&mut self, error: String) {
        self.data = LoadingState::Error(error);
    }
}

/// A selector whose first option is `All`, followed by known values.
#[derive(Debug, Clone, Default)]
pub struct FilterSelector {
    options: Vec<String>,
    /// 0 is `All`; `n` is `options[n - 1]`.
    index: usize,
}

impl FilterSelector {
    /// Replace the options, keeping the current choice when it still exists.
    pub fn set_options(&mut self, options: Vec<String>) {
        let current = self.filter();
        self.options = options;
        self.index = match current {
            Filter::Only(value) => self
                .options
                .iter()
                .position(|o| *o == value)
                .map_or(0, |i| i + 1),
            Filter::All => 0,
        };
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn filter(&self) -> Filter {
        match self.index {
            0 => Filter::All,
            n => self
                .options
                .get(n - 1)
                .map_or(Filter::All, |value| Filter::Only(value.clone())),
        }
    }

    /// Label of the current choice.
    pub fn label(&self) -> &str {
        match self.index {
            0 => "All",
            n => self.options.get(n - 1).map_or("All", String::as_str),
        }
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % (self.options.len() + 1);
    }

    pub fn prev(&mut self) {
        let len = self.options.len() + 1;
        self.index = (self.index + len - 1) % len;
    }
}

/// Complete state for the restaurants tab.
#[derive(Debug, Default)]
pub struct RestaurantsTabState {
    /// Navigation stack for breadcrumb trail.
    pub nav: NavigationStack,
    /// Restaurants matching the current filters.
    pub restaurants: SelectableList<Restaurant>,
    pub neighborhoods: FilterSelector,
    pub cuisines: FilterSelector,
    /// Where the current list came from.
    pub origin: Option<Origin>,
    /// Incremented per list query; stale results are dropped.
    pub generation: u64,
    /// Detail view, present while a restaurant is open.
    pub detail: Option<RestaurantDetailState>,
}

impl RestaurantsTabState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_view(&self) -> &ViewLevel {
        self.nav.current()
    }

    /// Start a new list query and return its generation.
    pub fn begin_query(&mut self) -> u64 {
        self.generation += 1;
        if !self.restaurants.data.is_loaded() {
            self.restaurants.set_loading();
        }
        self.generation
    }

    /// Apply a finished query if it is still the latest one.
    pub fn finish_query(
        &mut self,
        generation: u64,
        result: Result<(Vec<Restaurant>, Origin), String>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        match result {
            Ok((restaurants, origin)) => {
                self.restaurants.set_loaded(restaurants);
                self.origin = Some(origin);
            }
            Err(e) => self.restaurants.set_error(e),
        }
        true
    }

    /// Open the selected restaurant.
    pub fn open_selected(&mut self) -> Option<&RestaurantDetailState> {
        let restaurant = self.restaurants.selected_item()?.clone();
        self.nav.push(ViewLevel::Restaurant {
            id: restaurant.id,
            name: restaurant.name.clone(),
        });
        self.detail = Some(RestaurantDetailState::new(restaurant));
        self.detail.as_ref()
    }

    /// Navigate back (Escape key).
    pub fn go_back(&mut self) -> bool {
        let popped = self.nav.pop();
        if popped {
            self.detail = None;
        }
        popped
    }

    /// Replace a restaurant everywhere it is shown.
    pub fn update_restaurant(&mut self, updated: &Restaurant) {
        if let LoadingState::Loaded(items) = &mut self.restaurants.data {
            for item in items.iter_mut().filter(|r| r.id == updated.id) {
                *item = updated.clone();
            }
        }
        if let Some(detail) = &mut self.detail {
            if detail.restaurant.id == updated.id {
                detail.restaurant = updated.clone();
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.nav.current() {
            ViewLevel::Restaurants => self.restaurants.select_prev(),
            ViewLevel::Restaurant { .. } => {
                if let Some(detail) = &mut self.detail {
                    detail.reviews.select_prev();
                }
            }
        }
    }

    pub fn select_next(&mut self) {
        match self.nav.current() {
            ViewLevel::Restaurants => self.restaurants.select_next(),
            ViewLevel::Restaurant { .. } => {
                if let Some(detail) = &mut self.detail {
                    detail.reviews.select_next();
                }
            }
        }
    }
}
