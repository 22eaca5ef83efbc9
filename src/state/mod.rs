// State management module.
// Handles navigation, data loading, the review form, and the console log.

pub mod console;
pub mod detail;
pub mod navigation;
pub mod restaurants;

pub use console::{ConsoleLevel, ConsoleMessage, ConsoleState};
pub use detail::{FormField, RestaurantDetailState, ReviewDraft};
pub use navigation::{NavigationStack, ViewLevel};
pub use restaurants::{FilterSelector, LoadingState, RestaurantsTabState, SelectableList};
