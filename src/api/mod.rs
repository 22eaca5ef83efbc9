// Backend API module.
// Provides the HTTP client and types for the restaurants REST backend.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::ApiClient;
pub use endpoints::RestaurantApi;
pub use types::*;
