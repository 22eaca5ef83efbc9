// Restaurant detail state.
// Reviews for one restaurant and the review form.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::{NewReview, Restaurant, Review};
use crate::data::Origin;

use super::restaurants::{LoadingState, SelectableList};

pub const RATE_PROMPT: &str = "Rate restaurant";
pub const NO_REVIEWS: &str = "No reviews yet. Be the first one!";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Remove anything that looks like an HTML tag.
pub fn strip_html_tags(input: &str) -> String {
    HTML_TAG.replace_all(input, "").into_owned()
}

/// Newest first; reviews without a timestamp (not yet posted) go last.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| {
        let a = a.updated_at.or(a.created_at);
        let b = b.updated_at.or(b.created_at);
        b.cmp(&a)
    });
}

/// Field of the review form that receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Comments,
    Rating,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Comments,
            FormField::Comments => FormField::Rating,
            FormField::Rating => FormField::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Rating,
            FormField::Comments => FormField::Name,
            FormField::Rating => FormField::Comments,
        }
    }
}

/// Review form contents. A rating of `None` is shown as `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    pub name: String,
    pub comments: String,
    pub rating: Option<u8>,
    pub field: FormField,
}

impl ReviewDraft {
    pub fn rating_label(&self) -> String {
        self.rating.map_or_else(|| "*".to_string(), |r| r.to_string())
    }

    /// Type a character into the focused field. Digits set the rating.
    pub fn input(&mut self, c: char) {
        match self.field {
            FormField::Name => self.name.push(c),
            FormField::Comments => self.comments.push(c),
            FormField::Rating => match c {
                '1'..='5' => self.rating = c.to_digit(10).map(|d| d as u8),
                '*' | '0' => self.rating = None,
                _ => {}
            },
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Comments => {
                self.comments.pop();
            }
            FormField::Rating => self.rating = None,
        }
    }

    /// Step through `*`, 1..=5.
    pub fn cycle_rating(&mut self, up: bool) {
        self.rating = match (self.rating, up) {
            (None, true) => Some(1),
            (Some(5), true) => None,
            (Some(r), true) => Some(r + 1),
            (None, false) => Some(5),
            (Some(1), false) => None,
            (Some(r), false) => Some(r - 1),
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Build the review to send, or the notice explaining why not.
    pub fn submit(&self, restaurant_id: u64) -> Result<NewReview, String> {
        let Some(rating) = self.rating else {
            return Err(RATE_PROMPT.to_string());
        };
        let name = strip_html_tags(&self.name);
        let comments = strip_html_tags(&self.comments);
        NewReview::new(restaurant_id, name.trim(), rating, comments.trim())
            .map_err(|e| e.to_string())
    }
}

/// State of an open restaurant.
#[derive(Debug, Clone)]
pub struct RestaurantDetailState {
    pub restaurant: Restaurant,
    pub reviews: SelectableList<Review>,
    pub reviews_origin: Option<Origin>,
    pub form: ReviewDraft,
    /// Whether keys go to the form instead of the review list.
    pub editing: bool,
    /// A review is queued and waiting for connectivity.
    pub pending: bool,
    /// Whether the photograph is in the image cache, once checked.
    pub image_cached: Option<bool>,
}

impl RestaurantDetailState {
    pub fn new(restaurant: Restaurant) -> Self {
        Self {
            restaurant,
            reviews: SelectableList::new(),
            reviews_origin: None,
            form: ReviewDraft::default(),
            editing: false,
            pending: false,
            image_cached: None,
        }
    }

    pub fn set_reviews(&mut self, mut reviews: Vec<Review>, origin: Origin) {
        sort_newest_first(&mut reviews);
        self.reviews.set_loaded(reviews);
        self.reviews_origin = Some(origin);
    }

    /// Put a freshly posted review at the top and clear the form.
    pub fn review_posted(&mut self, review: Review) {
        let mut reviews = match &mut self.reviews.data {
            LoadingState::Loaded(existing) => std::mem::take(existing),
            _ => Vec::new(),
        };
        reviews.insert(0, review);
        self.reviews.set_loaded(reviews);
        self.form.reset();
        self.editing = false;
        self.pending = false;
    }
}
