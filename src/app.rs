// App state and main event loop.
// Manages tabs, navigation state, keyboard input, and results of background work.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{NewReview, Restaurant, Review};
use crate::assets::{AssetWorker, FetchOutcome};
use crate::data::{DataSource, Filter, Loaded, Origin, image_url_for_restaurant};
use crate::offline::{RetryEvent, RetryPoller};
use crate::state::{ConsoleState, FormField, RestaurantsTabState, ViewLevel};
use crate::ui;

pub const REVIEW_POSTED: &str = "Review is posted.";
pub const REVIEW_QUEUED: &str =
    "Connection problem. Review will be posted after successful connection to the internet.";
pub const SENDING_REVIEW: &str = "Sending review.";

/// Active tab in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Restaurants,
    Console,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Restaurants => "Restaurants",
            Tab::Console => "Console",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Restaurants => Tab::Console,
            Tab::Console => Tab::Restaurants,
        }
    }

    pub fn prev(&self) -> Self {
        self.next()
    }
}

/// Results of background work, delivered to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    Restaurants {
        generation: u64,
        result: Result<Loaded<Vec<Restaurant>>, String>,
    },
    Filters {
        neighborhoods: Vec<String>,
        cuisines: Vec<String>,
    },
    Restaurant(Result<Loaded<Restaurant>, String>),
    Reviews {
        restaurant_id: u64,
        result: Result<Loaded<Vec<Review>>, String>,
    },
    ReviewPosted {
        restaurant_id: u64,
        result: Result<Review, String>,
    },
    ReviewQueued {
        restaurant_id: u64,
        result: Result<(), String>,
    },
    Favorite(Result<Restaurant, String>),
    ImageCached {
        restaurant_id: u64,
        cached: bool,
    },
    Retry(RetryEvent),
}

impl From<RetryEvent> for AppEvent {
    fn from(event: RetryEvent) -> Self {
        AppEvent::Retry(event)
    }
}

/// Main application state.
pub struct App {
    /// Currently active tab.
    pub active_tab: Tab,
    pub restaurants: RestaurantsTabState,
    pub console: ConsoleState,
    /// Message shown in a modal until any key is pressed.
    pub notice: Option<String>,
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
    source: DataSource,
    assets: Option<Arc<AssetWorker>>,
    poller: RetryPoller,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(
        source: DataSource,
        assets: Option<Arc<AssetWorker>>,
        poll_interval: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            active_tab: Tab::default(),
            restaurants: RestaurantsTabState::new(),
            console: ConsoleState::new(),
            notice: None,
            show_help: false,
            should_quit: false,
            poller: RetryPoller::new(source.clone(), poll_interval),
            source,
            assets,
            events_tx,
            events_rx,
        }
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        self.start();
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.drain_events();
            self.handle_input()?;
        }
        self.poller.cancel_all();
        Ok(())
    }

    /// Kick off the initial loads and resume reviews queued in earlier sessions.
    pub fn start(&mut self) {
        match self.poller.resume_pending(&self.events_tx) {
            Ok(0) => {}
            Ok(n) => self
                .console
                .log_info(format!("{} queued review(s) waiting for connectivity", n)),
            Err(e) => self
                .console
                .log_error(format!("Reading queued reviews failed: {}", e)),
        }
        self.load_filters();
        self.load_restaurants();
    }

    fn show_notice(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.console.log_info(message.clone());
        self.notice = Some(message);
    }

    fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.console.log_error(message.clone());
        self.notice = Some(message);
    }

    fn load_filters(&self) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let neighborhoods = source.fetch_neighborhoods().await.unwrap_or_default();
            let cuisines = source.fetch_cuisines().await.unwrap_or_default();
            let _ = tx.send(AppEvent::Filters {
                neighborhoods,
                cuisines,
            });
        });
    }

    /// Re-run the combined filter query.
    fn load_restaurants(&mut self) {
        let generation = self.restaurants.begin_query();
        let cuisine = self.restaurants.cuisines.filter();
        let neighborhood = self.restaurants.neighborhoods.filter();
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match (&cuisine, &neighborhood) {
                (Filter::Only(c), Filter::All) => source.fetch_restaurants_by_cuisine(c).await,
                (Filter::All, Filter::Only(n)) => {
                    source.fetch_restaurants_by_neighborhood(n).await
                }
                _ => {
                    source
                        .fetch_restaurants_by_cuisine_and_neighborhood(&cuisine, &neighborhood)
                        .await
                }
            }
            .map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::Restaurants { generation, result });
        });
    }

    fn load_restaurant(&self, restaurant_id: u64) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source
                .fetch_restaurant_by_id(restaurant_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::Restaurant(result));
        });
    }

    fn load_reviews(&mut self, restaurant_id: u64) {
        if let Some(detail) = &mut self.restaurants.detail {
            if !detail.reviews.data.is_loaded() {
                detail.reviews.set_loading();
            }
        }
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source
                .fetch_reviews(restaurant_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::Reviews {
                restaurant_id,
                result,
            });
        });
    }

    /// Fetch the photograph through the asset cache and report whether it is cached.
    fn load_image(&mut self, restaurant: &Restaurant) {
        let Some(worker) = self.assets.clone() else {
            return;
        };
        let restaurant_id = restaurant.id;
        let path = image_url_for_restaurant(restaurant);
        if let Some(detail) = &mut self.restaurants.detail {
            detail.image_cached = worker.image_cached(&path).ok();
        }
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let cached = match worker.handle_fetch(&path).await {
                Ok(FetchOutcome::Served { response, .. }) => response.is_ok(),
                Ok(FetchOutcome::Passthrough) => false,
                Err(e) => {
                    log::warn!("Loading photograph {} failed: {}", path, e);
                    false
                }
            };
            let _ = tx.send(AppEvent::ImageCached {
                restaurant_id,
                cached,
            });
        });
    }

    fn toggle_favorite(&self) {
        let selected = match self.restaurants.current_view() {
            ViewLevel::Restaurants => self.restaurants.restaurants.selected_item(),
            ViewLevel::Restaurant { .. } => {
                self.restaurants.detail.as_ref().map(|d| &d.restaurant)
            }
        };
        let Some(restaurant) = selected else {
            return;
        };
        let (id, is_favorite) = (restaurant.id, restaurant.is_favorite);
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source
                .put_favorite(id, is_favorite)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::Favorite(result));
        });
    }

    /// Validate the form, then post it or queue it depending on connectivity.
    fn submit_review(&mut self) {
        let Some(detail) = &self.restaurants.detail else {
            return;
        };
        let review = match detail.form.submit(detail.restaurant.id) {
            Ok(review) => review,
            Err(notice) => {
                self.show_notice(notice);
                return;
            }
        };
        self.send_review(review);
    }

    fn send_review(&self, review: NewReview) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        let restaurant_id = review.restaurant_id;
        tokio::spawn(async move {
            let event = if source.is_online().await {
                AppEvent::ReviewPosted {
                    restaurant_id,
                    result: source.post_review(&review).await.map_err(|e| e.to_string()),
                }
            } else {
                AppEvent::ReviewQueued {
                    restaurant_id,
                    result: source.save_review_offline(&review).map_err(|e| e.to_string()),
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Apply every finished background result.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Restaurants { generation, result } => {
                if let Err(e) = &result {
                    self.console.log_error(format!(
                        "Loading restaurants failed: {} (press r to retry)",
                        e
                    ));
                }
                let result = result.map(|loaded| (loaded.data, loaded.origin));
                let from_cache = matches!(result, Ok((_, Origin::Cache)));
                if self.restaurants.finish_query(generation, result) && from_cache {
                    self.console
                        .log_warn("Backend unreachable, showing stored restaurants");
                }
            }
            AppEvent::Filters {
                neighborhoods,
                cuisines,
            } => {
                self.restaurants.neighborhoods.set_options(neighborhoods);
                self.restaurants.cuisines.set_options(cuisines);
            }
            AppEvent::Restaurant(Ok(loaded)) => self.restaurants.update_restaurant(&loaded.data),
            AppEvent::Restaurant(Err(e)) => self.console.log_error(e),
            AppEvent::Reviews {
                restaurant_id,
                result,
            } => {
                let Some(detail) = self.open_detail(restaurant_id) else {
                    return;
                };
                match result {
                    Ok(loaded) => detail.set_reviews(loaded.data, loaded.origin),
                    Err(e) => {
                        detail.reviews.set_error(e.clone());
                        self.console.log_error(format!("Loading reviews failed: {}", e));
                    }
                }
            }
            AppEvent::ReviewPosted {
                restaurant_id,
                result,
            } => match result {
                Ok(review) => self.review_posted(restaurant_id, review),
                Err(e) => self.show_error(format!("Posting review failed: {}", e)),
            },
            AppEvent::ReviewQueued {
                restaurant_id,
                result,
            } => match result {
                Ok(()) => {
                    self.show_notice(REVIEW_QUEUED);
                    if self.poller.is_waiting(restaurant_id) {
                        log::info!("Restarting retry for restaurant {}", restaurant_id);
                    }
                    self.poller.schedule(restaurant_id, self.events_tx.clone());
                    if let Some(detail) = self.open_detail(restaurant_id) {
                        detail.pending = true;
                        detail.editing = false;
                    }
                }
                Err(e) => self.show_error(format!("Saving review offline failed: {}", e)),
            },
            AppEvent::Favorite(Ok(restaurant)) => {
                self.restaurants.update_restaurant(&restaurant);
                self.show_notice(if restaurant.is_favorite {
                    "Restaurant added to favorites"
                } else {
                    "Restaurant removed from favorites"
                });
            }
            AppEvent::Favorite(Err(e)) => {
                self.show_error(format!("Updating favorite failed: {}", e))
            }
            AppEvent::ImageCached {
                restaurant_id,
                cached,
            } => {
                if let Some(detail) = self.open_detail(restaurant_id) {
                    detail.image_cached = Some(cached);
                }
            }
            AppEvent::Retry(RetryEvent::Sending { .. }) => self.show_notice(SENDING_REVIEW),
            AppEvent::Retry(RetryEvent::Posted(review)) => {
                self.review_posted(review.restaurant_id, review)
            }
            AppEvent::Retry(RetryEvent::Failed {
                restaurant_id,
                error,
            }) => {
                if let Some(detail) = self.open_detail(restaurant_id) {
                    detail.pending = false;
                }
                self.show_error(format!(
                    "Queued review for restaurant {} was not posted: {}",
                    restaurant_id, error
                ));
            }
        }
    }

    fn review_posted(&mut self, restaurant_id: u64, review: Review) {
        if let Some(detail) = self.open_detail(restaurant_id) {
            detail.review_posted(review);
        }
        self.show_notice(REVIEW_POSTED);
    }

    /// The detail state, if `restaurant_id` is the one currently open.
    fn open_detail(
        &mut self,
        restaurant_id: u64,
    ) -> Option<&mut crate::state::RestaurantDetailState> {
        self.restaurants
            .detail
            .as_mut()
            .filter(|d| d.restaurant.id == restaurant_id)
    }

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    fn handle_input(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.notice.take().is_some() {
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }
        if self.is_editing() {
            self.handle_form_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => {
                self.active_tab = self.active_tab.next();
                self.clear_console_badge_if_viewing();
            }
            KeyCode::BackTab => {
                self.active_tab = self.active_tab.prev();
                self.clear_console_badge_if_viewing();
            }
            _ => match self.active_tab {
                Tab::Restaurants => self.handle_restaurants_key(key),
                Tab::Console => match key.code {
                    KeyCode::Up | KeyCode::Char('k') => self.console.select_prev(),
                    KeyCode::Down | KeyCode::Char('j') => self.console.select_next(),
                    _ => {}
                },
            },
        }
    }

    fn handle_restaurants_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.restaurants.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.restaurants.select_next(),
            KeyCode::Char('f') => self.toggle_favorite(),
            KeyCode::Esc => {
                self.restaurants.go_back();
            }
            _ => match self.restaurants.current_view().clone() {
                ViewLevel::Restaurants => self.handle_list_key(key),
                ViewLevel::Restaurant { id, .. } => self.handle_detail_key(id, key),
            },
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let Some(detail) = self.restaurants.open_selected() else {
                    return;
                };
                let restaurant = detail.restaurant.clone();
                let pending = match self.source.pending_review(restaurant.id) {
                    Ok(pending) => pending.is_some(),
                    Err(e) => {
                        log::warn!("Reading queued review failed: {}", e);
                        false
                    }
                };
                if let Some(detail) = &mut self.restaurants.detail {
                    detail.pending = pending;
                }
                self.load_reviews(restaurant.id);
                self.load_image(&restaurant);
            }
            KeyCode::Char('n') => {
                self.restaurants.neighborhoods.next();
                self.load_restaurants();
            }
            KeyCode::Char('N') => {
                self.restaurants.neighborhoods.prev();
                self.load_restaurants();
            }
            KeyCode::Char('c') => {
                self.restaurants.cuisines.next();
                self.load_restaurants();
            }
            KeyCode::Char('C') => {
                self.restaurants.cuisines.prev();
                self.load_restaurants();
            }
            KeyCode::Char('r') => {
                self.load_filters();
                self.load_restaurants();
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, restaurant_id: u64, key: KeyEvent) {
        match key.code {
            KeyCode::Char('w') | KeyCode::Enter => {
                if let Some(detail) = &mut self.restaurants.detail {
                    detail.editing = true;
                }
            }
            KeyCode::Char('r') => {
                self.load_restaurant(restaurant_id);
                self.load_reviews(restaurant_id);
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter {
            self.submit_review();
            return;
        }
        let Some(detail) = &mut self.restaurants.detail else {
            return;
        };
        let form = &mut detail.form;
        match key.code {
            KeyCode::Esc => detail.editing = false,
            KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
            KeyCode::BackTab | KeyCode::Up => form.field = form.field.prev(),
            KeyCode::Left if form.field == FormField::Rating => form.cycle_rating(false),
            KeyCode::Right if form.field == FormField::Rating => form.cycle_rating(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input(c),
            _ => {}
        }
    }

    /// Reviews queued offline and not yet sent.
    pub fn queued_reviews(&self) -> usize {
        self.poller.waiting()
    }

    pub fn is_editing(&self) -> bool {
        self.active_tab == Tab::Restaurants
            && self.restaurants.detail.as_ref().is_some_and(|d| d.editing)
    }

    /// Clear console badge when viewing console tab.
    fn clear_console_badge_if_viewing(&mut self) {
        if self.active_tab == Tab::Console {
            self.console.mark_read();
        }
    }
}
