// Data-access layer.
// Combines the backend API with the local database: successful reads are
// mirrored into the object stores and read failures fall back to them.

use std::sync::Arc;

use crate::api::{NewReview, Restaurant, RestaurantApi, Review};
use crate::error::{AppError, Result};
use crate::net::Connectivity;
use crate::store::Database;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Network,
    Cache,
}

/// Data together with its origin.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> Loaded<T> {
    fn network(data: T) -> Self {
        Self {
            data,
            origin: Origin::Network,
        }
    }

    fn cache(data: T) -> Self {
        Self {
            data,
            origin: Origin::Cache,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            data: f(self.data),
            origin: self.origin,
        }
    }
}

/// A neighborhood or cuisine filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    /// Parse a selector value where `all` disables filtering.
    pub fn from_value(value: &str) -> Self {
        if value == "all" {
            Filter::All
        } else {
            Filter::Only(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

/// Restaurants matching both filters, in input order.
pub fn filter_restaurants(
    restaurants: &[Restaurant],
    cuisine: &Filter,
    neighborhood: &Filter,
) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|r| cuisine.matches(&r.cuisine_type) && neighborhood.matches(&r.neighborhood))
        .cloned()
        .collect()
}

/// Distinct values of `field` in first-seen order.
fn distinct<'a>(
    restaurants: &'a [Restaurant],
    field: impl Fn(&'a Restaurant) -> &'a str,
) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in restaurants.iter().map(field) {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

pub fn distinct_neighborhoods(restaurants: &[Restaurant]) -> Vec<String> {
    distinct(restaurants, |r| r.neighborhood.as_str())
}

pub fn distinct_cuisines(restaurants: &[Restaurant]) -> Vec<String> {
    distinct(restaurants, |r| r.cuisine_type.as_str())
}

/// Path of a restaurant's photograph on the asset origin.
pub fn image_url_for_restaurant(restaurant: &Restaurant) -> String {
    match &restaurant.photograph {
        Some(photo) => format!("/img/{}.jpg", photo),
        None => "/img/placeholder.jpg".to_string(),
    }
}

/// Page URL of a restaurant on the web front end.
pub fn url_for_restaurant(restaurant: &Restaurant) -> String {
    format!("./restaurant.html?id={}", restaurant.id)
}

/// Backend access with local mirroring.
#[derive(Clone)]
pub struct DataSource {
    api: Arc<dyn RestaurantApi>,
    db: Database,
    connectivity: Arc<dyn Connectivity>,
}

impl DataSource {
    pub fn new(
        api: Arc<dyn RestaurantApi>,
        db: Database,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            api,
            db,
            connectivity,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn is_online(&self) -> bool {
        self.connectivity.is_online().await
    }

    /// Fetch all restaurants, mirroring them locally.
    /// Falls back to the local copy when the backend fails, unless that copy is empty.
    pub async fn fetch_restaurants(&self) -> Result<Loaded<Vec<Restaurant>>> {
        match self.api.restaurants().await {
            Ok(restaurants) => {
                for restaurant in &restaurants {
                    if let Err(e) = self.db.restaurants.put(restaurant.id, restaurant) {
                        log::warn!("Failed to store restaurant {}: {}", restaurant.id, e);
                    }
                }
                log::debug!("Fetched {} restaurants", restaurants.len());
                Ok(Loaded::network(restaurants))
            }
            Err(e) => {
                let cached = self.db.restaurants.get_all()?;
                if cached.is_empty() {
                    log::error!("Fetching restaurants failed with no local copy: {}", e);
                    return Err(e);
                }
                log::warn!(
                    "Fetching restaurants failed, using {} stored: {}",
                    cached.len(),
                    e
                );
                Ok(Loaded::cache(cached))
            }
        }
    }

    pub async fn fetch_restaurant_by_id(&self, id: u64) -> Result<Loaded<Restaurant>> {
        let loaded = self.fetch_restaurants().await?;
        let origin = loaded.origin;
        loaded
            .data
            .into_iter()
            .find(|r| r.id == id)
            .map(|data| Loaded { data, origin })
            .ok_or(AppError::RestaurantNotFound(id))
    }

    pub async fn fetch_restaurants_by_cuisine(
        &self,
        cuisine: &str,
    ) -> Result<Loaded<Vec<Restaurant>>> {
        self.fetch_restaurants_by_cuisine_and_neighborhood(
            &Filter::Only(cuisine.to_string()),
            &Filter::All,
        )
        .await
    }

    pub async fn fetch_restaurants_by_neighborhood(
        &self,
        neighborhood: &str,
    ) -> Result<Loaded<Vec<Restaurant>>> {
        self.fetch_restaurants_by_cuisine_and_neighborhood(
            &Filter::All,
            &Filter::Only(neighborhood.to_string()),
        )
        .await
    }

    pub async fn fetch_restaurants_by_cuisine_and_neighborhood(
        &self,
        cuisine: &Filter,
        neighborhood: &Filter,
    ) -> Result<Loaded<Vec<Restaurant>>> {
        Ok(self
            .fetch_restaurants()
            .await?
            .map(|all| filter_restaurants(&all, cuisine, neighborhood)))
    }

    pub async fn fetch_neighborhoods(&self) -> Result<Vec<String>> {
        Ok(distinct_neighborhoods(&self.fetch_restaurants().await?.data))
    }

    pub async fn fetch_cuisines(&self) -> Result<Vec<String>> {
        Ok(distinct_cuisines(&self.fetch_restaurants().await?.data))
    }

    /// Stored reviews for a restaurant, empty when none were mirrored.
    pub fn cached_reviews(&self, restaurant_id: u64) -> Result<Vec<Review>> {
        Ok(self.db.reviews.get(restaurant_id)?.unwrap_or_default())
    }

    /// Fetch reviews for a restaurant.
    /// Offline, or when the backend is unreachable, the stored record is returned.
    pub async fn fetch_reviews(&self, restaurant_id: u64) -> Result<Loaded<Vec<Review>>> {
        if !self.connectivity.is_online().await {
            log::info!("Offline, using stored reviews for restaurant {}", restaurant_id);
            return Ok(Loaded::cache(self.cached_reviews(restaurant_id)?));
        }

        match self.api.reviews(restaurant_id).await {
            Ok(reviews) => {
                if let Err(e) = self.db.reviews.put(restaurant_id, &reviews) {
                    log::warn!(
                        "Failed to store reviews for restaurant {}: {}",
                        restaurant_id,
                        e
                    );
                }
                Ok(Loaded::network(reviews))
            }
            Err(e) if e.is_network() => {
                log::warn!(
                    "Fetching reviews for restaurant {} failed, using stored: {}",
                    restaurant_id,
                    e
                );
                Ok(Loaded::cache(self.cached_reviews(restaurant_id)?))
            }
            Err(e) => Err(e),
        }
    }

    /// Post a review and add it to the restaurant's stored record.
    pub async fn post_review(&self, review: &NewReview) -> Result<Review> {
        let created = self.api.create_review(review).await?;
        log::info!(
            "Posted review by {} for restaurant {}",
            created.name,
            created.restaurant_id
        );

        match self.db.reviews.get(created.restaurant_id) {
            Ok(stored) => {
                let mut cached = stored.unwrap_or_default();
                cached.push(created.clone());
                if let Err(e) = self.db.reviews.put(created.restaurant_id, &cached) {
                    log::warn!("Failed to store posted review: {}", e);
                }
            }
            Err(e) => log::warn!(
                "Stored reviews for restaurant {} unreadable, not updating them: {}",
                created.restaurant_id,
                e
            ),
        }

        Ok(created)
    }

    /// Keep a review locally until it can be posted. Replaces any review
    /// already pending for the same restaurant.
    pub fn save_review_offline(&self, review: &NewReview) -> Result<()> {
        if self.db.offline_reviews.get(review.restaurant_id)?.is_some() {
            log::warn!(
                "Replacing pending review for restaurant {}",
                review.restaurant_id
            );
        }
        self.db.offline_reviews.put(review.restaurant_id, review)?;
        log::info!("Saved review for restaurant {} offline", review.restaurant_id);
        Ok(())
    }

    pub fn pending_review(&self, restaurant_id: u64) -> Result<Option<NewReview>> {
        self.db.offline_reviews.get(restaurant_id)
    }

    pub fn pending_reviews(&self) -> Result<Vec<NewReview>> {
        self.db.offline_reviews.get_all()
    }

    /// Post the pending review for a restaurant and remove it from the queue.
    pub async fn post_review_offline(&self, restaurant_id: u64) -> Result<Review> {
        let pending = self
            .db
            .offline_reviews
            .get(restaurant_id)?
            .ok_or(AppError::NoPendingReview(restaurant_id))?;
        let created = self.post_review(&pending).await?;
        self.db.offline_reviews.delete(restaurant_id)?;
        Ok(created)
    }

    /// Flip a restaurant's favorite flag on the backend and store the result.
    pub async fn put_favorite(
        &self,
        restaurant_id: u64,
        currently_favorite: bool,
    ) -> Result<Restaurant> {
        let updated = self
            .api
            .set_favorite(restaurant_id, !currently_favorite)
            .await?;
        self.db.restaurants.put(updated.id, &updated)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::OnlineFlag;
    use crate::api::ApiClient;
    use crate::store::database::REVIEWS_STORE;
    use crate::store::paths::{record_path, store_dir};
    use crate::testing::{FakeApi, hang_up_server, review, sample_restaurants};
    use tempfile::TempDir;

    fn source(api: Arc<FakeApi>, online: &OnlineFlag) -> (DataSource, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path()).unwrap();
        (
            DataSource::new(api, db, Arc::new(online.clone())),
            temp_dir,
        )
    }

    fn ids(restaurants: &[Restaurant]) -> Vec<u64> {
        restaurants.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_filter_by_cuisine_and_neighborhood() {
        let all = sample_restaurants();

        let asian = filter_restaurants(&all, &Filter::from_value("Asian"), &Filter::All);
        assert_eq!(ids(&asian), vec![1, 3, 9]);

        let brooklyn = filter_restaurants(&all, &Filter::All, &Filter::from_value("Brooklyn"));
        assert_eq!(ids(&brooklyn), vec![2, 5, 6]);

        let both = filter_restaurants(
            &all,
            &Filter::from_value("American"),
            &Filter::from_value("Manhattan"),
        );
        assert_eq!(ids(&both), vec![4, 7, 8]);

        let none = filter_restaurants(
            &all,
            &Filter::from_value("Mexican"),
            &Filter::from_value("Brooklyn"),
        );
        assert!(none.is_empty());

        let everything = filter_restaurants(&all, &Filter::from_value("all"), &Filter::All);
        assert_eq!(everything.len(), all.len());
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let all = sample_restaurants();
        assert_eq!(
            distinct_neighborhoods(&all),
            vec!["Manhattan", "Brooklyn", "Queens"]
        );
        assert_eq!(
            distinct_cuisines(&all),
            vec!["Asian", "Pizza", "American", "Mexican"]
        );
    }

    #[test]
    fn test_urls() {
        let mut restaurant = sample_restaurants().remove(0);
        assert_eq!(image_url_for_restaurant(&restaurant), "/img/1.jpg");
        assert_eq!(url_for_restaurant(&restaurant), "./restaurant.html?id=1");
        restaurant.photograph = None;
        assert_eq!(image_url_for_restaurant(&restaurant), "/img/placeholder.jpg");
    }

    #[tokio::test]
    async fn test_fetch_restaurants_mirrors_and_falls_back() {
        let api = Arc::new(FakeApi::with_restaurants(sample_restaurants()));
        let online = OnlineFlag::new(true);
        let (source, _dir) = source(api.clone(), &online);

        let loaded = source.fetch_restaurants().await.unwrap();
        assert_eq!(loaded.origin, Origin::Network);
        assert_eq!(source.db().restaurants.keys().unwrap().len(), 10);

        api.set_offline(true);
        let loaded = source.fetch_restaurants().await.unwrap();
        assert_eq!(loaded.origin, Origin::Cache);
        assert_eq!(ids(&loaded.data), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fetch_restaurants_fails_without_local_copy() {
        let api = Arc::new(FakeApi::with_restaurants(sample_restaurants()));
        api.set_offline(true);
        let (source, _dir) = source(api, &OnlineFlag::new(false));

        let err = source.fetch_restaurants().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_fetch_restaurant_by_id() {
        let api = Arc::new(FakeApi::with_restaurants(sample_restaurants()));
        let (source, _dir) = source(api, &OnlineFlag::new(true));

        let found = source.fetch_restaurant_by_id(4).await.unwrap();
        assert_eq!(found.data.name, "Katz's Delicatessen");

        let missing = source.fetch_restaurant_by_id(42).await;
        assert!(matches!(missing, Err(AppError::RestaurantNotFound(42))));
    }

    #[tokio::test]
    async fn test_filtered_fetches() {
        let api = Arc::new(FakeApi::with_restaurants(sample_restaurants()));
        let (source, _dir) = source(api, &OnlineFlag::new(true));

        let pizza = source.fetch_restaurants_by_cuisine("Pizza").await.unwrap();
        assert_eq!(ids(&pizza.data), vec![2, 5]);

        let queens = source
            .fetch_restaurants_by_neighborhood("Queens")
            .await
            .unwrap();
        assert_eq!(ids(&queens.data), vec![9, 10]);

        assert_eq!(source.fetch_cuisines().await.unwrap().len(), 4);
        assert_eq!(source.fetch_neighborhoods().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_reviews_offline_uses_record_for_restaurant() {
        let api = Arc::new(FakeApi::default());
        api.reviews
            .lock()
            .unwrap()
            .insert(1, vec![review(1, "Steve", 4)]);
        api.reviews
            .lock()
            .unwrap()
            .insert(2, vec![review(2, "Morgan", 5), review(2, "Jack", 3)]);
        let online = OnlineFlag::new(true);
        let (source, _dir) = source(api, &online);

        source.fetch_reviews(1).await.unwrap();
        let loaded = source.fetch_reviews(2).await.unwrap();
        assert_eq!(loaded.origin, Origin::Network);

        online.set(false);
        let cached = source.fetch_reviews(2).await.unwrap();
        assert_eq!(cached.origin, Origin::Cache);
        assert_eq!(cached.data.len(), 2);
        assert_eq!(cached.data[0].name, "Morgan");

        let unknown = source.fetch_reviews(3).await.unwrap();
        assert!(unknown.data.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reviews_unreachable_falls_back() {
        let api = Arc::new(FakeApi::default());
        api.reviews
            .lock()
            .unwrap()
            .insert(5, vec![review(5, "Ann", 2)]);
        let (source, _dir) = source(api.clone(), &OnlineFlag::new(true));

        source.fetch_reviews(5).await.unwrap();
        api.set_offline(true);
        let loaded = source.fetch_reviews(5).await.unwrap();
        assert_eq!(loaded.origin, Origin::Cache);
        assert_eq!(loaded.data[0].name, "Ann");
    }

    #[tokio::test]
    async fn test_post_review_mirrors_into_record() {
        let api = Arc::new(FakeApi::default());
        let (source, _dir) = source(api.clone(), &OnlineFlag::new(true));

        let new = NewReview::new(6, "Dana", 5, "Brisket!").unwrap();
        let created = source.post_review(&new).await.unwrap();
        assert_eq!(created.restaurant_id, 6);
        assert!(created.id.is_some());

        let cached = source.cached_reviews(6).unwrap();
        assert_eq!(cached, vec![created]);
        assert_eq!(api.posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_post_review_keeps_unreadable_record() {
        let api = Arc::new(FakeApi::default());
        let (source, dir) = source(api, &OnlineFlag::new(true));

        let reviews_dir = store_dir(dir.path(), REVIEWS_STORE);
        let record = record_path(&reviews_dir, 6);
        std::fs::create_dir_all(&reviews_dir).unwrap();
        std::fs::write(&record, "{not json").unwrap();

        let new = NewReview::new(6, "Dana", 5, "Brisket!").unwrap();
        source.post_review(&new).await.unwrap();
        assert_eq!(std::fs::read_to_string(&record).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_fetch_reviews_dropped_connection_falls_back() {
        let api = Arc::new(ApiClient::new(&hang_up_server().await).unwrap());
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path()).unwrap();
        db.reviews.put(1, &vec![review(1, "Steve", 4)]).unwrap();
        let source = DataSource::new(api, db, Arc::new(OnlineFlag::new(true)));

        let loaded = source.fetch_reviews(1).await.unwrap();
        assert_eq!(loaded.origin, Origin::Cache);
        assert_eq!(loaded.data[0].name, "Steve");
    }

    #[tokio::test]
    async fn test_reviews_record_last_write_wins() {
        let api = Arc::new(FakeApi::default());
        api.reviews
            .lock()
            .unwrap()
            .insert(8, vec![review(8, "Old", 1)]);
        let (source, _dir) = source(api.clone(), &OnlineFlag::new(true));

        source.fetch_reviews(8).await.unwrap();
        api.reviews
            .lock()
            .unwrap()
            .insert(8, vec![review(8, "New", 5)]);
        source.fetch_reviews(8).await.unwrap();

        let cached = source.cached_reviews(8).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].name, "New");
    }

    #[tokio::test]
    async fn test_offline_review_roundtrip() {
        let api = Arc::new(FakeApi::default());
        let (source, _dir) = source(api.clone(), &OnlineFlag::new(false));

        let first = NewReview::new(3, "Kim", 2, "Slow").unwrap();
        let second = NewReview::new(3, "Kim", 4, "Better second time").unwrap();
        source.save_review_offline(&first).unwrap();
        source.save_review_offline(&second).unwrap();
        assert_eq!(source.pending_review(3).unwrap(), Some(second.clone()));
        assert_eq!(source.pending_reviews().unwrap().len(), 1);

        let created = source.post_review_offline(3).await.unwrap();
        assert_eq!(created.comments, "Better second time");
        assert!(source.pending_review(3).unwrap().is_none());

        let again = source.post_review_offline(3).await;
        assert!(matches!(again, Err(AppError::NoPendingReview(3))));
    }

    #[tokio::test]
    async fn test_offline_review_kept_when_post_fails() {
        let api = Arc::new(FakeApi::default());
        api.set_offline(true);
        let (source, _dir) = source(api, &OnlineFlag::new(true));

        let pending = NewReview::new(2, "Lee", 5, "Crust").unwrap();
        source.save_review_offline(&pending).unwrap();

        assert!(source.post_review_offline(2).await.is_err());
        assert_eq!(source.pending_review(2).unwrap(), Some(pending));
    }

    #[tokio::test]
    async fn test_put_favorite_flips_and_persists() {
        let api = Arc::new(FakeApi::with_restaurants(sample_restaurants()));
        let (source, _dir) = source(api, &OnlineFlag::new(true));
        source.fetch_restaurants().await.unwrap();

        let updated = source.put_favorite(2, false).await.unwrap();
        assert!(updated.is_favorite);
        let stored = source.db().restaurants.get(2).unwrap().unwrap();
        assert!(stored.is_favorite);

        let updated = source.put_favorite(2, true).await.unwrap();
        assert!(!updated.is_favorite);
        assert!(!source.db().restaurants.get(2).unwrap().unwrap().is_favorite);
    }
}
