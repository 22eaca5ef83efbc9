// Backend endpoint functions.
// Typed access to the restaurants and reviews resources behind a trait seam
// so the data layer can run against a fake backend.

use async_trait::async_trait;

use crate::error::Result;

use super::client::ApiClient;
use super::types::{NewReview, Restaurant, Review};

/// Operations the data layer needs from the backend.
#[async_trait]
pub trait RestaurantApi: Send + Sync {
    /// `GET /restaurants`
    async fn restaurants(&self) -> Result<Vec<Restaurant>>;

    /// `GET /reviews/?restaurant_id=<id>`
    async fn reviews(&self, restaurant_id: u64) -> Result<Vec<Review>>;

    /// `POST /reviews`
    async fn create_review(&self, review: &NewReview) -> Result<Review>;

    /// `PUT /restaurants/<id>/?is_favorite=<bool>`
    async fn set_favorite(&self, restaurant_id: u64, is_favorite: bool) -> Result<Restaurant>;
}

#[async_trait]
impl RestaurantApi for ApiClient {
    async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        let response = self.get("/restaurants").await?;
        let restaurants: Vec<Restaurant> = self.read_json(response).await?;
        Ok(restaurants)
    }

    async fn reviews(&self, restaurant_id: u64) -> Result<Vec<Review>> {
        let params = [("restaurant_id", restaurant_id.to_string())];
        let response = self.get_with_params("/reviews/", &params).await?;
        let reviews: Vec<Review> = self.read_json(response).await?;
        Ok(reviews)
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review> {
        let response = self.post_json("/reviews", review).await?;
        let created: Review = self.read_json(response).await?;
        Ok(created)
    }

    async fn set_favorite(&self, restaurant_id: u64, is_favorite: bool) -> Result<Restaurant> {
        let params = [("is_favorite", is_favorite.to_string())];
        let response = self
            .put_with_params(&format!("/restaurants/{}/", restaurant_id), &params)
            .await?;
        let restaurant: Restaurant = self.read_json(response).await?;
        Ok(restaurant)
    }
}
