// In-memory fakes for the backend and asset origin, shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::net::TcpListener;

use crate::api::{LatLng, NewReview, Restaurant, RestaurantApi, Review};
use crate::assets::{AssetFetcher, CachedResponse};
use crate::error::{AppError, Result};

pub fn restaurant(id: u64, name: &str, neighborhood: &str, cuisine: &str) -> Restaurant {
    Restaurant {
        id,
        name: name.to_string(),
        neighborhood: neighborhood.to_string(),
        address: format!("{} Main St", id),
        latlng: Some(LatLng {
            lat: 40.7,
            lng: -73.9,
        }),
        cuisine_type: cuisine.to_string(),
        photograph: Some(id.to_string()),
        operating_hours: Default::default(),
        is_favorite: false,
    }
}

pub fn sample_restaurants() -> Vec<Restaurant> {
    vec![
        restaurant(1, "Mission Chinese Food", "Manhattan", "Asian"),
        restaurant(2, "Emily", "Brooklyn", "Pizza"),
        restaurant(3, "Kang Ho Dong Baekjeong", "Manhattan", "Asian"),
        restaurant(4, "Katz's Delicatessen", "Manhattan", "American"),
        restaurant(5, "Roberta's Pizza", "Brooklyn", "Pizza"),
        restaurant(6, "Hometown BBQ", "Brooklyn", "American"),
        restaurant(7, "Superiority Burger", "Manhattan", "American"),
        restaurant(8, "The Dutch", "Manhattan", "American"),
        restaurant(9, "Mu Ramen", "Queens", "Asian"),
        restaurant(10, "Casa Enrique", "Queens", "Mexican"),
    ]
}

pub fn review(restaurant_id: u64, name: &str, rating: u8) -> Review {
    Review {
        id: None,
        restaurant_id,
        name: name.to_string(),
        rating,
        comments: format!("{} says hi", name),
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

/// Base URL of a backend that accepts connections and closes them unanswered.
pub async fn hang_up_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    format!("http://{}", addr)
}

/// Backend fake. While `offline` is set every call fails as unreachable.
#[derive(Default)]
pub struct FakeApi {
    pub restaurants: Mutex<Vec<Restaurant>>,
    pub reviews: Mutex<HashMap<u64, Vec<Review>>>,
    pub offline: AtomicBool,
    pub posted: Mutex<Vec<NewReview>>,
    /// When set, the restaurants endpoint answers 500.
    pub broken_restaurants: AtomicBool,
    /// Restaurants whose reviews endpoint answers 500.
    pub broken_reviews: Mutex<Vec<u64>>,
    next_review_id: AtomicUsize,
}

impl FakeApi {
    pub fn with_restaurants(restaurants: Vec<Restaurant>) -> Self {
        let api = Self::default();
        *api.restaurants.lock().unwrap() = restaurants;
        api
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AppError::Unreachable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RestaurantApi for FakeApi {
    async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        self.check_online()?;
        if self.broken_restaurants.load(Ordering::SeqCst) {
            return Err(AppError::Status {
                status: 500,
                url: "/restaurants".to_string(),
            });
        }
        Ok(self.restaurants.lock().unwrap().clone())
    }

    async fn reviews(&self, restaurant_id: u64) -> Result<Vec<Review>> {
        self.check_online()?;
        if self.broken_reviews.lock().unwrap().contains(&restaurant_id) {
            return Err(AppError::Status {
                status: 500,
                url: format!("/reviews/?restaurant_id={}", restaurant_id),
            });
        }
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&restaurant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_review(&self, new: &NewReview) -> Result<Review> {
        self.check_online()?;
        self.posted.lock().unwrap().push(new.clone());
        let id = self.next_review_id.fetch_add(1, Ordering::SeqCst) as u64 + 100;
        let created = Review {
            id: Some(id),
            restaurant_id: new.restaurant_id,
            name: new.name.clone(),
            rating: new.rating,
            comments: new.comments.clone(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.reviews
            .lock()
            .unwrap()
            .entry(new.restaurant_id)
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn set_favorite(&self, restaurant_id: u64, is_favorite: bool) -> Result<Restaurant> {
        self.check_online()?;
        let mut restaurants = self.restaurants.lock().unwrap();
        let restaurant = restaurants
            .iter_mut()
            .find(|r| r.id == restaurant_id)
            .ok_or_else(|| AppError::NotFound(format!("/restaurants/{}/", restaurant_id)))?;
        restaurant.is_favorite = is_favorite;
        Ok(restaurant.clone())
    }
}

/// Asset origin fake serving fixed bodies and counting requests.
#[derive(Default)]
pub struct FakeOrigin {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub requests: Mutex<Vec<String>>,
    pub offline: AtomicBool,
}

impl FakeOrigin {
    pub fn serve(&self, url: &str, body: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_vec());
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetFetcher for FakeOrigin {
    async fn fetch(&self, url: &str) -> Result<CachedResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Unreachable(url.to_string()));
        }
        match self.files.lock().unwrap().get(url) {
            Some(body) => Ok(CachedResponse::new(url, 200, None, body.clone())),
            None => Ok(CachedResponse::new(url, 404, None, Vec::new())),
        }
    }
}
