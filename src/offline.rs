// Offline review retry.
// Polls connectivity at a fixed interval and posts the pending review on the
// first tick where the backend is reachable.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::api::Review;
use crate::data::DataSource;
use crate::error::Result;

/// Progress of a pending review.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// Connectivity is back and the review is being sent.
    Sending { restaurant_id: u64 },
    /// The review was accepted by the backend and removed from the queue.
    Posted(Review),
    /// Sending failed; the review stays queued.
    Failed { restaurant_id: u64, error: String },
}

/// One polling task per restaurant with a pending review.
pub struct RetryPoller {
    source: DataSource,
    interval: Duration,
    tasks: HashMap<u64, JoinHandle<()>>,
}

impl RetryPoller {
    pub fn new(source: DataSource, interval: Duration) -> Self {
        Self {
            source,
            interval,
            tasks: HashMap::new(),
        }
    }

    /// Start polling for `restaurant_id`, replacing an earlier poller for it.
    pub fn schedule<E>(&mut self, restaurant_id: u64, events: UnboundedSender<E>)
    where
        E: From<RetryEvent> + Send + 'static,
    {
        if let Some(previous) = self.tasks.remove(&restaurant_id) {
            previous.abort();
        }

        let source = self.source.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            poll_until_online(source, restaurant_id, interval, events).await;
        });
        self.tasks.insert(restaurant_id, handle);
        log::info!(
            "Waiting for connectivity to post review for restaurant {}",
            restaurant_id
        );
    }

    /// Schedule every review already waiting in the offline store.
    pub fn resume_pending<E>(&mut self, events: &UnboundedSender<E>) -> Result<usize>
    where
        E: From<RetryEvent> + Send + 'static,
    {
        let pending = self.source.pending_reviews()?;
        for review in &pending {
            self.schedule(review.restaurant_id, events.clone());
        }
        Ok(pending.len())
    }

    /// Whether a poller for `restaurant_id` is still running.
    pub fn is_waiting(&self, restaurant_id: u64) -> bool {
        self.tasks
            .get(&restaurant_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of reviews still waiting for connectivity.
    pub fn waiting(&self) -> usize {
        self.tasks.values().filter(|handle| !handle.is_finished()).count()
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl Drop for RetryPoller {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn poll_until_online<E>(
    source: DataSource,
    restaurant_id: u64,
    interval: Duration,
    events: UnboundedSender<E>,
) where
    E: From<RetryEvent>,
{
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; polling starts one interval later.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !source.is_online().await {
            log::debug!("Still offline, review for {} stays queued", restaurant_id);
            continue;
        }

        let _ = events.send(RetryEvent::Sending { restaurant_id }.into());
        let event = match source.post_review_offline(restaurant_id).await {
            Ok(review) => RetryEvent::Posted(review),
            Err(e) => {
                log::error!(
                    "Posting queued review for restaurant {} failed: {}",
                    restaurant_id,
                    e
                );
                RetryEvent::Failed {
                    restaurant_id,
                    error: e.to_string(),
                }
            }
        };
        let _ = events.send(event.into());
        return;
    }
}
