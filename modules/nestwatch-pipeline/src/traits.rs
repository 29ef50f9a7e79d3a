// Trait abstractions for the pipeline's external collaborators.
//
// Store — keyed entity access plus the declared-field filters the pipeline
//   relies on (list scoping, created-time bounds, cell membership).
// TaskQueue — ordered task dispatch; FIFO per queue, at-least-once.
// Geocoder / FeedSource / Notifier — the three outward gateways.
//
// These enable deterministic testing with the in-memory doubles in
// `testing`: no network, no database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nestwatch_common::{AlertFilter, Coordinate, List, ListSubscriber, Post};

use crate::parser::RawItem;
use crate::tasks::{QueueName, Task};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Store: Send + Sync {
    // --- Lists ---

    async fn get_list(&self, id: Uuid) -> Result<Option<List>>;

    async fn put_list(&self, list: &List) -> Result<()>;

    async fn all_lists(&self) -> Result<Vec<List>>;

    /// Look up the sync target for a normalized (city, state, category).
    async fn find_list(&self, city: &str, state: &str, category: &str) -> Result<Option<List>>;

    // --- Posts ---

    /// Insert a post unless one with the same (list_id, link) idempotency
    /// key already exists. Returns true when the post was inserted.
    async fn insert_post(&self, post: &Post) -> Result<bool>;

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;

    async fn posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>>;

    /// Ids of a list's posts whose cell set intersects `cells`, optionally
    /// bounded to strictly-newer creation times, excluding approximate
    /// locations on request.
    async fn post_ids_in_cells(
        &self,
        list_id: Uuid,
        cells: &[String],
        created_after: Option<DateTime<Utc>>,
        include_approximate: bool,
    ) -> Result<Vec<Uuid>>;

    /// Delete posts created before `cutoff`. Returns the number removed.
    async fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    // --- Subscribers ---

    async fn insert_subscriber(&self, subscriber: &ListSubscriber) -> Result<()>;

    async fn subscriber_exists(&self, list_id: Uuid, user_id: &str) -> Result<bool>;

    // --- Alert filters ---

    async fn get_filter(&self, id: Uuid) -> Result<Option<AlertFilter>>;

    async fn put_filter(&self, filter: &AlertFilter) -> Result<()>;

    async fn filters_for_list(&self, list_id: Uuid) -> Result<Vec<AlertFilter>>;

    async fn filters_for_owner(&self, list_id: Uuid, user_id: &str) -> Result<Vec<AlertFilter>>;
}

// ---------------------------------------------------------------------------
// TaskQueue
// ---------------------------------------------------------------------------

/// Ordered task dispatch. Delivery is at-least-once and FIFO per queue; a
/// handler signals redelivery by returning an error, and signals drop by
/// returning Ok after doing nothing.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, queue: QueueName, task: Task) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

/// Outcome of resolving an address to a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum Geocoded {
    /// Resolved. `approximate` marks a coarse political-boundary match.
    Match {
        location: Coordinate,
        approximate: bool,
    },
    ZeroResults,
    Denied,
    QuotaExceeded,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Geocoded>;
}

/// Delivers a list's feed as already-decomposed item records.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, list: &List) -> Result<Vec<RawItem>>;
}

/// Outbound notification transport; fire-and-forget from the pipeline side.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}
