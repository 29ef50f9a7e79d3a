// Test doubles for the pipeline's collaborator traits.
//
// Four doubles matching the trait boundaries:
// - MemoryStore (Store) — stateful in-memory entity store
// - MockGeocoder (Geocoder) — scripted address→outcome responses
// - StaticFeed (FeedSource) — fixed item list per (city, category)
// - RecordingNotifier (Notifier) — captures sent mail for assertions
// (MemoryQueue in `queue` already implements TaskQueue.)
//
// Plus helpers for constructing lists, items, posts and filters.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nestwatch_common::{
    AlertFilter, Coordinate, GeoRegion, List, ListSubscriber, Post, UserRef,
};
use nestwatch_geo::{cells_for, INDEX_LEVELS};

use crate::parser::RawItem;
use crate::traits::{FeedSource, Geocoded, Geocoder, Notifier, Store};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Minneapolis, MN.
pub const MINNEAPOLIS: Coordinate = Coordinate {
    lat: 44.9778,
    lng: -93.2650,
};
/// St. Paul, MN.
pub const ST_PAUL: Coordinate = Coordinate {
    lat: 44.9537,
    lng: -93.0900,
};
/// Dallas, TX.
pub const DALLAS: Coordinate = Coordinate {
    lat: 32.7767,
    lng: -96.7970,
};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Stateful in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    lists: HashMap<Uuid, List>,
    posts: HashMap<Uuid, Post>,
    subscribers: Vec<ListSubscriber>,
    filters: HashMap<Uuid, AlertFilter>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_count(&self) -> usize {
        self.inner.lock().unwrap().posts.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_list(&self, id: Uuid) -> Result<Option<List>> {
        Ok(self.inner.lock().unwrap().lists.get(&id).cloned())
    }

    async fn put_list(&self, list: &List) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .lists
            .insert(list.id, list.clone());
        Ok(())
    }

    async fn all_lists(&self) -> Result<Vec<List>> {
        Ok(self.inner.lock().unwrap().lists.values().cloned().collect())
    }

    async fn find_list(&self, city: &str, state: &str, category: &str) -> Result<Option<List>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .lists
            .values()
            .find(|l| l.city == city && l.state == state && l.category == category)
            .cloned())
    }

    async fn insert_post(&self, post: &Post) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner
            .posts
            .values()
            .any(|p| p.list_id == post.list_id && p.link == post.link);
        if duplicate {
            return Ok(false);
        }
        inner.posts.insert(post.id, post.clone());
        Ok(true)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.inner.lock().unwrap().posts.get(&id).cloned())
    }

    async fn posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        let inner = self.inner.lock().unwrap();
        Ok(ids.iter().filter_map(|id| inner.posts.get(id).cloned()).collect())
    }

    async fn post_ids_in_cells(
        &self,
        list_id: Uuid,
        cells: &[String],
        created_after: Option<DateTime<Utc>>,
        include_approximate: bool,
    ) -> Result<Vec<Uuid>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .values()
            .filter(|p| p.list_id == list_id)
            .filter(|p| created_after.map_or(true, |t| p.created > t))
            .filter(|p| include_approximate || !p.approx_location)
            .filter(|p| p.cells.iter().any(|c| cells.contains(c)))
            .map(|p| p.id)
            .collect())
    }

    async fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.posts.len();
        inner.posts.retain(|_, p| p.created >= cutoff);
        Ok((before - inner.posts.len()) as u64)
    }

    async fn insert_subscriber(&self, subscriber: &ListSubscriber) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .subscribers
            .push(subscriber.clone());
        Ok(())
    }

    async fn subscriber_exists(&self, list_id: Uuid, user_id: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .subscribers
            .iter()
            .any(|s| s.list_id == list_id && s.user.user_id == user_id))
    }

    async fn get_filter(&self, id: Uuid) -> Result<Option<AlertFilter>> {
        Ok(self.inner.lock().unwrap().filters.get(&id).cloned())
    }

    async fn put_filter(&self, filter: &AlertFilter) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .filters
            .insert(filter.id, filter.clone());
        Ok(())
    }

    async fn filters_for_list(&self, list_id: Uuid) -> Result<Vec<AlertFilter>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .filters
            .values()
            .filter(|f| f.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn filters_for_owner(&self, list_id: Uuid, user_id: &str) -> Result<Vec<AlertFilter>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .filters
            .values()
            .filter(|f| f.list_id == list_id && f.owner.user_id == user_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

/// Scripted geocoder. Per-address outcome scripts play in order, with the
/// last outcome repeating; unscripted addresses get the default outcome.
pub struct MockGeocoder {
    scripts: Mutex<HashMap<String, VecDeque<Geocoded>>>,
    default: Geocoded,
    calls: Mutex<u32>,
}

impl MockGeocoder {
    pub fn new(default: Geocoded) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default,
            calls: Mutex::new(0),
        }
    }

    /// Exact match on a 123 Main St-style address with fixed outcomes.
    pub fn on(self, address: &str, outcomes: Vec<Geocoded>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), outcomes.into());
        self
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Geocoded> {
        *self.calls.lock().unwrap() += 1;
        let mut scripts = self.scripts.lock().unwrap();
        if let Some(script) = scripts.get_mut(address) {
            if script.len() > 1 {
                return Ok(script.pop_front().unwrap());
            }
            if let Some(last) = script.front() {
                return Ok(last.clone());
            }
        }
        Ok(self.default.clone())
    }
}

// ---------------------------------------------------------------------------
// StaticFeed
// ---------------------------------------------------------------------------

/// Fixed feed items per (city, category). Errors for unregistered targets.
#[derive(Default)]
pub struct StaticFeed {
    feeds: HashMap<(String, String), Vec<RawItem>>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, city: &str, category: &str, items: Vec<RawItem>) -> Self {
        self.feeds
            .insert((city.to_string(), category.to_string()), items);
        self
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self, list: &List) -> Result<Vec<RawItem>> {
        match self.feeds.get(&(list.city.clone(), list.category.clone())) {
            Some(items) => Ok(items.clone()),
            None => bail!("no feed registered for {}/{}", list.city, list.category),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Captures outbound mail for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

pub fn test_user(name: &str) -> UserRef {
    UserRef {
        user_id: name.to_string(),
        email: format!("{name}@example.com"),
        nickname: name.to_string(),
    }
}

/// A feed item whose description carries a primary map-link address.
pub fn item_with_map_address(title: &str, link: &str, published: &str, address: &str) -> RawItem {
    let escaped = address.replace(' ', "+");
    RawItem {
        title: title.to_string(),
        description: format!(
            r#"Sunny place<br/> <a href="http://maps.google.com/?q=loc%3A{escaped}">google map</a>"#
        ),
        link: link.to_string(),
        published: published.to_string(),
    }
}

/// A feed item carrying only the fallback `Location:` line.
pub fn item_with_fallback_address(
    title: &str,
    link: &str,
    published: &str,
    address: &str,
) -> RawItem {
    RawItem {
        title: title.to_string(),
        description: format!("Cozy place<!-- -->Location: {address} <li>no pets"),
        link: link.to_string(),
        published: published.to_string(),
    }
}

/// A ready-to-store post with its geocell set computed.
pub fn test_post(
    list_id: Uuid,
    link: &str,
    price: u32,
    created: DateTime<Utc>,
    location: Coordinate,
    approx_location: bool,
) -> Post {
    Post {
        id: Uuid::new_v4(),
        list_id,
        link: link.to_string(),
        title: format!("Ad at {link}"),
        description: "A fine place".to_string(),
        price,
        created,
        location,
        approx_location,
        cells: cells_for(location, INDEX_LEVELS),
    }
}

/// A filter owned by `owner` watching `radius_m` around `center`.
pub fn test_filter(
    list_id: Uuid,
    owner: &UserRef,
    center: Coordinate,
    radius_m: u32,
    max_price: u32,
) -> AlertFilter {
    AlertFilter {
        id: Uuid::new_v4(),
        list_id,
        owner: owner.clone(),
        region: GeoRegion::new(center, radius_m).unwrap(),
        max_price,
        street_label: "Test corner".to_string(),
    }
}

/// A coordinate `meters` north of `origin`.
pub fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
    Coordinate {
        lat: origin.lat + meters / 111_320.0,
        lng: origin.lng,
    }
}
