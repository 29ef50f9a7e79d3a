//! Task-kind tagged union for cross-stage communication.
//!
//! Stages never call each other directly; every hop is a task on a named
//! queue, routed by kind through the dispatch table in [`crate::stages`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

/// Named queues. Tasks on the same queue execute in submission order; tasks
/// on different queues carry no relative ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Enrich, aggregate and alert tasks of one sync share this queue, which
    /// is what guarantees every Post is persisted before aggregation and
    /// alert matching run.
    Pipeline,
    /// Outbound notifications; ordering relative to the pipeline is
    /// irrelevant.
    Email,
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueName::Pipeline => write!(f, "pipeline"),
            QueueName::Email => write!(f, "email"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    Enrich(EnrichTask),
    Aggregate(AggregateTask),
    Alert(AlertTask),
    Notify(NotifyTask),
}

impl Task {
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Enrich(_) => "enrich",
            Task::Aggregate(_) => "aggregate",
            Task::Alert(_) => "alert",
            Task::Notify(_) => "notify",
        }
    }
}

/// One parsed feed item awaiting geocoding and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichTask {
    pub list_id: Uuid,
    pub title: String,
    pub description: String,
    pub link: String,
    pub price: u32,
    pub created: DateTime<Utc>,
    pub address: String,
    /// True when the address came from the primary (map link) pattern.
    pub address_precise: bool,
}

/// The price list collected across one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateTask {
    pub list_id: Uuid,
    pub prices: Vec<u32>,
}

/// Re-run saved filters against posts created after `since`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertTask {
    pub list_id: Uuid,
    pub since: DateTime<Utc>,
}

/// A composed notification awaiting transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyTask {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}
