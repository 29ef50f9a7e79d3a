//! The feed ingestion pipeline: parse → geocode → index → aggregate →
//! alert-match → notify.
//!
//! Stages communicate only through tasks on named FIFO queues and the shared
//! store; there are no direct calls between stages. External collaborators
//! (store, queue, geocoder, feed source, notification transport) sit behind
//! the traits in [`traits`].

pub mod geocoder;
pub mod parser;
pub mod queue;
pub mod search;
pub mod service;
pub mod stages;
pub mod tasks;
pub mod traits;
pub mod wire;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
