//! Enrichment: geocode one parsed item and persist it as a Post.
//!
//! The only stage permitted to create a Post.

use tracing::{info, warn};
use uuid::Uuid;

use nestwatch_common::{NestwatchError, Post};
use nestwatch_geo::{cells_for, INDEX_LEVELS};

use crate::stages::PipelineDeps;
use crate::tasks::EnrichTask;
use crate::traits::Geocoded;

/// Append the list's city and state when a fallback-pattern address mentions
/// neither. Precise addresses pass through untouched by the caller.
pub fn qualify_address(address: &str, city: &str, state: &str) -> String {
    let lower = address.to_lowercase();
    let mentions_city = !city.is_empty() && lower.contains(&city.to_lowercase());
    let mentions_state = !state.is_empty() && lower.contains(&state.to_lowercase());

    if mentions_city || mentions_state {
        address.to_string()
    } else {
        format!("{address} {city} {state}").trim_end().to_string()
    }
}

pub async fn run(task: &EnrichTask, deps: &PipelineDeps) -> Result<(), NestwatchError> {
    let address = if task.address_precise {
        task.address.clone()
    } else {
        match deps.store.get_list(task.list_id).await? {
            Some(list) => qualify_address(&task.address, &list.city, &list.state),
            None => {
                warn!(list = %task.list_id, link = task.link.as_str(), "Owning list missing, dropping item");
                return Ok(());
            }
        }
    };

    let outcome = deps
        .geocoder
        .geocode(&address)
        .await
        .map_err(|e| NestwatchError::Geocode(e.to_string()))?;

    match outcome {
        Geocoded::Match {
            location,
            approximate,
        } => {
            let post = Post {
                id: Uuid::new_v4(),
                list_id: task.list_id,
                link: task.link.clone(),
                title: task.title.clone(),
                description: task.description.clone(),
                price: task.price,
                created: task.created,
                location,
                approx_location: approximate,
                cells: cells_for(location, INDEX_LEVELS),
            };

            if deps.store.insert_post(&post).await? {
                info!(list = %task.list_id, link = task.link.as_str(), approximate, "Post indexed");
            } else {
                info!(list = %task.list_id, link = task.link.as_str(), "Post already indexed, redelivery ignored");
            }
            Ok(())
        }
        // Over quota: fail the task so the queue redelivers it later.
        Geocoded::QuotaExceeded => Err(NestwatchError::GeocoderQuota),
        // Terminal for this item; drop it.
        Geocoded::ZeroResults | Geocoded::Denied => {
            warn!(
                link = task.link.as_str(),
                address = address.as_str(),
                "Address did not resolve, dropping item"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_city_and_state_when_neither_mentioned() {
        assert_eq!(
            qualify_address("123 Main St", "minneapolis", "MN"),
            "123 Main St minneapolis MN"
        );
    }

    #[test]
    fn keeps_address_mentioning_city() {
        assert_eq!(
            qualify_address("123 Main St, Minneapolis", "minneapolis", "MN"),
            "123 Main St, Minneapolis"
        );
    }

    #[test]
    fn keeps_address_mentioning_state() {
        assert_eq!(
            qualify_address("123 Main St, mn", "minneapolis", "MN"),
            "123 Main St, mn"
        );
    }

    #[test]
    fn empty_state_does_not_count_as_mentioned() {
        assert_eq!(
            qualify_address("123 Main St", "minneapolis", ""),
            "123 Main St minneapolis"
        );
    }
}
