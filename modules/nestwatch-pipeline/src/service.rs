//! Subscription and alert-filter management.
//!
//! Every operation takes the acting user explicitly; there is no ambient
//! session state. Authorization failures are rejected with no state change.

use tracing::info;
use uuid::Uuid;

use nestwatch_common::{AlertFilter, GeoRegion, List, ListSubscriber, NestwatchError, UserRef};

use crate::traits::{FeedSource, Store};

/// Result of a subscribe call.
#[derive(Debug)]
pub enum SubscribeOutcome {
    Subscribed { list: List },
    AlreadySubscribed { list: List },
}

/// Normalize a (city, state, category) sync target: cities like "Ann Arbor"
/// lose their whitespace, states are uppercased.
fn normalize_target(city: &str, state: &str, category: &str) -> (String, String, String) {
    let city: String = city.trim().to_lowercase().split_whitespace().collect();
    (
        city,
        state.trim().to_uppercase(),
        category.trim().to_string(),
    )
}

/// Subscribe `caller` to the (city, category) list, creating the List on
/// first subscription. A List is only created once its feed has been
/// verified fetchable.
pub async fn subscribe(
    store: &dyn Store,
    feeds: &dyn FeedSource,
    caller: &UserRef,
    city: &str,
    state: &str,
    category: &str,
) -> Result<SubscribeOutcome, NestwatchError> {
    let (city, state, category) = normalize_target(city, state, category);
    if city.is_empty() || category.is_empty() {
        return Err(NestwatchError::Validation(
            "city and category are required".to_string(),
        ));
    }

    let list = match store.find_list(&city, &state, &category).await? {
        Some(list) => {
            if store.subscriber_exists(list.id, &caller.user_id).await? {
                return Ok(SubscribeOutcome::AlreadySubscribed { list });
            }
            list
        }
        None => {
            let list = List::new(&city, &state, &category);
            // An unfetchable feed means a bogus target; reject before storing.
            feeds.fetch(&list).await.map_err(|e| {
                NestwatchError::Validation(format!(
                    "feed for {city}/{category} is not reachable: {e}"
                ))
            })?;
            store.put_list(&list).await?;
            info!(city = city.as_str(), category = category.as_str(), "List created");
            list
        }
    };

    store
        .insert_subscriber(&ListSubscriber {
            id: Uuid::new_v4(),
            list_id: list.id,
            user: caller.clone(),
        })
        .await?;

    Ok(SubscribeOutcome::Subscribed { list })
}

/// Create-or-update parameters for a saved watch.
#[derive(Debug, Clone)]
pub struct SaveFilter {
    /// None creates a filter; Some replaces an existing one's parameters.
    pub filter_id: Option<Uuid>,
    pub list_id: Uuid,
    pub region: GeoRegion,
    pub max_price: u32,
    pub street_label: String,
}

/// Create a filter, or replace the region, price cap and label of an
/// existing one. Updates by anyone but the owner are rejected unchanged.
pub async fn save_filter(
    store: &dyn Store,
    caller: &UserRef,
    params: SaveFilter,
) -> Result<AlertFilter, NestwatchError> {
    let filter = match params.filter_id {
        Some(id) => {
            let mut filter = store
                .get_filter(id)
                .await?
                .ok_or_else(|| NestwatchError::NotFound(format!("filter {id}")))?;
            if filter.owner.user_id != caller.user_id {
                return Err(NestwatchError::Unauthorized(
                    "filter belongs to another user".to_string(),
                ));
            }
            filter.region = params.region;
            filter.max_price = params.max_price;
            filter.street_label = params.street_label;
            filter
        }
        None => AlertFilter {
            id: Uuid::new_v4(),
            list_id: params.list_id,
            owner: caller.clone(),
            region: params.region,
            max_price: params.max_price,
            street_label: params.street_label,
        },
    };

    store.put_filter(&filter).await?;
    Ok(filter)
}

/// The caller's saved filters for one list.
pub async fn list_filters(
    store: &dyn Store,
    caller: &UserRef,
    list_id: Uuid,
) -> Result<Vec<AlertFilter>, NestwatchError> {
    Ok(store.filters_for_owner(list_id, &caller.user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_normalization_flattens_city_names() {
        let (city, state, category) = normalize_target(" Ann Arbor ", "mi", " roo ");
        assert_eq!(city, "annarbor");
        assert_eq!(state, "MI");
        assert_eq!(category, "roo");
    }
}
