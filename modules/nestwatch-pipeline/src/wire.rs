//! Explicit per-entity wire serialization, selected by kind.

use serde_json::{json, Value};
use uuid::Uuid;

use nestwatch_common::{EntityKind, List, NestwatchError, Post};

use crate::traits::Store;

pub fn pack_list(list: &List) -> Value {
    json!({
        "city": list.city,
        "state": list.state,
        "category": list.category,
        "aggregated_prices": [
            list.aggregated_prices.lower_quartile,
            list.aggregated_prices.median,
            list.aggregated_prices.upper_quartile,
        ],
    })
}

pub fn pack_post(post: &Post) -> Value {
    json!({
        "title": post.title,
        "description": post.description,
        "price": post.price,
        "created": post.created.to_rfc3339(),
        "list": post.list_id,
        "location": [post.location.lat, post.location.lng],
    })
}

/// Fetch and pack one entity by explicit kind.
pub async fn pack_entity(
    store: &dyn Store,
    kind: EntityKind,
    id: Uuid,
) -> Result<Value, NestwatchError> {
    match kind {
        EntityKind::List => {
            let list = store
                .get_list(id)
                .await?
                .ok_or_else(|| NestwatchError::NotFound(format!("list {id}")))?;
            Ok(pack_list(&list))
        }
        EntityKind::Post => {
            let post = store
                .get_post(id)
                .await?
                .ok_or_else(|| NestwatchError::NotFound(format!("post {id}")))?;
            Ok(pack_post(&post))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestwatch_common::PriceStats;

    #[test]
    fn packed_list_carries_stats_as_ordered_triple() {
        let mut list = List::new("minneapolis", "MN", "roo");
        list.aggregated_prices = PriceStats {
            lower_quartile: 200,
            median: 300,
            upper_quartile: 400,
        };
        let value = pack_list(&list);
        assert_eq!(value["city"], "minneapolis");
        assert_eq!(value["aggregated_prices"], json!([200, 300, 400]));
    }
}
