//! Aggregation: quantile price statistics for one sync run.

use tracing::{info, warn};

use nestwatch_common::{NestwatchError, PriceStats};

use crate::stages::PipelineDeps;
use crate::tasks::AggregateTask;

/// Lower quartile, median and upper quartile of `prices`, by the fixed rank
/// formula `rank = floor(n * q)` into the sorted sequence. None for an empty
/// price list.
pub fn quantiles(prices: &[u32]) -> Option<PriceStats> {
    if prices.is_empty() {
        return None;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_unstable();
    let n = sorted.len() as f64;
    let rank = |q: f64| sorted[(n * q).floor() as usize];

    Some(PriceStats {
        lower_quartile: rank(0.25),
        median: rank(0.5),
        upper_quartile: rank(0.75),
    })
}

/// Overwrites the owning list's statistics with this run's quantiles.
/// Idempotent for a given price list.
pub async fn run(task: &AggregateTask, deps: &PipelineDeps) -> Result<(), NestwatchError> {
    let stats = match quantiles(&task.prices) {
        Some(stats) => stats,
        None => {
            info!(list = %task.list_id, "No prices collected, skipping aggregation");
            return Ok(());
        }
    };

    let mut list = match deps.store.get_list(task.list_id).await? {
        Some(list) => list,
        None => {
            warn!(list = %task.list_id, "Owning list missing, dropping aggregation");
            return Ok(());
        }
    };

    list.aggregated_prices = stats;
    deps.store.put_list(&list).await?;

    info!(
        list = %task.list_id,
        samples = task.prices.len(),
        lower_quartile = stats.lower_quartile,
        median = stats.median,
        upper_quartile = stats.upper_quartile,
        "Price statistics updated"
    );
    Ok(())
}
