//! Alert matching: re-run saved filters against newly ingested posts.
//!
//! Filters are few and heterogeneous (different centers, radii and price
//! caps), so each one re-queries the index independently; match semantics
//! stay exact and filter-local.

use tracing::info;

use nestwatch_common::{haversine_m, AlertFilter, NestwatchError, Post};
use nestwatch_geo::candidates_for_radius;

use crate::search::PostCandidates;
use crate::stages::PipelineDeps;
use crate::tasks::{AlertTask, NotifyTask, QueueName, Task};

pub async fn run(task: &AlertTask, deps: &PipelineDeps) -> Result<(), NestwatchError> {
    let filters = deps.store.filters_for_list(task.list_id).await?;

    for filter in &filters {
        let source = PostCandidates {
            store: deps.store.as_ref(),
            list_id: task.list_id,
            created_after: Some(task.since),
            include_approximate: true,
        };
        let center = filter.region.center();
        let radius = filter.region.radius_m() as f64;

        let keys = candidates_for_radius(&source, center, radius, 0).await?;
        let posts = deps.store.posts_by_ids(&keys).await?;

        let matches: Vec<&Post> = posts
            .iter()
            .filter(|post| {
                haversine_m(center.lat, center.lng, post.location.lat, post.location.lng) <= radius
            })
            .filter(|post| filter.max_price == 0 || post.price <= filter.max_price)
            .collect();

        if matches.is_empty() {
            continue;
        }

        let (subject, body) = compose_notification(filter, &matches);
        deps.queue
            .enqueue(
                QueueName::Email,
                Task::Notify(NotifyTask {
                    recipient: filter.owner.email.clone(),
                    subject,
                    body,
                }),
            )
            .await?;
        info!(
            filter = %filter.id,
            matches = matches.len(),
            "Alert matched, notification queued"
        );
    }
    Ok(())
}

fn compose_notification(filter: &AlertFilter, matches: &[&Post]) -> (String, String) {
    let updates = matches
        .iter()
        .map(|post| format!("    {}\n{}", post.link, post.title))
        .collect::<Vec<_>>()
        .join("\n\n");

    let subject = format!(
        "{} new ads match your watch on {}",
        matches.len(),
        filter.street_label
    );
    let criteria = format!(
        "    within {} meters of {} and under ${}",
        filter.region.radius_m(),
        filter.street_label,
        filter.max_price
    );
    let body = format!(
        "Hey {},\n\n{} ads were posted moments ago that match your saved criteria:\n\n{}\n\n{}\n\nNOTE: please do not reply to this email.",
        filter.owner.nickname,
        matches.len(),
        criteria,
        updates,
    );
    (subject, body)
}
