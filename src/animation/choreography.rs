//! Batch plumbing shared by the built-in animators.
//!
//! Strategies only decide each view's [`Track`]; walking the batch,
//! scheduling, and completion aggregation are the same for all of them.

use std::time::Duration;

use super::easing::EasingFunction;
use super::scheduler::Track;
use super::traits::CompletionHandler;
use crate::controller::MapClusterController;
use crate::marker::{MarkerId, MarkerStore};
use crate::view::{AnnotationView, ViewId};

/// Schedule an add animation for every view. Returns how many were
/// scheduled.
pub(super) fn animate_additions<F>(
    controller: &mut MapClusterController,
    views: &[ViewId],
    duration: Duration,
    easing: EasingFunction,
    track_for: F,
) -> usize
where
    F: Fn(&MarkerStore, &AnnotationView) -> Track,
{
    if views.is_empty() {
        return 0;
    }
    let (markers, map_view, scheduler) = controller.parts_mut();
    let mut scheduled = 0;
    for &id in views {
        let Some(view) = map_view.view(id) else {
            log::warn!("{id} is not on the map; skipping add animation");
            continue;
        };
        let track = track_for(markers, view);
        match scheduler.schedule_in(map_view, id, track, duration, easing) {
            Ok(()) => scheduled += 1,
            Err(e) => log::warn!("cannot animate {id} in: {e}"),
        }
    }
    log::debug!("scheduled {scheduled}/{} add animations", views.len());
    scheduled
}

/// Schedule a removal animation for each marker's view under one batch and
/// run `completion` once they have all finished. Returns how many were
/// scheduled.
pub(super) fn animate_removals<F>(
    controller: &mut MapClusterController,
    markers: &[MarkerId],
    completion: CompletionHandler,
    duration: Duration,
    easing: EasingFunction,
    track_for: F,
) -> usize
where
    F: Fn(&MarkerStore, MarkerId, &AnnotationView) -> Track,
{
    let (scheduled, ready) = {
        let (store, map_view, scheduler) = controller.parts_mut();
        let batch = scheduler.open_batch(completion);
        let mut scheduled = 0;
        for &marker in markers {
            let Some(view) = map_view
                .view_for_marker(marker)
                .and_then(|id| map_view.view(id))
            else {
                log::warn!("{marker} has no view; nothing to animate out");
                continue;
            };
            let id = view.id();
            let track = track_for(store, marker, view);
            match scheduler
                .schedule_out(map_view, id, track, duration, easing, batch)
            {
                Ok(()) => scheduled += 1,
                Err(e) => log::warn!("cannot animate {id} out: {e}"),
            }
        }
        (scheduled, scheduler.close_batch(batch))
    };
    log::debug!(
        "scheduled {scheduled}/{} removal animations",
        markers.len()
    );
    if let Some(handler) = ready {
        handler(controller);
    }
    scheduled
}
