//! Views emerge from the cluster they split off and collapse into the
//! cluster that absorbs them.

use std::time::Duration;

use super::choreography::{animate_additions, animate_removals};
use super::easing::EasingFunction;
use super::scheduler::Track;
use super::traits::{CompletionHandler, TransitionAnimator};
use super::{checked_duration, DEFAULT_DURATION};
use crate::controller::MapClusterController;
use crate::error::ClusterError;
use crate::geo::Located;
use crate::marker::MarkerId;
use crate::view::ViewId;

/// Moves added views out of their owning cluster's coordinate and removed
/// views into it.
///
/// Endpoints come from each marker's tracker: an added view starts at the
/// cluster recorded for its marker and ends at the marker's own coordinate;
/// a removed view starts where it is and ends at its recorded cluster. With
/// no recorded (or a since-removed) cluster the view animates in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveInOutAnimator {
    duration: Duration,
    easing: EasingFunction,
}

impl MoveInOutAnimator {
    /// Animator with the given duration in seconds.
    pub fn new(duration_secs: f64) -> Result<Self, ClusterError> {
        Ok(Self::with_duration(checked_duration(duration_secs)?))
    }

    /// Animator with the given duration and the default easing.
    #[must_use]
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration,
            easing: EasingFunction::default(),
        }
    }

    /// Set a custom easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Easing applied to both directions.
    #[must_use]
    pub fn easing(&self) -> EasingFunction {
        self.easing
    }
}

impl Default for MoveInOutAnimator {
    fn default() -> Self {
        Self::with_duration(DEFAULT_DURATION)
    }
}

impl TransitionAnimator for MoveInOutAnimator {
    fn on_annotation_views_added(
        &self,
        controller: &mut MapClusterController,
        views: &[ViewId],
    ) {
        let _ = animate_additions(
            controller,
            views,
            self.duration,
            self.easing,
            |markers, view| {
                let marker = view.marker();
                let to = markers
                    .coordinate(marker)
                    .unwrap_or_else(|| view.coordinate());
                let from = markers.cluster_coordinate(marker).unwrap_or(to);
                Track::moving(from, to)
            },
        );
    }

    fn on_annotations_will_be_removed(
        &self,
        controller: &mut MapClusterController,
        markers: &[MarkerId],
        completion: CompletionHandler,
    ) {
        let _ = animate_removals(
            controller,
            markers,
            completion,
            self.duration,
            self.easing,
            |store, marker, view| {
                let from = view.coordinate();
                let to = store.cluster_coordinate(marker).unwrap_or(from);
                Track::moving(from, to)
            },
        );
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn name(&self) -> &'static str {
        "move_in_out"
    }
}
