//! Views fade in and out where they stand.

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

/// Fades added views from transparent to opaque and removed views back to
/// transparent, without moving them. Ignores cluster trackers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeInOutAnimator {
    duration: Duration,
}

impl FadeInOutAnimator {
    /// Animator with the given duration in seconds.
    pub fn new(duration_secs: f64) -> Result<Self, ClusterError> {
        Ok(Self::with_duration(checked_duration(duration_secs)?))
    }

    /// Animator with the given duration.
    #[must_use]
    pub fn with_duration(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for FadeInOutAnimator {
    fn default() -> Self {
        Self::with_duration(DEFAULT_DURATION)
    }
}

impl TransitionAnimator for FadeInOutAnimator {
    fn on_annotation_views_added(
        &self,
        controller: &mut MapClusterController,
        views: &[ViewId],
    ) {
        let _ = animate_additions(
            controller,
            views,
            self.duration,
            EasingFunction::Linear,
            |markers, view| {
                let at = markers
                    .coordinate(view.marker())
                    .unwrap_or_else(|| view.coordinate());
                Track::fading(at, 0.0, 1.0)
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
            EasingFunction::Linear,
            |_, _, view| Track::fading(view.coordinate(), view.alpha(), 0.0),
        );
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn name(&self) -> &'static str {
        "fade_in_out"
    }
}
