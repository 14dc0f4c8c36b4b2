//! The animator contract between the clustering controller and a visual
//! transition strategy.

use std::sync::Arc;
use std::time::Duration;

use crate::controller::MapClusterController;
use crate::marker::MarkerId;
use crate::view::ViewId;

/// Signal that a removal batch has fully left the screen.
///
/// Runs once, on the event-loop thread, with the controller that issued the
/// batch. Only after it runs may the removed views be discarded.
pub type CompletionHandler = Box<dyn FnOnce(&mut MapClusterController)>;

/// Choreographs views entering and leaving the map after a clustering
/// change.
///
/// The controller decides *what* changes; implementations decide how it
/// looks. Both methods only schedule work on the controller's
/// [`TransitionScheduler`](super::TransitionScheduler) and return
/// immediately; frames and completions happen during later
/// [`MapClusterController::update`] calls. New animations start at the
/// scheduler's current time, so a host calling these directly after an
/// idle gap should bring the clock forward with `update` first.
///
/// See [`MoveInOutAnimator`](super::MoveInOutAnimator) and
/// [`FadeInOutAnimator`](super::FadeInOutAnimator).
pub trait TransitionAnimator: Send + Sync {
    /// Animate the views materialized by one clustering pass.
    ///
    /// Views are scheduled in input order. An empty slice is a no-op.
    fn on_annotation_views_added(
        &self,
        controller: &mut MapClusterController,
        views: &[ViewId],
    );

    /// Animate the views of markers about to be removed, then call
    /// `completion` once every one of them has reached
    /// [`TransitionState::Removed`](crate::view::TransitionState::Removed).
    ///
    /// `completion` runs exactly once per call. If nothing needs animating
    /// (including an empty `markers` slice) it runs before this returns.
    fn on_annotations_will_be_removed(
        &self,
        controller: &mut MapClusterController,
        markers: &[MarkerId],
        completion: CompletionHandler,
    );

    /// How long one transition takes.
    fn duration(&self) -> Duration;

    /// Optional name for debugging/logging.
    fn name(&self) -> &'static str {
        "unnamed"
    }
}

/// Type alias for shared animator references.
pub type SharedAnimator = Arc<dyn TransitionAnimator>;

/// Create a shared animator from any [`TransitionAnimator`] implementation.
pub fn shared<A: TransitionAnimator + 'static>(animator: A) -> SharedAnimator {
    Arc::new(animator)
}
