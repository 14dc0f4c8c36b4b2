//! Annotation views and the table that stands in for the map surface.
//!
//! Only cluster markers are displayed; each gets at most one live
//! [`AnnotationView`]. The view owns its on-screen coordinate and alpha,
//! which animations overwrite frame by frame, and its [`TransitionState`].

mod state;

use std::fmt;

use rustc_hash::FxHashMap;
pub use state::TransitionState;

use crate::error::ClusterError;
use crate::geo::{Coordinate, Located};
use crate::marker::MarkerId;

/// Stable identity of a view within one [`MapView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// On-screen representation of one marker.
#[derive(Debug, Clone)]
pub struct AnnotationView {
    id: ViewId,
    marker: MarkerId,
    coordinate: Coordinate,
    alpha: f32,
    state: TransitionState,
}

impl AnnotationView {
    /// This view's identity.
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The marker this view displays.
    #[must_use]
    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    /// Opacity in [0, 1].
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub(crate) fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.coordinate = coordinate;
    }

    pub(crate) fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Move one step along the lifecycle.
    pub(crate) fn advance_to(
        &mut self,
        to: TransitionState,
    ) -> Result<(), ClusterError> {
        if !self.state.can_advance_to(to) {
            return Err(ClusterError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        log::trace!("{} ({}): {} -> {to}", self.id, self.marker, self.state);
        self.state = to;
        Ok(())
    }
}

impl Located for AnnotationView {
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

/// All views currently on the map, indexed by view and by marker.
#[derive(Debug, Default)]
pub struct MapView {
    views: FxHashMap<ViewId, AnnotationView>,
    by_marker: FxHashMap<MarkerId, ViewId>,
    next_id: u64,
}

impl MapView {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `Pending` view for `marker` at `coordinate`.
    ///
    /// If the marker already has a view that has not been removed, that
    /// view is returned unchanged.
    pub fn materialize(
        &mut self,
        marker: MarkerId,
        coordinate: Coordinate,
    ) -> ViewId {
        if let Some(existing) = self.view_for_marker(marker) {
            return existing;
        }
        let id = ViewId(self.next_id);
        self.next_id += 1;
        let view = AnnotationView {
            id,
            marker,
            coordinate,
            alpha: 1.0,
            state: TransitionState::Pending,
        };
        let _ = self.views.insert(id, view);
        let _ = self.by_marker.insert(marker, id);
        id
    }

    /// Look up a view.
    #[must_use]
    pub fn view(&self, id: ViewId) -> Option<&AnnotationView> {
        self.views.get(&id)
    }

    pub(crate) fn view_mut(&mut self, id: ViewId) -> Option<&mut AnnotationView> {
        self.views.get_mut(&id)
    }

    /// The live (not yet removed) view displaying `marker`.
    #[must_use]
    pub fn view_for_marker(&self, marker: MarkerId) -> Option<ViewId> {
        self.by_marker
            .get(&marker)
            .copied()
            .filter(|id| {
                self.views
                    .get(id)
                    .is_some_and(|v| v.state != TransitionState::Removed)
            })
    }

    /// Remove a view from the map.
    ///
    /// Refuses while the view is animating: the animation still draws it,
    /// and discarding it now would make it pop.
    pub fn discard(&mut self, id: ViewId) -> Result<AnnotationView, ClusterError> {
        let state = self
            .views
            .get(&id)
            .ok_or(ClusterError::UnknownView(id))?
            .state;
        if state.is_animating() {
            return Err(ClusterError::ViewBusy(id));
        }
        let view = self.views.remove(&id).ok_or(ClusterError::UnknownView(id))?;
        if self.by_marker.get(&view.marker) == Some(&id) {
            let _ = self.by_marker.remove(&view.marker);
        }
        Ok(view)
    }

    /// Discard the most recent view of `marker`, whatever its state.
    ///
    /// `Ok(None)` if the marker never had a view. Fails like
    /// [`discard`](Self::discard) while the view is animating.
    pub fn discard_for_marker(
        &mut self,
        marker: MarkerId,
    ) -> Result<Option<AnnotationView>, ClusterError> {
        match self.by_marker.get(&marker).copied() {
            Some(id) => self.discard(id).map(Some),
            None => Ok(None),
        }
    }

    /// Views in the given state, in creation order.
    #[must_use]
    pub fn views_in(&self, state: TransitionState) -> Vec<ViewId> {
        let mut ids: Vec<ViewId> = self
            .views
            .values()
            .filter(|v| v.state == state)
            .map(AnnotationView::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over every view on the map.
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationView> {
        self.views.values()
    }

    /// Number of views on the map, including ones still animating out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether the map shows no views.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
