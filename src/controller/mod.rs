//! Reference clustering controller.
//!
//! Takes cluster membership from an external algorithm, diffs it against
//! the clusters on screen, writes the tracker back-references the animator
//! needs, and drives the add/remove protocol: new cluster views are handed
//! to [`on_annotation_views_added`], vanishing ones to
//! [`on_annotations_will_be_removed`], and their views
//! and markers are dropped only from that call's completion handler.
//!
//! [`on_annotation_views_added`]: crate::animation::TransitionAnimator::on_annotation_views_added
//! [`on_annotations_will_be_removed`]: crate::animation::TransitionAnimator::on_annotations_will_be_removed

mod diff;

use std::sync::Arc;

pub use diff::{ClusterSpec, ClusteringDiff};
use rustc_hash::FxHashMap;
use web_time::Instant;

use crate::animation::{SharedAnimator, TransitionScheduler};
use crate::error::ClusterError;
use crate::geo::{Coordinate, Located};
use crate::marker::{Marker, MarkerId, MarkerStore};
use crate::options::Options;
use crate::view::{MapView, ViewId};

/// Owns markers, views, and the animation loop for one map.
pub struct MapClusterController {
    markers: MarkerStore,
    map_view: MapView,
    scheduler: TransitionScheduler,
    animator: SharedAnimator,
    /// Clusters shown after the last pass, in input order.
    visible_clusters: Vec<MarkerId>,
}

impl MapClusterController {
    /// Controller using `animator`, with a clock starting now.
    #[must_use]
    pub fn new(animator: SharedAnimator) -> Self {
        Self::with_scheduler(animator, TransitionScheduler::new())
    }

    /// Controller using `animator` and an explicit scheduler (e.g. one
    /// started on a simulated clock).
    #[must_use]
    pub fn with_scheduler(
        animator: SharedAnimator,
        scheduler: TransitionScheduler,
    ) -> Self {
        Self {
            markers: MarkerStore::new(),
            map_view: MapView::new(),
            scheduler,
            animator,
            visible_clusters: Vec::new(),
        }
    }

    /// Controller configured from options.
    pub fn with_options(options: &Options) -> Result<Self, ClusterError> {
        Ok(Self::new(options.animation.build_animator()?))
    }

    // -- Accessors --

    /// The active animator.
    #[must_use]
    pub fn animator(&self) -> &SharedAnimator {
        &self.animator
    }

    /// Replace the animator. Animations already scheduled keep running.
    pub fn set_animator(&mut self, animator: SharedAnimator) {
        log::debug!(
            "animator {} -> {}",
            self.animator.name(),
            animator.name()
        );
        self.animator = animator;
    }

    /// All markers and their tracker payloads.
    #[must_use]
    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Mutable marker access, for algorithms that maintain trackers
    /// themselves.
    pub fn markers_mut(&mut self) -> &mut MarkerStore {
        &mut self.markers
    }

    /// Views currently on the map.
    #[must_use]
    pub fn map_view(&self) -> &MapView {
        &self.map_view
    }

    /// Mutable view access, for hosts that materialize views themselves.
    pub fn map_view_mut(&mut self) -> &mut MapView {
        &mut self.map_view
    }

    /// The animation loop.
    #[must_use]
    pub fn scheduler(&self) -> &TransitionScheduler {
        &self.scheduler
    }

    /// Clusters shown after the last [`apply_clustering`](Self::apply_clustering).
    #[must_use]
    pub fn visible_clusters(&self) -> &[MarkerId] {
        &self.visible_clusters
    }

    /// Split borrow used by animators: read trackers while mutating views
    /// and scheduling.
    pub fn parts_mut(
        &mut self,
    ) -> (&MarkerStore, &mut MapView, &mut TransitionScheduler) {
        (&self.markers, &mut self.map_view, &mut self.scheduler)
    }

    // -- Markers --

    /// Add an individual marker.
    pub fn add_marker(
        &mut self,
        coordinate: Coordinate,
    ) -> Result<MarkerId, ClusterError> {
        let coordinate =
            Coordinate::checked(coordinate.latitude, coordinate.longitude)?;
        Ok(self.markers.insert_individual(coordinate))
    }

    /// Remove an individual marker. Clusters that listed it keep a stale
    /// entry until the next [`apply_clustering`](Self::apply_clustering).
    pub fn remove_marker(&mut self, id: MarkerId) -> Result<Marker, ClusterError> {
        match self.markers.get(id) {
            Some(marker) if !marker.is_cluster() => {}
            _ => return Err(ClusterError::UnknownMarker(id)),
        }
        self.markers.remove(id).ok_or(ClusterError::UnknownMarker(id))
    }

    // -- Clustering --

    /// Replace the visible clustering with `specs`.
    ///
    /// Clusters with unchanged membership stay as they are. New clusters
    /// get a view that emerges from the cluster their members came from;
    /// vanishing clusters collapse into the cluster that took their members
    /// and are dropped once that animation completes. Every individual
    /// marker's tracker is pointed at its new cluster.
    ///
    /// Input is validated before anything changes: members must be live,
    /// distinct individual markers and coordinates must be valid. Specs
    /// without members are ignored.
    ///
    /// `now` is the time of the change. Running animations are first
    /// brought up to it (as by [`update`](Self::update)) and new ones start
    /// at it, so a host that stopped ticking while idle still sees full
    /// transitions.
    pub fn apply_clustering(
        &mut self,
        specs: Vec<ClusterSpec>,
        now: Instant,
    ) -> Result<ClusteringDiff, ClusterError> {
        let specs: Vec<ClusterSpec> = specs
            .into_iter()
            .filter(|spec| {
                if spec.members.is_empty() {
                    log::warn!("ignoring empty cluster at {}", spec.coordinate);
                }
                !spec.members.is_empty()
            })
            .collect();
        for spec in &specs {
            let c = spec.coordinate;
            let _ = Coordinate::checked(c.latitude, c.longitude)?;
        }
        self.markers
            .validate_members(specs.iter().flat_map(|spec| &spec.members))?;
        let _ = self.update(now);

        let matching =
            diff::match_clusters(&self.markers, &self.visible_clusters, &specs);

        let mut result = ClusteringDiff::default();
        let mut new_owner: FxHashMap<MarkerId, MarkerId> = FxHashMap::default();
        let mut visible = Vec::with_capacity(specs.len());
        for (spec, kept) in specs.into_iter().zip(matching.kept) {
            let id = if let Some(id) = kept {
                result.kept.push(id);
                id
            } else {
                let id = self.create_cluster(spec.coordinate, &spec.members)?;
                result.added.push(id);
                id
            };
            for &member in &spec.members {
                let _ = new_owner.insert(member, id);
            }
            visible.push(id);
        }

        for &old in &matching.removed {
            self.link_target(old, &new_owner)?;
        }
        for member in self.markers.individual_ids() {
            match new_owner.get(&member) {
                Some(&owner) => self.markers.set_cluster(member, owner)?,
                None => self.markers.clear_cluster(member)?,
            }
        }
        self.visible_clusters = visible;
        result.removed = matching.removed;

        log::debug!(
            "clustering applied: {} kept, {} added, {} removed",
            result.kept.len(),
            result.added.len(),
            result.removed.len()
        );
        self.run_transitions(&result);
        Ok(result)
    }

    /// Create a cluster marker and point it at the cluster its first
    /// tracked member came from. Member trackers are still the old ones
    /// here.
    fn create_cluster(
        &mut self,
        coordinate: Coordinate,
        members: &[MarkerId],
    ) -> Result<MarkerId, ClusterError> {
        let origin = members.iter().find_map(|&m| self.markers.cluster(m));
        let id = self.markers.insert_cluster(coordinate, members.to_vec())?;
        if let Some(origin) = origin {
            self.markers.set_cluster(id, origin)?;
            if let Some(from) = self.markers.coordinate(origin) {
                self.markers.set_previous_coordinate(id, from)?;
            }
        }
        self.markers.set_new_coordinate(id, coordinate)?;
        Ok(id)
    }

    /// Point a vanishing cluster at the cluster that took its first
    /// surviving member, or at nothing.
    fn link_target(
        &mut self,
        old: MarkerId,
        new_owner: &FxHashMap<MarkerId, MarkerId>,
    ) -> Result<(), ClusterError> {
        let Some(cluster) = self.markers.get(old) else {
            return Ok(());
        };
        let from = cluster.coordinate();
        let target = cluster
            .members()
            .iter()
            .find_map(|m| new_owner.get(m).copied());
        self.markers.set_previous_coordinate(old, from)?;
        match target {
            Some(target) => {
                self.markers.set_cluster(old, target)?;
                if let Some(to) = self.markers.coordinate(target) {
                    self.markers.set_new_coordinate(old, to)?;
                }
                Ok(())
            }
            None => self.markers.clear_cluster(old),
        }
    }

    fn run_transitions(&mut self, diff: &ClusteringDiff) {
        let added_views: Vec<ViewId> = diff
            .added
            .iter()
            .filter_map(|&id| {
                let at = self.markers.coordinate(id)?;
                Some(self.map_view.materialize(id, at))
            })
            .collect();

        let animator = Arc::clone(&self.animator);
        animator.on_annotation_views_added(self, &added_views);

        let doomed = diff.removed.clone();
        animator.on_annotations_will_be_removed(
            self,
            &diff.removed,
            Box::new(move |controller| controller.retire_clusters(&doomed)),
        );
    }

    /// Drop the views and markers of clusters whose removal finished.
    fn retire_clusters(&mut self, clusters: &[MarkerId]) {
        for &id in clusters {
            match self.map_view.discard_for_marker(id) {
                Ok(_) => {
                    let _ = self.markers.remove(id);
                }
                Err(e) => log::warn!("keeping {id}: {e}"),
            }
        }
        log::debug!("retired {} clusters", clusters.len());
    }

    // -- Frame loop --

    /// Advance animations to `now` and run any completion handlers that
    /// became ready. Returns whether anything is still in progress.
    pub fn update(&mut self, now: Instant) -> bool {
        let ready = self.scheduler.advance(now, &mut self.map_view);
        for handler in ready {
            handler(self);
        }
        !self.scheduler.is_idle()
    }
}

impl std::fmt::Debug for MapClusterController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapClusterController")
            .field("animator", &self.animator.name())
            .field("markers", &self.markers)
            .field("views", &self.map_view.len())
            .field("visible_clusters", &self.visible_clusters.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::animation::{shared, EasingFunction, MoveInOutAnimator};
    use crate::geo::Located;
    use crate::view::TransitionState;

    const STEP: Duration = Duration::from_millis(300);

    struct Fixture {
        controller: MapClusterController,
        start: Instant,
        markers: Vec<MarkerId>,
    }

    impl Fixture {
        /// Four markers: two around Berlin, two around Hamburg.
        fn new() -> Self {
            let start = Instant::now();
            let animator = MoveInOutAnimator::with_duration(STEP)
                .with_easing(EasingFunction::Linear);
            let mut controller = MapClusterController::with_scheduler(
                shared(animator),
                TransitionScheduler::starting_at(start),
            );
            let markers = [
                (52.52, 13.40),
                (52.50, 13.45),
                (53.55, 9.99),
                (53.57, 10.02),
            ]
            .iter()
            .map(|&(lat, lon)| {
                controller.add_marker(Coordinate::new(lat, lon)).unwrap()
            })
            .collect();
            Self {
                controller,
                start,
                markers,
            }
        }

        fn spec(&self, idx: &[usize]) -> ClusterSpec {
            let members = idx.iter().map(|&i| self.markers[i]).collect();
            ClusterSpec::at_centroid(self.controller.markers(), members)
                .unwrap()
        }

        fn zoomed_out(&self) -> Vec<ClusterSpec> {
            vec![self.spec(&[0, 1, 2, 3])]
        }

        fn zoomed_in(&self) -> Vec<ClusterSpec> {
            vec![self.spec(&[0, 1]), self.spec(&[2, 3])]
        }

        fn at(&self, steps: u32) -> Instant {
            self.start + STEP * steps
        }

        fn state_of(&self, cluster: MarkerId) -> Option<TransitionState> {
            let map = self.controller.map_view();
            let id = map.iter().find(|v| v.marker() == cluster)?.id();
            map.view(id).map(crate::view::AnnotationView::state)
        }
    }

    #[test]
    fn test_first_pass_adds_views() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let diff = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();

        assert_eq!(diff.added.len(), 1);
        assert!(diff.removed.is_empty());
        assert_eq!(fx.controller.visible_clusters(), diff.added.as_slice());
        let cluster = diff.added[0];
        assert_eq!(fx.state_of(cluster), Some(TransitionState::AnimatingIn));
        for &m in &fx.markers {
            assert_eq!(fx.controller.markers().cluster(m), Some(cluster));
        }
        // Nothing to emerge from on the first pass.
        assert_eq!(fx.controller.markers().cluster(cluster), None);

        let at = fx.at(1);
        assert!(!fx.controller.update(at));
        assert_eq!(fx.state_of(cluster), Some(TransitionState::Settled));
    }

    #[test]
    fn test_zoom_in_splits_and_retires_old_cluster() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let old = fx.controller.apply_clustering(specs, fx.at(0)).unwrap().added[0];
        let _ = fx.controller.update(fx.at(1));
        let old_at = fx.controller.markers().coordinate(old).unwrap();

        let specs = fx.zoomed_in();
        let diff = fx.controller.apply_clustering(specs, fx.at(1)).unwrap();
        assert_eq!(diff.added.len(), 2);
        assert_eq!(diff.removed, vec![old]);

        let markers = fx.controller.markers();
        for &new in &diff.added {
            assert_eq!(markers.cluster(new), Some(old));
            assert_eq!(markers.previous_coordinate(new), Some(old_at));
            let view = fx.controller.map_view().view_for_marker(new).unwrap();
            let view = fx.controller.map_view().view(view).unwrap();
            assert_eq!(view.coordinate(), old_at);
        }
        assert_eq!(markers.cluster(old), Some(diff.added[0]));
        assert_eq!(markers.cluster(fx.markers[2]), Some(diff.added[1]));
        assert_eq!(fx.state_of(old), Some(TransitionState::AnimatingOut));

        // The leaving view stays on the map until its batch completes.
        let mid = fx.at(1) + STEP / 2;
        assert!(fx.controller.update(mid));
        assert!(fx.controller.markers().contains(old));
        let leaving = fx.controller.map_view().view_for_marker(old).unwrap();
        assert!(matches!(
            fx.controller.map_view_mut().discard(leaving),
            Err(ClusterError::ViewBusy(_))
        ));

        assert!(!fx.controller.update(fx.at(2)));
        assert!(!fx.controller.markers().contains(old));
        assert_eq!(fx.state_of(old), None);
        assert_eq!(fx.controller.map_view().len(), 2);
        // Weak back-references to the retired cluster resolve to nothing.
        for &new in &diff.added {
            assert_eq!(fx.controller.markers().cluster(new), None);
            let at = fx.controller.markers().coordinate(new).unwrap();
            let view = fx.controller.map_view().view_for_marker(new).unwrap();
            let view = fx.controller.map_view().view(view).unwrap();
            assert_eq!(view.coordinate(), at);
            assert_eq!(view.state(), TransitionState::Settled);
        }
    }

    #[test]
    fn test_zoom_out_collapses_into_merged_cluster() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_in();
        let split = fx.controller.apply_clustering(specs, fx.at(0)).unwrap().added;
        let _ = fx.controller.update(fx.at(1));

        let specs = fx.zoomed_out();
        let diff = fx.controller.apply_clustering(specs, fx.at(1)).unwrap();
        let merged = diff.added[0];
        let merged_at = fx.controller.markers().coordinate(merged).unwrap();
        assert_eq!(diff.removed, split);
        assert_eq!(fx.controller.markers().cluster(merged), Some(split[0]));
        for &old in &split {
            assert_eq!(fx.controller.markers().cluster(old), Some(merged));
            assert_eq!(
                fx.controller.markers().new_coordinate(old),
                Some(merged_at)
            );
        }

        // Halfway through, each leaving view is halfway to the merged
        // cluster.
        let starts: Vec<Coordinate> = split
            .iter()
            .map(|&old| fx.controller.markers().coordinate(old).unwrap())
            .collect();
        assert!(fx.controller.update(fx.at(1) + STEP / 2));
        for (&old, &from) in split.iter().zip(&starts) {
            let map = fx.controller.map_view();
            let view = map.view(map.view_for_marker(old).unwrap()).unwrap();
            let expected = from.lerp(merged_at, 0.5);
            assert!(view.coordinate().degrees_to(expected) < 1e-9);
        }

        assert!(!fx.controller.update(fx.at(2)));
        assert_eq!(fx.controller.visible_clusters(), &[merged]);
        assert_eq!(fx.controller.map_view().len(), 1);
    }

    #[test]
    fn test_change_after_idle_gap_animates_from_its_own_time() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let old = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();
        let old = old.added[0];
        assert!(!fx.controller.update(fx.at(1)));

        // The host stops ticking; the next change arrives much later.
        let later = fx.start + Duration::from_secs(10);
        let specs = fx.zoomed_in();
        let diff = fx.controller.apply_clustering(specs, later).unwrap();
        assert_eq!(fx.controller.scheduler().now(), later);

        assert!(fx.controller.update(later + Duration::from_millis(16)));
        for &new in &diff.added {
            assert_eq!(fx.state_of(new), Some(TransitionState::AnimatingIn));
        }
        assert_eq!(fx.state_of(old), Some(TransitionState::AnimatingOut));
        assert!(fx.controller.markers().contains(old));

        assert!(!fx.controller.update(later + STEP));
        assert!(!fx.controller.markers().contains(old));
        for &new in &diff.added {
            assert_eq!(fx.state_of(new), Some(TransitionState::Settled));
        }
    }

    #[test]
    fn test_unchanged_membership_is_kept() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_in();
        let first = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();
        let _ = fx.controller.update(fx.at(1));

        let specs = fx.zoomed_in();
        let second = fx.controller.apply_clustering(specs, fx.at(1)).unwrap();
        assert!(second.is_empty());
        assert_eq!(second.kept, first.added);
        assert!(fx.controller.scheduler().is_idle());
        assert_eq!(fx.controller.map_view().len(), 2);
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let _ = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();
        let visible = fx.controller.visible_clusters().to_vec();

        let twice = vec![fx.spec(&[0, 1]), fx.spec(&[1, 2])];
        assert!(matches!(
            fx.controller.apply_clustering(twice, fx.at(0)),
            Err(ClusterError::DuplicateMember(_))
        ));

        let removed = fx.controller.remove_marker(fx.markers[3]).unwrap();
        let stale = vec![ClusterSpec::new(
            Coordinate::new(53.0, 10.0),
            vec![removed.id()],
        )];
        assert!(matches!(
            fx.controller.apply_clustering(stale, fx.at(0)),
            Err(ClusterError::UnknownMarker(_))
        ));

        let off_map = vec![ClusterSpec::new(
            Coordinate::new(123.0, 0.0),
            vec![fx.markers[0]],
        )];
        assert!(matches!(
            fx.controller.apply_clustering(off_map, fx.at(0)),
            Err(ClusterError::InvalidCoordinate { .. })
        ));

        assert_eq!(fx.controller.visible_clusters(), visible.as_slice());
        assert_eq!(fx.controller.map_view().len(), 1);
    }

    #[test]
    fn test_markers_left_out_lose_their_cluster() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let _ = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();

        let specs = vec![fx.spec(&[0, 1])];
        let _ = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();
        assert_eq!(fx.controller.markers().cluster(fx.markers[2]), None);
        assert_eq!(fx.controller.markers().cluster(fx.markers[3]), None);
        assert!(fx.controller.markers().cluster(fx.markers[0]).is_some());
    }

    #[test]
    fn test_empty_specs_are_ignored() {
        let mut fx = Fixture::new();
        let specs = vec![ClusterSpec::new(Coordinate::default(), Vec::new())];
        let diff = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();
        assert!(diff.is_empty());
        assert!(fx.controller.visible_clusters().is_empty());
    }

    #[test]
    fn test_overlapping_passes_settle_cleanly() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let _ = fx.controller.apply_clustering(specs, fx.at(0)).unwrap();
        let _ = fx.controller.update(fx.at(1));

        // Zoom in, then back out before the first transition finishes.
        let specs = fx.zoomed_in();
        let _ = fx.controller.apply_clustering(specs, fx.at(1)).unwrap();
        assert!(fx.controller.update(fx.at(1) + STEP / 3));
        let specs = fx.zoomed_out();
        let last = fx.controller.apply_clustering(specs, fx.at(1) + STEP / 3).unwrap();

        assert!(!fx.controller.update(fx.at(3)));
        assert!(fx.controller.scheduler().is_idle());
        assert_eq!(fx.controller.visible_clusters(), last.added.as_slice());
        assert_eq!(fx.controller.map_view().len(), 1);
        assert_eq!(fx.controller.markers().len(), 5);
        assert_eq!(
            fx.state_of(last.added[0]),
            Some(TransitionState::Settled)
        );
    }

    #[test]
    fn test_remove_marker_rejects_clusters() {
        let mut fx = Fixture::new();
        let specs = fx.zoomed_out();
        let cluster = fx.controller.apply_clustering(specs, fx.at(0)).unwrap().added[0];
        assert!(matches!(
            fx.controller.remove_marker(cluster),
            Err(ClusterError::UnknownMarker(_))
        ));
        assert!(fx.controller.remove_marker(fx.markers[0]).is_ok());
        assert!(fx.controller.remove_marker(fx.markers[0]).is_err());
    }

    #[test]
    fn test_add_marker_validates_coordinate() {
        let mut fx = Fixture::new();
        assert!(fx.controller.add_marker(Coordinate::new(0.0, 200.0)).is_err());
    }

    #[test]
    fn test_with_options_uses_configured_animator() {
        let mut options = Options::default();
        options.animation.animator = crate::options::AnimatorKind::FadeInOut;
        let controller = MapClusterController::with_options(&options).unwrap();
        assert_eq!(controller.animator().name(), "fade_in_out");

        options.animation.duration_secs = -1.0;
        assert!(MapClusterController::with_options(&options).is_err());
    }
}
