//! Per-marker cluster tracking payload.

use super::MarkerId;
use crate::geo::Coordinate;

/// Side-state attached to a marker the first time clustering touches it.
///
/// `owning_cluster` is an index into the [`MarkerStore`](super::MarkerStore),
/// not an owning handle: resolve it with
/// [`MarkerStore::cluster`](super::MarkerStore::cluster), which reports
/// absent once the cluster has been removed.
///
/// The previous/new coordinates are optional animation endpoints. Nothing
/// in the crate's animators reads them; they are kept for strategies that
/// want explicit interpolation paths.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClusterTracker {
    owning_cluster: Option<MarkerId>,
    previous_coordinate: Option<Coordinate>,
    new_coordinate: Option<Coordinate>,
}

impl ClusterTracker {
    /// Last recorded owner, unresolved. May name a removed cluster.
    #[must_use]
    pub fn recorded_cluster(&self) -> Option<MarkerId> {
        self.owning_cluster
    }

    /// Coordinate the marker is animating away from, if recorded.
    #[must_use]
    pub fn previous_coordinate(&self) -> Option<Coordinate> {
        self.previous_coordinate
    }

    /// Coordinate the marker is animating toward, if recorded.
    #[must_use]
    pub fn new_coordinate(&self) -> Option<Coordinate> {
        self.new_coordinate
    }

    pub(super) fn set_cluster(&mut self, owner: Option<MarkerId>) {
        self.owning_cluster = owner;
    }

    pub(super) fn set_previous_coordinate(&mut self, coordinate: Coordinate) {
        self.previous_coordinate = Some(coordinate);
    }

    pub(super) fn set_new_coordinate(&mut self, coordinate: Coordinate) {
        self.new_coordinate = Some(coordinate);
    }
}
