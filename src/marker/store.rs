//! Marker arena with intrusive tracker payloads.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{ClusterTracker, Marker, MarkerId, MarkerKind};
use crate::error::ClusterError;
use crate::geo::{Coordinate, Located};

struct MarkerEntry {
    marker: Marker,
    /// Created lazily on first tracker write; dropped with the entry.
    tracker: Option<ClusterTracker>,
}

/// Owns every marker and its [`ClusterTracker`] payload.
///
/// Clusters hold their members as a forward list of IDs; members point
/// back at their cluster through the tracker, also by ID. Neither direction
/// keeps the other alive, and lookups of a removed ID return `None`.
#[derive(Default)]
pub struct MarkerStore {
    entries: FxHashMap<MarkerId, MarkerEntry>,
    next_id: u64,
}

impl MarkerStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Marker management --

    /// Add an individual marker.
    pub fn insert_individual(&mut self, coordinate: Coordinate) -> MarkerId {
        self.insert(coordinate, MarkerKind::Individual)
    }

    /// Add a cluster marker aggregating `members`.
    ///
    /// Every member must be a distinct, live individual marker.
    pub fn insert_cluster(
        &mut self,
        coordinate: Coordinate,
        members: Vec<MarkerId>,
    ) -> Result<MarkerId, ClusterError> {
        self.validate_members(&members)?;
        Ok(self.insert(coordinate, MarkerKind::Cluster { members }))
    }

    fn insert(&mut self, coordinate: Coordinate, kind: MarkerKind) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        let entry = MarkerEntry {
            marker: Marker {
                id,
                coordinate,
                kind,
            },
            tracker: None,
        };
        let _ = self.entries.insert(id, entry);
        id
    }

    /// Remove a marker together with its tracker payload.
    ///
    /// Any tracker that recorded this marker as its cluster resolves to
    /// absent from now on.
    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        self.entries.remove(&id).map(|entry| entry.marker)
    }

    /// Look up a marker.
    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.entries.get(&id).map(|entry| &entry.marker)
    }

    /// Whether `id` names a live marker.
    #[must_use]
    pub fn contains(&self, id: MarkerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Coordinate of a live marker.
    #[must_use]
    pub fn coordinate(&self, id: MarkerId) -> Option<Coordinate> {
        self.get(id).map(Located::coordinate)
    }

    /// Number of live markers of either kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// IDs of all live individual markers, in allocation order.
    #[must_use]
    pub fn individual_ids(&self) -> Vec<MarkerId> {
        let mut ids: Vec<MarkerId> = self
            .entries
            .values()
            .filter(|entry| !entry.marker.is_cluster())
            .map(|entry| entry.marker.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Whether every live member of `cluster` sits on the same coordinate.
    ///
    /// Such clusters cannot be split by zooming in.
    #[must_use]
    pub fn is_unique_location(&self, cluster: MarkerId) -> bool {
        let Some(marker) = self.get(cluster) else {
            return false;
        };
        let mut coords = marker
            .members()
            .iter()
            .filter_map(|&member| self.coordinate(member));
        let Some(first) = coords.next() else {
            return false;
        };
        coords.all(|c| c == first)
    }

    // -- Tracker payload --

    /// Tracker payload of a marker, if one was ever written.
    #[must_use]
    pub fn tracker(&self, id: MarkerId) -> Option<&ClusterTracker> {
        self.entries.get(&id)?.tracker.as_ref()
    }

    /// Number of markers that carry a tracker payload.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.tracker.is_some())
            .count()
    }

    fn tracker_mut(
        &mut self,
        id: MarkerId,
    ) -> Result<&mut ClusterTracker, ClusterError> {
        self.entries
            .get_mut(&id)
            .map(|entry| entry.tracker.get_or_insert_with(Default::default))
            .ok_or(ClusterError::UnknownMarker(id))
    }

    /// Record `owner` as the cluster currently representing `marker`.
    ///
    /// Overwrites any previous owner. Setting the same owner again is a
    /// no-op.
    pub fn set_cluster(
        &mut self,
        marker: MarkerId,
        owner: MarkerId,
    ) -> Result<(), ClusterError> {
        match self.get(owner) {
            None => return Err(ClusterError::UnknownMarker(owner)),
            Some(m) if !m.is_cluster() => {
                return Err(ClusterError::NotACluster(owner))
            }
            Some(_) => {}
        }
        self.tracker_mut(marker)?.set_cluster(Some(owner));
        log::trace!("{marker} now tracked by {owner}");
        Ok(())
    }

    /// Forget the owning cluster of `marker`. Does not create a payload.
    pub fn clear_cluster(&mut self, marker: MarkerId) -> Result<(), ClusterError> {
        let entry = self
            .entries
            .get_mut(&marker)
            .ok_or(ClusterError::UnknownMarker(marker))?;
        if let Some(tracker) = entry.tracker.as_mut() {
            tracker.set_cluster(None);
        }
        Ok(())
    }

    /// The cluster currently representing `marker`.
    ///
    /// `None` if never set, if `marker` is unknown, or if the recorded
    /// cluster has since been removed.
    #[must_use]
    pub fn cluster(&self, marker: MarkerId) -> Option<MarkerId> {
        self.tracker(marker)?
            .recorded_cluster()
            .filter(|owner| self.contains(*owner))
    }

    /// Coordinate of the cluster currently representing `marker`.
    #[must_use]
    pub fn cluster_coordinate(&self, marker: MarkerId) -> Option<Coordinate> {
        self.cluster(marker).and_then(|owner| self.coordinate(owner))
    }

    /// Record the coordinate `marker` is animating away from.
    pub fn set_previous_coordinate(
        &mut self,
        marker: MarkerId,
        coordinate: Coordinate,
    ) -> Result<(), ClusterError> {
        self.tracker_mut(marker)?
            .set_previous_coordinate(coordinate);
        Ok(())
    }

    /// Coordinate `marker` is animating away from, if recorded.
    #[must_use]
    pub fn previous_coordinate(&self, marker: MarkerId) -> Option<Coordinate> {
        self.tracker(marker)?.previous_coordinate()
    }

    /// Record the coordinate `marker` is animating toward.
    pub fn set_new_coordinate(
        &mut self,
        marker: MarkerId,
        coordinate: Coordinate,
    ) -> Result<(), ClusterError> {
        self.tracker_mut(marker)?.set_new_coordinate(coordinate);
        Ok(())
    }

    /// Coordinate `marker` is animating toward, if recorded.
    #[must_use]
    pub fn new_coordinate(&self, marker: MarkerId) -> Option<Coordinate> {
        self.tracker(marker)?.new_coordinate()
    }

    /// Check that `members` are distinct live individual markers.
    pub(crate) fn validate_members<'a, I>(
        &self,
        members: I,
    ) -> Result<(), ClusterError>
    where
        I: IntoIterator<Item = &'a MarkerId>,
    {
        let mut seen = FxHashSet::default();
        for &member in members {
            match self.get(member) {
                None => return Err(ClusterError::UnknownMarker(member)),
                Some(m) if m.is_cluster() => {
                    return Err(ClusterError::UnknownMarker(member))
                }
                Some(_) => {}
            }
            if !seen.insert(member) {
                return Err(ClusterError::DuplicateMember(member));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MarkerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerStore")
            .field("markers", &self.entries.len())
            .field("tracked", &self.tracked_count())
            .finish_non_exhaustive()
    }
}
