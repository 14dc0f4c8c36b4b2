//! Matching a new clustering against the clusters currently on screen.

use rustc_hash::FxHashMap;

use crate::geo::Coordinate;
use crate::marker::{MarkerId, MarkerStore};

/// One cluster as produced by the external clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    /// Where the cluster marker is drawn.
    pub coordinate: Coordinate,
    /// Individual markers it aggregates.
    pub members: Vec<MarkerId>,
}

impl ClusterSpec {
    /// Cluster at an explicit coordinate.
    #[must_use]
    pub fn new(coordinate: Coordinate, members: Vec<MarkerId>) -> Self {
        Self {
            coordinate,
            members,
        }
    }

    /// Cluster drawn at the centroid of its live members.
    ///
    /// `None` if none of the members are in `markers`.
    #[must_use]
    pub fn at_centroid(
        markers: &MarkerStore,
        members: Vec<MarkerId>,
    ) -> Option<Self> {
        let coordinate = Coordinate::centroid(
            members.iter().filter_map(|&m| markers.coordinate(m)),
        )?;
        Some(Self::new(coordinate, members))
    }
}

/// Outcome of one [`apply_clustering`] pass.
///
/// [`apply_clustering`]: super::MapClusterController::apply_clustering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusteringDiff {
    /// Visible clusters whose membership did not change.
    pub kept: Vec<MarkerId>,
    /// Cluster markers created by this pass.
    pub added: Vec<MarkerId>,
    /// Cluster markers leaving the map (still live until their removal
    /// animation completes).
    pub removed: Vec<MarkerId>,
}

impl ClusteringDiff {
    /// Whether the pass changed nothing on screen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// For each spec, the visible cluster with exactly its members (if any),
/// plus the visible clusters no spec matched.
pub(super) struct Matching {
    pub(super) kept: Vec<Option<MarkerId>>,
    pub(super) removed: Vec<MarkerId>,
}

fn membership_key(members: &[MarkerId]) -> Vec<MarkerId> {
    let mut key = members.to_vec();
    key.sort_unstable();
    key
}

pub(super) fn match_clusters(
    markers: &MarkerStore,
    visible: &[MarkerId],
    specs: &[ClusterSpec],
) -> Matching {
    let mut by_members: FxHashMap<Vec<MarkerId>, MarkerId> = visible
        .iter()
        .filter_map(|&id| {
            let cluster = markers.get(id)?;
            Some((membership_key(cluster.members()), id))
        })
        .collect();

    let kept = specs
        .iter()
        .map(|spec| by_members.remove(&membership_key(&spec.members)))
        .collect();

    let removed = visible
        .iter()
        .copied()
        .filter(|id| by_members.values().any(|left| left == id))
        .collect();

    Matching { kept, removed }
}
