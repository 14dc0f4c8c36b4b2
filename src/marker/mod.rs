//! Markers, the marker arena, and the per-marker cluster tracker payload.
//!
//! Every marker lives in a [`MarkerStore`] keyed by [`MarkerId`]. IDs are
//! allocated monotonically and never reused, so an ID held after its marker
//! was removed simply fails to resolve. The [`ClusterTracker`] payload
//! stores its owning cluster as such an ID, which gives weak-reference
//! semantics without any ownership edge between a member and its cluster.

mod store;
mod tracker;

use std::fmt;
use std::hash::{Hash, Hasher};

pub use store::MarkerStore;
pub use tracker::ClusterTracker;

use crate::geo::{Coordinate, Located};

/// Stable identity of a marker within one [`MarkerStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

impl MarkerId {
    /// Raw numeric value, for logging and external keying.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Individual point or cluster representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// A single location.
    Individual,
    /// Aggregates the listed individual markers.
    Cluster {
        /// Member markers, in the order the clustering algorithm gave them.
        members: Vec<MarkerId>,
    },
}

/// A location-bearing object shown on the map.
///
/// Equality and hashing use the [`MarkerId`] only. The tracker payload is
/// kept beside the marker in the store, never inside it.
#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    coordinate: Coordinate,
    kind: MarkerKind,
}

impl Marker {
    /// This marker's identity.
    #[must_use]
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Individual or cluster.
    #[must_use]
    pub fn kind(&self) -> &MarkerKind {
        &self.kind
    }

    /// Whether this marker represents a cluster.
    #[must_use]
    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, MarkerKind::Cluster { .. })
    }

    /// Cluster members; empty for individual markers.
    #[must_use]
    pub fn members(&self) -> &[MarkerId] {
        match &self.kind {
            MarkerKind::Individual => &[],
            MarkerKind::Cluster { members } => members,
        }
    }
}

impl Located for Marker {
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Marker {}

impl Hash for Marker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
