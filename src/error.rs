//! Crate-level error types.

use std::fmt;

use crate::marker::MarkerId;
use crate::view::{TransitionState, ViewId};

/// Errors produced by the map-cluster crate.
///
/// Absence is not an error here: a marker with no owning cluster, or an
/// empty transition batch, is reported through `Option`/no-op paths.
#[derive(Debug)]
pub enum ClusterError {
    /// The marker is not (or no longer) in the store.
    UnknownMarker(MarkerId),
    /// The marker exists but is not a cluster marker.
    NotACluster(MarkerId),
    /// The marker was listed in more than one cluster.
    DuplicateMember(MarkerId),
    /// The view is not (or no longer) on the map.
    UnknownView(ViewId),
    /// The view is still animating and cannot be discarded yet.
    ViewBusy(ViewId),
    /// A view was asked to take a state change outside its lifecycle.
    InvalidTransition {
        /// State the view was in.
        from: TransitionState,
        /// State that was requested.
        to: TransitionState,
    },
    /// Animation duration was negative or not finite (seconds).
    InvalidDuration(f64),
    /// Latitude/longitude outside the valid range or not finite.
    InvalidCoordinate {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMarker(id) => write!(f, "unknown marker {id}"),
            Self::NotACluster(id) => {
                write!(f, "marker {id} is not a cluster")
            }
            Self::DuplicateMember(id) => {
                write!(f, "marker {id} assigned to more than one cluster")
            }
            Self::UnknownView(id) => write!(f, "unknown view {id}"),
            Self::ViewBusy(id) => {
                write!(f, "view {id} is still animating")
            }
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid view transition: {from} -> {to}")
            }
            Self::InvalidDuration(secs) => {
                write!(f, "invalid animation duration: {secs}s")
            }
            Self::InvalidCoordinate {
                latitude,
                longitude,
            } => {
                write!(f, "invalid coordinate: ({latitude}, {longitude})")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for ClusterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClusterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
