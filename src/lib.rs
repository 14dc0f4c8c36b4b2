// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Cluster tracking and animated transitions for clustered map markers.
//!
//! An external clustering algorithm decides which individual markers merge
//! into a cluster marker at the current zoom level. This crate records the
//! reverse link from each marker to the cluster that currently represents
//! it, and choreographs the visual hand-over when the clustering changes:
//! new cluster views emerge from the cluster they split off, vanishing ones
//! collapse into the cluster that absorbed them, and nothing is discarded
//! while it is still on screen.
//!
//! # Key entry points
//!
//! - [`marker::MarkerStore`] - marker arena carrying the per-marker
//!   [`marker::ClusterTracker`] payload with weak cluster back-references
//! - [`animation::TransitionAnimator`] - the add/remove choreography
//!   contract, with [`animation::MoveInOutAnimator`] and
//!   [`animation::FadeInOutAnimator`] strategies
//! - [`animation::TransitionScheduler`] - cooperative, single-threaded
//!   animation loop advanced by the host's event loop
//! - [`controller::MapClusterController`] - reference driver that diffs
//!   cluster membership and runs the protocol end to end
//! - [`options::Options`] - TOML-backed configuration
//!
//! # Threading
//!
//! Everything runs on the thread that drives the map's event loop. Animator
//! calls only schedule work; the animation and its completion handler run
//! inside later [`controller::MapClusterController::update`] calls.

pub mod animation;
pub mod controller;
pub mod error;
pub mod geo;
pub mod marker;
pub mod options;
pub mod view;

pub use error::ClusterError;
