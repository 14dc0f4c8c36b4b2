//! Transition animation for clustering changes.
//!
//! - [`TransitionAnimator`]: the controller-facing contract
//! - [`MoveInOutAnimator`], [`FadeInOutAnimator`]: concrete strategies
//! - [`TransitionScheduler`]: cooperative loop that runs the animations and
//!   aggregates removal completions

mod choreography;
mod easing;
mod fade_in_out;
mod move_in_out;
mod scheduler;
mod traits;

use std::time::Duration;

pub use easing::EasingFunction;
pub use fade_in_out::FadeInOutAnimator;
pub use move_in_out::MoveInOutAnimator;
pub use scheduler::{BatchId, Track, TransitionScheduler};
pub use traits::{shared, CompletionHandler, SharedAnimator, TransitionAnimator};

use crate::error::ClusterError;

/// Duration used by both built-in animators unless configured.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(200);

/// Convert seconds to a [`Duration`], rejecting negative or non-finite
/// values.
pub fn checked_duration(secs: f64) -> Result<Duration, ClusterError> {
    if secs < 0.0 {
        return Err(ClusterError::InvalidDuration(secs));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ClusterError::InvalidDuration(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_duration() {
        assert_eq!(
            checked_duration(0.3).unwrap(),
            Duration::from_secs_f64(0.3)
        );
        assert_eq!(checked_duration(0.0).unwrap(), Duration::ZERO);
        assert!(matches!(
            checked_duration(-0.1),
            Err(ClusterError::InvalidDuration(_))
        ));
        assert!(checked_duration(f64::NAN).is_err());
        assert!(checked_duration(f64::INFINITY).is_err());
    }
}
