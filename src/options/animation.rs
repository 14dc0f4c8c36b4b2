use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::animation::{
    checked_duration, shared, EasingFunction, FadeInOutAnimator,
    MoveInOutAnimator, SharedAnimator,
};
use crate::error::ClusterError;

/// Which transition strategy to use.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AnimatorKind {
    /// Views emerge from, and collapse into, their parent cluster.
    #[default]
    MoveInOut,
    /// Views fade in and out in place.
    FadeInOut,
}

/// Cluster transition settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct AnimationOptions {
    /// Transition strategy.
    pub animator: AnimatorKind,
    /// Length of one transition in seconds.
    pub duration_secs: f64,
    /// Easing curve for `move_in_out`. Fades are always linear.
    pub easing: EasingFunction,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            animator: AnimatorKind::default(),
            duration_secs: 0.2,
            easing: EasingFunction::default(),
        }
    }
}

impl AnimationOptions {
    /// Build the configured animator.
    pub fn build_animator(&self) -> Result<SharedAnimator, ClusterError> {
        let duration = checked_duration(self.duration_secs)?;
        Ok(match self.animator {
            AnimatorKind::MoveInOut => shared(
                MoveInOutAnimator::with_duration(duration)
                    .with_easing(self.easing),
            ),
            AnimatorKind::FadeInOut => {
                shared(FadeInOutAnimator::with_duration(duration))
            }
        })
    }
}
