//! Lifecycle of an annotation view during cluster transitions.

use std::fmt;

/// Where a view is in its add/remove choreography.
///
/// The lifecycle is a single line:
///
/// ```text
/// Pending -> AnimatingIn -> Settled -> AnimatingOut -> Removed
/// ```
///
/// Every state has at most one successor, so a view can never jump from
/// `Pending` to `Removed` or fall back from `Settled` to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionState {
    /// Materialized but not yet animated.
    #[default]
    Pending,
    /// Moving from its cluster to its own coordinate.
    AnimatingIn,
    /// At rest on the map.
    Settled,
    /// Collapsing into its new cluster.
    AnimatingOut,
    /// Finished leaving; safe to discard.
    Removed,
}

impl TransitionState {
    /// The only state reachable from `self`, or `None` after `Removed`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::AnimatingIn),
            Self::AnimatingIn => Some(Self::Settled),
            Self::Settled => Some(Self::AnimatingOut),
            Self::AnimatingOut => Some(Self::Removed),
            Self::Removed => None,
        }
    }

    /// Whether `self -> to` is an edge of the lifecycle.
    #[must_use]
    pub fn can_advance_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Whether an animation currently owns the view.
    #[must_use]
    pub const fn is_animating(self) -> bool {
        matches!(self, Self::AnimatingIn | Self::AnimatingOut)
    }

    /// Whether the view is at one of the two resting ends of a path.
    #[must_use]
    pub const fn is_at_rest(self) -> bool {
        matches!(self, Self::Settled | Self::Removed)
    }
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::AnimatingIn => "animating-in",
            Self::Settled => "settled",
            Self::AnimatingOut => "animating-out",
            Self::Removed => "removed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TransitionState; 5] = [
        TransitionState::Pending,
        TransitionState::AnimatingIn,
        TransitionState::Settled,
        TransitionState::AnimatingOut,
        TransitionState::Removed,
    ];

    #[test]
    fn test_only_lifecycle_edges_allowed() {
        let allowed: Vec<_> = ALL
            .iter()
            .flat_map(|&from| ALL.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| from.can_advance_to(to))
            .collect();
        assert_eq!(
            allowed,
            vec![
                (TransitionState::Pending, TransitionState::AnimatingIn),
                (TransitionState::AnimatingIn, TransitionState::Settled),
                (TransitionState::Settled, TransitionState::AnimatingOut),
                (TransitionState::AnimatingOut, TransitionState::Removed),
            ]
        );
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!TransitionState::Pending.can_advance_to(TransitionState::Removed));
        assert!(!TransitionState::Settled.can_advance_to(TransitionState::Pending));
        assert!(!TransitionState::Removed.can_advance_to(TransitionState::Pending));
    }

    #[test]
    fn test_rest_and_animating() {
        assert_eq!(TransitionState::default(), TransitionState::Pending);
        assert!(TransitionState::Settled.is_at_rest());
        assert!(TransitionState::Removed.is_at_rest());
        assert!(!TransitionState::Pending.is_at_rest());
        assert!(TransitionState::AnimatingIn.is_animating());
        assert!(TransitionState::AnimatingOut.is_animating());
        assert!(!TransitionState::Settled.is_animating());
    }
}
