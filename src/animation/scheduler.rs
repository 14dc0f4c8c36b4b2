//! Cooperative, single-threaded animation loop.
//!
//! Animators hand work to the scheduler and return; the host drives it by
//! calling [`TransitionScheduler::advance`] from its event loop (or with a
//! simulated clock in tests). Removal animations are grouped into batches
//! whose single completion handler is released when the last member
//! finishes.

use std::time::Duration;

use rustc_hash::FxHashMap;
use web_time::Instant;

use super::easing::EasingFunction;
use super::traits::CompletionHandler;
use crate::error::ClusterError;
use crate::geo::Coordinate;
use crate::view::{AnnotationView, MapView, TransitionState, ViewId};

/// Start and end values of one view's animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    /// Coordinate at progress 0.
    pub from: Coordinate,
    /// Coordinate at progress 1.
    pub to: Coordinate,
    /// Opacity at progress 0.
    pub from_alpha: f32,
    /// Opacity at progress 1.
    pub to_alpha: f32,
}

impl Track {
    /// Fully opaque movement from `from` to `to`.
    #[must_use]
    pub const fn moving(from: Coordinate, to: Coordinate) -> Self {
        Self {
            from,
            to,
            from_alpha: 1.0,
            to_alpha: 1.0,
        }
    }

    /// Opacity change in place.
    #[must_use]
    pub const fn fading(at: Coordinate, from_alpha: f32, to_alpha: f32) -> Self {
        Self {
            from: at,
            to: at,
            from_alpha,
            to_alpha,
        }
    }

    fn sample(&self, eased: f32) -> (Coordinate, f32) {
        let coordinate = self.from.lerp(self.to, f64::from(eased));
        let alpha = self.from_alpha + (self.to_alpha - self.from_alpha) * eased;
        (coordinate, alpha)
    }
}

/// Handle for one removal batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

impl Direction {
    const fn end_state(self) -> TransitionState {
        match self {
            Self::In => TransitionState::Settled,
            Self::Out => TransitionState::Removed,
        }
    }
}

struct ScheduledAnimation {
    view: ViewId,
    direction: Direction,
    start_time: Instant,
    duration: Duration,
    easing: EasingFunction,
    track: Track,
    /// Removal batches waiting on this view (more than one when a later
    /// batch names a view that is already leaving).
    batches: Vec<BatchId>,
}

impl ScheduledAnimation {
    /// Normalized progress (0.0 to 1.0).
    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start_time);

        if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        }
    }

    fn apply(&self, view: &mut AnnotationView, progress: f32) {
        let (coordinate, alpha) = if progress >= 1.0 {
            (self.track.to, self.track.to_alpha)
        } else {
            self.track.sample(self.easing.evaluate(progress))
        };
        view.set_coordinate(coordinate);
        view.set_alpha(alpha);
    }
}

struct RemovalBatch {
    remaining: usize,
    /// Set once the animator has scheduled every member.
    sealed: bool,
    handler: Option<CompletionHandler>,
}

/// Runs view animations on the caller's thread.
pub struct TransitionScheduler {
    now: Instant,
    animations: Vec<ScheduledAnimation>,
    batches: FxHashMap<BatchId, RemovalBatch>,
    next_batch: u64,
}

impl TransitionScheduler {
    /// Scheduler whose clock starts at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Scheduler whose clock starts at `now`. Used with a simulated clock.
    #[must_use]
    pub fn starting_at(now: Instant) -> Self {
        Self {
            now,
            animations: Vec::new(),
            batches: FxHashMap::default(),
            next_batch: 0,
        }
    }

    /// Time of the last [`advance`](Self::advance); new animations start
    /// here.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Number of animations still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.animations.len()
    }

    /// Number of removal batches whose completion has not fired yet.
    #[must_use]
    pub fn open_batches(&self) -> usize {
        self.batches.len()
    }

    /// Whether nothing is running and no completion is outstanding.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.animations.is_empty() && self.batches.is_empty()
    }

    /// Whether `view` has a running animation.
    #[must_use]
    pub fn is_animating(&self, view: ViewId) -> bool {
        self.animations.iter().any(|a| a.view == view)
    }

    /// Start moving a `Pending` view along `track`.
    ///
    /// The view is placed at the track's start immediately.
    pub fn schedule_in(
        &mut self,
        map_view: &mut MapView,
        view: ViewId,
        track: Track,
        duration: Duration,
        easing: EasingFunction,
    ) -> Result<(), ClusterError> {
        let target = map_view
            .view_mut(view)
            .ok_or(ClusterError::UnknownView(view))?;
        target.advance_to(TransitionState::AnimatingIn)?;
        let animation = ScheduledAnimation {
            view,
            direction: Direction::In,
            start_time: self.now,
            duration,
            easing,
            track,
            batches: Vec::new(),
        };
        animation.apply(target, 0.0);
        self.animations.push(animation);
        Ok(())
    }

    /// Open a removal batch. Its handler fires after every view scheduled
    /// into it has been removed and the batch has been
    /// [closed](Self::close_batch).
    pub fn open_batch(&mut self, handler: CompletionHandler) -> BatchId {
        let id = BatchId(self.next_batch);
        self.next_batch += 1;
        let batch = RemovalBatch {
            remaining: 0,
            sealed: false,
            handler: Some(handler),
        };
        let _ = self.batches.insert(id, batch);
        id
    }

    /// Start moving a view out along `track` as part of `batch`.
    ///
    /// A view still animating in is first brought to `Settled`; a view
    /// already animating out keeps its animation and `batch` waits for it
    /// too. Views already removed are skipped.
    pub fn schedule_out(
        &mut self,
        map_view: &mut MapView,
        view: ViewId,
        track: Track,
        duration: Duration,
        easing: EasingFunction,
        batch: BatchId,
    ) -> Result<(), ClusterError> {
        let state = map_view
            .view(view)
            .ok_or(ClusterError::UnknownView(view))?
            .state();
        match state {
            TransitionState::Removed => {
                log::debug!("{view} already removed; nothing to animate");
                return Ok(());
            }
            TransitionState::AnimatingOut => {
                if let Some(running) = self
                    .animations
                    .iter_mut()
                    .find(|a| a.view == view && a.direction == Direction::Out)
                {
                    running.batches.push(batch);
                    self.retain(batch);
                }
                return Ok(());
            }
            TransitionState::AnimatingIn => self.finish_in(map_view, view)?,
            TransitionState::Pending => {
                let target = map_view
                    .view_mut(view)
                    .ok_or(ClusterError::UnknownView(view))?;
                target.advance_to(TransitionState::AnimatingIn)?;
                target.advance_to(TransitionState::Settled)?;
            }
            TransitionState::Settled => {}
        }

        let target = map_view
            .view_mut(view)
            .ok_or(ClusterError::UnknownView(view))?;
        target.advance_to(TransitionState::AnimatingOut)?;
        let animation = ScheduledAnimation {
            view,
            direction: Direction::Out,
            start_time: self.now,
            duration,
            easing,
            track,
            batches: vec![batch],
        };
        animation.apply(target, 0.0);
        self.animations.push(animation);
        self.retain(batch);
        Ok(())
    }

    /// Seal `batch`. Returns its handler if nothing in it is still running;
    /// the caller must invoke it.
    pub fn close_batch(&mut self, batch: BatchId) -> Option<CompletionHandler> {
        let entry = self.batches.get_mut(&batch)?;
        entry.sealed = true;
        if entry.remaining > 0 {
            return None;
        }
        self.batches.remove(&batch)?.handler
    }

    /// Move the clock to `now` and step every running animation.
    ///
    /// Returns the handlers of batches that finished during this step, in
    /// completion order. The caller must invoke each one.
    pub fn advance(
        &mut self,
        now: Instant,
        map_view: &mut MapView,
    ) -> Vec<CompletionHandler> {
        if now > self.now {
            self.now = now;
        }

        let animations = std::mem::take(&mut self.animations);
        let mut finished = Vec::new();
        for animation in animations {
            let progress = animation.progress(self.now);
            let Some(view) = map_view.view_mut(animation.view) else {
                log::debug!("{} discarded mid-animation", animation.view);
                finished.extend(animation.batches);
                continue;
            };
            animation.apply(view, progress);
            if progress < 1.0 {
                self.animations.push(animation);
                continue;
            }
            if let Err(e) = view.advance_to(animation.direction.end_state()) {
                log::warn!("finishing {}: {e}", animation.view);
            }
            finished.extend(animation.batches);
        }

        finished
            .into_iter()
            .filter_map(|batch| self.release(batch))
            .collect()
    }

    /// [`advance`](Self::advance) by `dt` past the current clock.
    pub fn advance_by(
        &mut self,
        dt: Duration,
        map_view: &mut MapView,
    ) -> Vec<CompletionHandler> {
        let now = self.now + dt;
        self.advance(now, map_view)
    }

    fn retain(&mut self, batch: BatchId) {
        if let Some(entry) = self.batches.get_mut(&batch) {
            entry.remaining += 1;
        }
    }

    fn release(&mut self, batch: BatchId) -> Option<CompletionHandler> {
        let entry = self.batches.get_mut(&batch)?;
        entry.remaining = entry.remaining.saturating_sub(1);
        if entry.remaining > 0 || !entry.sealed {
            return None;
        }
        self.batches.remove(&batch)?.handler
    }

    /// Jump an in-progress add animation to its end.
    fn finish_in(
        &mut self,
        map_view: &mut MapView,
        view: ViewId,
    ) -> Result<(), ClusterError> {
        let target = map_view
            .view_mut(view)
            .ok_or(ClusterError::UnknownView(view))?;
        if let Some(idx) = self
            .animations
            .iter()
            .position(|a| a.view == view && a.direction == Direction::In)
        {
            let animation = self.animations.remove(idx);
            animation.apply(target, 1.0);
        }
        log::trace!("{view}: add animation preempted by removal");
        target.advance_to(TransitionState::Settled)
    }
}

impl Default for TransitionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransitionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionScheduler")
            .field("in_flight", &self.animations.len())
            .field("open_batches", &self.batches.len())
            .finish_non_exhaustive()
    }
}
