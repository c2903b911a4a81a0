//! Time-based interpolation of paint instructions.
//!
//! The [`Animator`] keeps one track per entity. A new commit that touches an entity still in
//! flight restarts its track from the currently sampled shape, so interrupted transitions never
//! jump.

use crate::diff::{EntityId, Phase, PaintInstruction, Shape};
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Duration;

/// Maps `t` in [0, 1] to progress in [0, 1].
pub type EasingFn = fn(f64) -> f64;

#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Cubic ease-in-out, the default for tree transitions.
#[inline]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// One interpolated paint state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub entity: EntityId,
    pub phase: Phase,
    pub shape: Shape,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
struct Track {
    instruction: PaintInstruction,
    elapsed: Duration,
}

impl Track {
    fn progress(&self, duration: Duration) -> f64 {
        (self.elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn sample(&self, duration: Duration, easing: EasingFn) -> Frame {
        let ins = &self.instruction;
        let progress = self.progress(duration);
        if progress >= 1.0 {
            return Frame {
                entity: ins.entity.clone(),
                phase: ins.phase,
                shape: ins.transition_to.clone(),
                opacity: ins.opacity_to,
            };
        }
        let t = easing(progress);
        Frame {
            entity: ins.entity.clone(),
            phase: ins.phase,
            shape: ins.transition_from.lerp(&ins.transition_to, t),
            opacity: ins.opacity_from + (ins.opacity_to - ins.opacity_from) * t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Animator {
    duration: Duration,
    easing: EasingFn,
    tracks: IndexMap<EntityId, Track>,
}

impl Animator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: ease_cubic_in_out,
            tracks: IndexMap::new(),
        }
    }

    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Starts (or restarts) a track for every instruction of a commit.
    pub fn apply(&mut self, instructions: &[PaintInstruction]) {
        for ins in instructions {
            let mut ins = ins.clone();
            if let Some(track) = self.tracks.get(&ins.entity) {
                let current = track.sample(self.duration, self.easing);
                ins.transition_from = current.shape;
                ins.opacity_from = current.opacity;
            }
            self.tracks.insert(
                ins.entity.clone(),
                Track {
                    instruction: ins,
                    elapsed: Duration::ZERO,
                },
            );
        }
    }

    /// Advances every track by `dt`. Exits that reach their end are removed.
    pub fn tick(&mut self, dt: Duration) {
        let duration = self.duration;
        for track in self.tracks.values_mut() {
            track.elapsed = track.elapsed.saturating_add(dt).min(duration);
        }
        self.tracks
            .retain(|_, t| !(t.instruction.phase == Phase::Exit && t.elapsed >= duration));
    }

    pub fn frame(&self, entity: &EntityId) -> Option<Frame> {
        self.tracks
            .get(entity)
            .map(|t| t.sample(self.duration, self.easing))
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.tracks
            .values()
            .map(|t| t.sample(self.duration, self.easing))
            .collect()
    }

    pub fn is_animating(&self) -> bool {
        self.tracks.values().any(|t| t.elapsed < self.duration)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
