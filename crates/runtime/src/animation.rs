//! Time-based interpolation of numeric settings.
//!
//! The controller owns at most one live animation per key. Values are written
//! through [`AnimationTarget::write`], which for a [`SettingsStore`] is a plain
//! `set`, so animated keys flow through the same dirty tracking as user
//! writes.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::time::Time;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::settings::{AnimatableValue, SettingsStore};

/// Easing curves mapping normalized time `[0, 1]` to progress.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    #[default]
    CubicOut,
    CubicInOut,
    SineInOut,
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::SineInOut => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::Custom(f) => f(t),
        }
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Easing::Custom(a), Easing::Custom(b)) => std::ptr::fn_addr_eq(*a, *b),
            (Easing::Custom(_), _) | (_, Easing::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loops {
    Finite(u32),
    Infinite,
}

impl Default for Loops {
    fn default() -> Self {
        Loops::Finite(1)
    }
}

/// Parameters of one animation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween {
    pub to: f64,
    /// Start value; `None` starts from the target's current value.
    pub from: Option<f64>,
    pub duration_s: f64,
    pub easing: Easing,
    pub loops: Loops,
    /// Reverse direction on every other cycle.
    pub yoyo: bool,
}

impl Tween {
    pub fn to(to: f64, duration_s: f64, easing: Easing) -> Self {
        Self {
            to,
            from: None,
            duration_s,
            easing,
            loops: Loops::default(),
            yoyo: false,
        }
    }

    pub fn from(mut self, from: f64) -> Self {
        self.from = Some(from);
        self
    }

    pub fn looping(mut self, loops: Loops, yoyo: bool) -> Self {
        self.loops = loops;
        self.yoyo = yoyo;
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationState {
    Running,
    Completed,
    Stopped,
    /// Superseded by a newer animation on the same key.
    Replaced,
}

/// Observer for one animation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    state: Rc<Cell<AnimationState>>,
}

impl AnimationHandle {
    fn with_state(state: AnimationState) -> Self {
        Self {
            state: Rc::new(Cell::new(state)),
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state.get()
    }

    pub fn is_complete(&self) -> bool {
        self.state.get() != AnimationState::Running
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent<K> {
    /// Emitted once when an animation completes or is stopped. Replaced
    /// animations emit nothing.
    Stopped { key: K, value: f64, completed: bool },
}

/// Something an animation can read from and write to.
pub trait AnimationTarget<K> {
    fn current(&self, key: K) -> Option<f64>;
    fn write(&mut self, key: K, value: f64);
}

impl<K, P, V> AnimationTarget<K> for SettingsStore<K, P, V>
where
    K: Ord + Copy,
    P: Ord + Copy,
    V: AnimatableValue,
{
    fn current(&self, key: K) -> Option<f64> {
        self.number(key)
    }

    fn write(&mut self, key: K, value: f64) {
        self.set(key, V::from_number(value));
    }
}

#[derive(Debug)]
struct Animation {
    from: f64,
    to: f64,
    duration_s: f64,
    easing: Easing,
    start: Time,
    loops: Loops,
    yoyo: bool,
    last: f64,
    state: Rc<Cell<AnimationState>>,
}

impl Animation {
    /// Value at `now` and whether the animation has run out.
    fn sample(&self, now: Time) -> (f64, bool) {
        let cycles = now.since(self.start) / self.duration_s;
        let index = cycles.floor();
        if let Loops::Finite(n) = self.loops {
            let n = n.max(1) as f64;
            if index >= n {
                let last_reversed = self.yoyo && (n as u64 - 1) % 2 == 1;
                return (if last_reversed { self.from } else { self.to }, true);
            }
        }
        let t = cycles - index;
        let p = self.easing.apply(t);
        let reversed = self.yoyo && (index as u64) % 2 == 1;
        let value = if reversed {
            self.to + (self.from - self.to) * p
        } else {
            self.from + (self.to - self.from) * p
        };
        (value, false)
    }
}

/// Per-component animation driver.
#[derive(Debug)]
pub struct AnimationController<K> {
    live: BTreeMap<K, Animation>,
    pending: Vec<AnimationEvent<K>>,
}

impl<K> Default for AnimationController<K> {
    fn default() -> Self {
        Self {
            live: BTreeMap::new(),
            pending: Vec::new(),
        }
    }
}

impl<K: Ord + Copy + std::fmt::Debug> AnimationController<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animates `key` from its current value to `to`.
    pub fn animate(
        &mut self,
        target: &mut impl AnimationTarget<K>,
        key: K,
        to: f64,
        duration_s: f64,
        easing: Easing,
        now: Time,
    ) -> AnimationHandle {
        self.start(target, key, Tween::to(to, duration_s, easing), now)
    }

    /// Starts `tween` on `key`, replacing any live animation on that key.
    ///
    /// A replaced animation is frozen at its value at `now` and never reports
    /// completion. Non-positive durations write `to` immediately.
    pub fn start(
        &mut self,
        target: &mut impl AnimationTarget<K>,
        key: K,
        tween: Tween,
        now: Time,
    ) -> AnimationHandle {
        if let Some(old) = self.live.remove(&key) {
            let (value, _) = old.sample(now);
            target.write(key, value);
            old.state.set(AnimationState::Replaced);
            trace!(?key, value, "animation replaced");
        }

        if tween.duration_s <= 0.0 || !tween.duration_s.is_finite() {
            target.write(key, tween.to);
            return AnimationHandle::with_state(AnimationState::Completed);
        }

        let from = tween
            .from
            .or_else(|| target.current(key))
            .unwrap_or(tween.to);
        if tween.from.is_some() {
            target.write(key, from);
        }
        let handle = AnimationHandle::with_state(AnimationState::Running);
        self.live.insert(
            key,
            Animation {
                from,
                to: tween.to,
                duration_s: tween.duration_s,
                easing: tween.easing,
                start: now,
                loops: tween.loops,
                yoyo: tween.yoyo,
                last: from,
                state: Rc::clone(&handle.state),
            },
        );
        handle
    }

    /// Advances every live animation to `now` and returns the notifications
    /// produced since the previous tick.
    pub fn tick(&mut self, now: Time, target: &mut impl AnimationTarget<K>) -> Vec<AnimationEvent<K>> {
        let mut events = std::mem::take(&mut self.pending);
        let mut finished = Vec::new();
        for (key, anim) in self.live.iter_mut() {
            let (value, done) = anim.sample(now);
            anim.last = value;
            target.write(*key, value);
            if done {
                anim.state.set(AnimationState::Completed);
                finished.push(*key);
                events.push(AnimationEvent::Stopped {
                    key: *key,
                    value,
                    completed: true,
                });
            }
        }
        for key in finished {
            self.live.remove(&key);
        }
        events
    }

    /// Stops the animation on `key`, leaving the last written value in place.
    pub fn stop(&mut self, key: K) -> bool {
        match self.live.remove(&key) {
            Some(anim) => {
                anim.state.set(AnimationState::Stopped);
                self.pending.push(AnimationEvent::Stopped {
                    key,
                    value: anim.last,
                    completed: false,
                });
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self, keys: &[K]) {
        for key in keys {
            self.stop(*key);
        }
    }

    pub fn is_animating(&self, key: K) -> bool {
        self.live.contains_key(&key)
    }

    pub fn is_idle(&self) -> bool {
        self.live.is_empty()
    }

    /// Target value of the live animation on `key`.
    pub fn target_of(&self, key: K) -> Option<f64> {
        self.live.get(&key).map(|a| a.to)
    }
}
