//! Supernova overlay state machine.
//!
//! ```text
//! NORMAL --trigger--> GATHERING --800ms--> EXPLODING --800ms--> NORMAL
//! ```
//!
//! Triggers arrive as monotonically increasing tokens; only a token different
//! from the last one seen starts a cycle, and token `0` never does. Dwell
//! times are deadlines checked against the frame clock by [`Supernova::advance`],
//! so nothing runs outside the frame loop and [`Supernova::cancel`] simply
//! forgets the pending deadline.

use serde::{Deserialize, Serialize};

/// Time spent pulling particles to the centre before detonation.
pub const GATHER_DWELL_MS: f64 = 800.0;

/// Time spent coasting after detonation before modes resume.
pub const EXPLODE_DWELL_MS: f64 = 800.0;

/// Overlay phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Normal,
    Gathering,
    Exploding,
}

/// How a new trigger token is treated while a cycle is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentryPolicy {
    /// A token during EXPLODING restarts the gather; a token during
    /// GATHERING is recorded but keeps the running deadline.
    #[default]
    WhileActive,
    /// Tokens outside NORMAL are recorded and otherwise ignored.
    WhenIdle,
}

/// State change reported by [`Supernova::advance`] and [`Supernova::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Entered GATHERING.
    Gather,
    /// Entered EXPLODING; the caller applies the outward impulse.
    Explode,
    /// Back to NORMAL.
    Settle,
}

/// The supernova state machine.
#[derive(Debug, Clone)]
pub struct Supernova {
    state: AnimationState,
    last_token: u64,
    deadline: Option<f64>,
    policy: ReentryPolicy,
}

impl Supernova {
    pub fn new(policy: ReentryPolicy) -> Self {
        Self {
            state: AnimationState::Normal,
            last_token: 0,
            deadline: None,
            policy,
        }
    }

    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    #[inline]
    pub fn last_token(&self) -> u64 {
        self.last_token
    }

    /// Clock time (ms) of the next scheduled transition, if any.
    #[inline]
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    pub fn policy(&self) -> ReentryPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ReentryPolicy) {
        self.policy = policy;
    }

    /// Offer a trigger token at clock time `now`.
    ///
    /// Returns [`Transition::Gather`] when the token starts or restarts a cycle.
    pub fn trigger(&mut self, token: u64, now: f64) -> Option<Transition> {
        if token == self.last_token {
            return None;
        }
        self.last_token = token;

        let enter = match (self.state, self.policy) {
            (AnimationState::Normal, _) => true,
            (AnimationState::Exploding, ReentryPolicy::WhileActive) => true,
            (AnimationState::Gathering, _) | (AnimationState::Exploding, ReentryPolicy::WhenIdle) => {
                false
            }
        };

        if !enter {
            log::debug!("supernova token {} recorded during {:?}", token, self.state);
            return None;
        }

        self.state = AnimationState::Gathering;
        self.deadline = Some(now + GATHER_DWELL_MS);
        log::debug!("supernova token {}: gathering until {:.0}ms", token, now + GATHER_DWELL_MS);
        Some(Transition::Gather)
    }

    /// Fire the pending deadline if `now` has reached it.
    pub fn advance(&mut self, now: f64) -> Option<Transition> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        match self.state {
            AnimationState::Gathering => {
                self.state = AnimationState::Exploding;
                self.deadline = Some(now + EXPLODE_DWELL_MS);
                log::debug!("supernova exploding at {:.0}ms", now);
                Some(Transition::Explode)
            }
            AnimationState::Exploding => {
                self.state = AnimationState::Normal;
                self.deadline = None;
                log::debug!("supernova settled at {:.0}ms", now);
                Some(Transition::Settle)
            }
            AnimationState::Normal => {
                self.deadline = None;
                None
            }
        }
    }

    /// Abort any running cycle. The last seen token is kept.
    pub fn cancel(&mut self) {
        if self.state != AnimationState::Normal {
            log::debug!("supernova cancelled during {:?}", self.state);
        }
        self.state = AnimationState::Normal;
        self.deadline = None;
    }
}

impl Default for Supernova {
    fn default() -> Self {
        Self::new(ReentryPolicy::default())
    }
}
