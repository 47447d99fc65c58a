//! Episode state machine and lifecycle bookkeeping.
//!
//! An episode is a single rollout from reset to success or truncation.
//! [`Episode`] tracks state, step count, accumulated reward and seed.

// ---------------------------------------------------------------------------
// EpisodeState
// ---------------------------------------------------------------------------

/// Lifecycle state of an environment.
///
/// ```text
/// Idle ──seed──► Ready ──reset──► Running ──step──► Running
///                  ▲                 │
///                  └──── reset ──────┴──► Success | Truncated
/// ```
/// Any state moves to `Closed` on close.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Before seeding.
    #[default]
    Idle,
    /// Seeded, waiting for reset.
    Ready,
    /// Actively stepping.
    Running,
    /// Ended because the goal was reached.
    Success,
    /// Ended by the time limit.
    Truncated,
    /// Backend released.
    Closed,
}

impl EpisodeState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Truncated)
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Success => "success",
            Self::Truncated => "truncated",
            Self::Closed => "closed",
        }
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct Episode {
    pub state: EpisodeState,
    /// Steps taken this episode.
    pub step_count: u32,
    pub total_reward: f32,
    /// Effective seed, set by seeding.
    pub seed: Option<u64>,
    /// Episodes started since creation.
    pub episode_number: u32,
}

impl Episode {
    /// Record the seed and move to `Ready` unless an episode is underway.
    pub const fn seeded(&mut self, seed: u64) {
        self.seed = Some(seed);
        if matches!(self.state, EpisodeState::Idle) {
            self.state = EpisodeState::Ready;
        }
    }

    /// Start a new episode.
    pub const fn begin(&mut self) {
        self.state = EpisodeState::Running;
        self.step_count = 0;
        self.total_reward = 0.0;
        self.episode_number += 1;
    }

    /// Fall back to `Ready` after a failed reset.
    pub const fn interrupt(&mut self) {
        self.state = EpisodeState::Ready;
    }

    /// Count one step. Returns the new step count.
    pub const fn advance(&mut self) -> u32 {
        self.step_count += 1;
        self.step_count
    }

    /// Accumulate a step's reward; a finished task ends the episode.
    pub fn record(&mut self, reward: f32, done: bool) {
        self.total_reward += reward;
        if done {
            self.state = EpisodeState::Success;
        }
    }

    /// Truncate if the step budget is exhausted while still running.
    pub fn check_truncation(&mut self, max_steps: u32) -> bool {
        if self.step_count >= max_steps && self.state == EpisodeState::Running {
            self.state = EpisodeState::Truncated;
            return true;
        }
        false
    }

    pub const fn close(&mut self) {
        self.state = EpisodeState::Closed;
    }

    pub const fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub const fn is_closed(&self) -> bool {
        matches!(self.state, EpisodeState::Closed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
