//! The phase/timer transition core of the clock engine.
//!
//! Everything here is pure state-to-state logic: a tagged [`Trigger`] is
//! applied to a [`MatchState`] and yields a list of [`Effect`]s for the
//! engine to execute (publish the snapshot, stop or start the ticking
//! interval). The asynchronous interval itself lives in the engine; keeping
//! the decision logic synchronous makes every transition rule testable
//! without a runtime.

use crate::config::MatchConfig;
use crate::state::{MatchKind, MatchPhase, MatchState};

/// 45:00, the end of the first half.
pub const HALFTIME_SECS: u32 = 45 * 60;
/// 90:00, the end of regulation time.
pub const FULLTIME_SECS: u32 = 90 * 60;
/// 105:00, the end of the first period of extra time.
pub const EXTRA_TIME_FIRST_SECS: u32 = 105 * 60;
/// 120:00, the end of extra time.
pub const EXTRA_TIME_END_SECS: u32 = 120 * 60;

/// Clock behavior derived from the fixture configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockRules {
    /// When set, operator stoppage minutes also push out the extra-time
    /// boundaries, not just the end of the second half.
    pub stoppage_in_extra_time: bool,
}

impl From<&MatchConfig> for ClockRules {
    fn from(config: &MatchConfig) -> Self {
        Self {
            stoppage_in_extra_time: config.stoppage_in_extra_time,
        }
    }
}

/// Everything that can drive the clock forward, backward or sideways.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// One interval tick, or a manual "add time" (which shares the same
    /// clamping and transition rules).
    Tick { seconds: u32 },
    /// Manual cosmetic correction; floored at zero, never re-evaluates
    /// phase transitions.
    Subtract { seconds: u32 },
    /// Explicit operator phase start.
    StartPhase(PhaseStart),
    /// Back to kickoff, team identity re-read from configuration.
    Reset(MatchConfig),
}

/// Side effects the engine must carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fan the resulting snapshot out to every display. Emitted by every
    /// trigger, whether or not anything else fired.
    Publish,
    /// Stop the ticking interval.
    StopClock,
    /// Start the ticking interval.
    StartClock,
}

/// Parameters of an explicit operator phase start.
#[derive(Debug, Clone, Copy)]
pub struct PhaseStart {
    pub timer: u32,
    pub max_time: u32,
    pub phase: MatchPhase,
    pub extra_time: bool,
    pub penalties: bool,
}

impl PhaseStart {
    pub fn first_half() -> Self {
        Self {
            timer: 0,
            max_time: HALFTIME_SECS,
            phase: MatchPhase::FirstHalf,
            extra_time: false,
            penalties: false,
        }
    }

    pub fn second_half() -> Self {
        Self {
            timer: HALFTIME_SECS,
            max_time: FULLTIME_SECS,
            phase: MatchPhase::SecondHalf,
            extra_time: false,
            penalties: false,
        }
    }

    pub fn extra_time_first() -> Self {
        Self {
            timer: FULLTIME_SECS,
            max_time: EXTRA_TIME_FIRST_SECS,
            phase: MatchPhase::ExtraTimeFirst,
            extra_time: true,
            penalties: false,
        }
    }

    pub fn extra_time_second() -> Self {
        Self {
            timer: EXTRA_TIME_FIRST_SECS,
            max_time: EXTRA_TIME_END_SECS,
            phase: MatchPhase::ExtraTimeSecond,
            extra_time: true,
            penalties: false,
        }
    }

    /// The shootout does not use the running clock.
    pub fn penalties() -> Self {
        Self {
            timer: 0,
            max_time: 0,
            phase: MatchPhase::Penalties,
            extra_time: false,
            penalties: true,
        }
    }
}

/// The maximum timer value the current phase may reach before the clock
/// stops on its own.
pub fn ceiling(state: &MatchState, rules: &ClockRules) -> u32 {
    let stoppage_secs = state.stoppage_time * 60;
    if state.phase.is_extra_time() {
        if rules.stoppage_in_extra_time {
            EXTRA_TIME_END_SECS + stoppage_secs
        } else {
            EXTRA_TIME_END_SECS
        }
    } else if state.phase == MatchPhase::SecondHalf {
        FULLTIME_SECS + stoppage_secs
    } else {
        state.max_time
    }
}

/// The automatic transition rule for the current phase, if one exists:
/// the threshold at which it fires and the phase it moves to.
fn transition_rule(state: &MatchState, rules: &ClockRules) -> Option<(u32, MatchPhase)> {
    let extra = if rules.stoppage_in_extra_time {
        state.stoppage_time * 60
    } else {
        0
    };
    match state.phase {
        MatchPhase::FirstHalf => Some((HALFTIME_SECS, MatchPhase::Halftime)),
        MatchPhase::SecondHalf => {
            let threshold = FULLTIME_SECS + state.stoppage_time * 60;
            let next = match state.kind {
                MatchKind::League => MatchPhase::Fulltime,
                MatchKind::Knockout if state.scores_level() => {
                    MatchPhase::ExtraTimeFirstPending
                }
                MatchKind::Knockout => MatchPhase::Fulltime,
            };
            Some((threshold, next))
        }
        MatchPhase::ExtraTimeFirst => Some((
            EXTRA_TIME_FIRST_SECS + extra,
            MatchPhase::ExtraTimeSecondPending,
        )),
        MatchPhase::ExtraTimeSecond => {
            Some((EXTRA_TIME_END_SECS + extra, MatchPhase::ExtraTimeEnd))
        }
        _ => None,
    }
}

/// Resuming is refused while the clock sits exactly on one of the defined
/// phase boundaries; advancing past one of these points is the job of the
/// explicit phase-start actions.
pub fn at_phase_boundary(state: &MatchState) -> bool {
    use MatchPhase::*;
    matches!(
        (state.phase, state.timer),
        (FirstHalf, 0)
            | (FirstHalf, HALFTIME_SECS)
            | (SecondHalf, HALFTIME_SECS)
            | (SecondHalf, FULLTIME_SECS)
            | (Fulltime, FULLTIME_SECS)
            | (ExtraTimeFirst, FULLTIME_SECS)
            | (ExtraTimeFirst, EXTRA_TIME_FIRST_SECS)
            | (ExtraTimeFirstPending, EXTRA_TIME_FIRST_SECS)
            | (ExtraTimeSecond, EXTRA_TIME_FIRST_SECS)
    )
}

/// Applies one trigger to the match state and returns the effects the
/// engine must carry out. The snapshot is published on every trigger.
pub fn advance(state: &mut MatchState, trigger: Trigger, rules: &ClockRules) -> Vec<Effect> {
    match trigger {
        Trigger::Tick { seconds } => {
            let mut stop = false;
            let mut candidate = state.timer.saturating_add(seconds);

            let ceiling = ceiling(state, rules);
            if candidate >= ceiling {
                candidate = ceiling;
                stop = true;
            }

            if let Some((threshold, next)) = transition_rule(state, rules) {
                if candidate >= threshold {
                    candidate = threshold;
                    state.phase = next;
                    stop = true;
                }
            }

            state.timer = candidate;
            if stop {
                vec![Effect::StopClock, Effect::Publish]
            } else {
                vec![Effect::Publish]
            }
        }
        Trigger::Subtract { seconds } => {
            state.timer = state.timer.saturating_sub(seconds);
            vec![Effect::Publish]
        }
        Trigger::StartPhase(start) => {
            state.timer = start.timer;
            state.max_time = start.max_time;
            state.phase = start.phase;
            state.extra_time = start.extra_time;
            state.penalties = start.penalties;
            if start.penalties {
                vec![Effect::Publish]
            } else {
                vec![Effect::StartClock, Effect::Publish]
            }
        }
        Trigger::Reset(config) => {
            state.reset(&config);
            vec![Effect::StopClock, Effect::Publish]
        }
    }
}
