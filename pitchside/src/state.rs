//! The match snapshot record and its mutating operations.
//!
//! `MatchState` is the single source of truth for everything a scoreboard
//! shows: teams, scores, the game clock, the current phase and the penalty
//! shootout log. The engine owns exactly one instance and every mutation
//! produces a fresh snapshot for the broadcast fan-out.

use crate::config::MatchConfig;
use serde::{Deserialize, Serialize};

/// Governs what happens when the second half ends level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// A draw is a final result.
    League,
    /// A draw proceeds to extra time and, if still level, penalties.
    Knockout,
}

/// The current segment of the match.
///
/// Transitions are one-directional; the only way back to `FirstHalf` is an
/// explicit match reset. `Fulltime` and `Penalties` are terminal as far as
/// the clock is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    FirstHalf,
    Halftime,
    SecondHalf,
    ExtraTimeFirstPending,
    ExtraTimeFirst,
    ExtraTimeSecondPending,
    ExtraTimeSecond,
    ExtraTimeEnd,
    Fulltime,
    Penalties,
}

impl MatchPhase {
    /// Human-readable label for display surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            MatchPhase::FirstHalf => "First Half",
            MatchPhase::Halftime => "Halftime",
            MatchPhase::SecondHalf => "Second Half",
            MatchPhase::ExtraTimeFirstPending => "Extra Time Pending",
            MatchPhase::ExtraTimeFirst => "Extra Time - First Half",
            MatchPhase::ExtraTimeSecondPending => "Extra Time Pending",
            MatchPhase::ExtraTimeSecond => "Extra Time - Second Half",
            MatchPhase::ExtraTimeEnd => "Extra Time End",
            MatchPhase::Fulltime => "Full Time",
            MatchPhase::Penalties => "Penalties",
        }
    }

    /// Whether this phase belongs to the extra-time family.
    pub fn is_extra_time(&self) -> bool {
        matches!(
            self,
            MatchPhase::ExtraTimeFirstPending
                | MatchPhase::ExtraTimeFirst
                | MatchPhase::ExtraTimeSecondPending
                | MatchPhase::ExtraTimeSecond
                | MatchPhase::ExtraTimeEnd
        )
    }

    /// Phases whose entry restarts the break timer on the displays.
    pub fn starts_break(&self) -> bool {
        matches!(
            self,
            MatchPhase::Halftime
                | MatchPhase::Fulltime
                | MatchPhase::ExtraTimeFirst
                | MatchPhase::ExtraTimeSecond
                | MatchPhase::Penalties
        )
    }
}

/// Identifies one of the two teams in operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn opposite(&self) -> TeamSide {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }
}

/// One team's identity and running score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub score: u32,
    /// Opaque resource handle for the team's crest (a path or URL).
    pub logo: String,
}

impl Team {
    pub fn new(name: impl Into<String>, logo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            logo: logo.into(),
        }
    }
}

/// Outcome of a single penalty kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenaltyKick {
    Goal,
    Miss,
}

impl PenaltyKick {
    pub fn toggled(&self) -> PenaltyKick {
        match self {
            PenaltyKick::Goal => PenaltyKick::Miss,
            PenaltyKick::Miss => PenaltyKick::Goal,
        }
    }
}

/// Ordered log of penalty kicks per team. Append/undo only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyShootout {
    pub home: Vec<PenaltyKick>,
    pub away: Vec<PenaltyKick>,
}

impl PenaltyShootout {
    fn kicks_mut(&mut self, side: TeamSide) -> &mut Vec<PenaltyKick> {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    pub fn kicks(&self, side: TeamSide) -> &[PenaltyKick] {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    /// Converted kicks for one team.
    pub fn goals(&self, side: TeamSide) -> usize {
        self.kicks(side)
            .iter()
            .filter(|k| **k == PenaltyKick::Goal)
            .count()
    }
}

/// The full match snapshot broadcast to every display on each change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub home: Team,
    pub away: Team,
    /// Seconds elapsed on the overall match timeline (0 = kickoff).
    pub timer: u32,
    /// Ceiling for the current phase before the clock stops, in seconds.
    pub max_time: u32,
    /// Operator-set additional minutes appended to the second half.
    pub stoppage_time: u32,
    pub phase: MatchPhase,
    pub kind: MatchKind,
    /// Mirrors `phase`: true once the match has entered extra time.
    pub extra_time: bool,
    /// Mirrors `phase`: true once the shootout has started.
    pub penalties: bool,
    pub shootout: PenaltyShootout,
}

/// Upper bound for operator-entered stoppage time, in minutes.
pub const STOPPAGE_MAX_MINUTES: u32 = 30;

impl MatchState {
    /// Builds the kickoff-ready state for the configured fixture.
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            home: Team::new(&config.home.name, &config.home.logo),
            away: Team::new(&config.away.name, &config.away.logo),
            timer: 0,
            max_time: crate::clock::FULLTIME_SECS,
            stoppage_time: 0,
            phase: MatchPhase::FirstHalf,
            kind: config.kind,
            extra_time: false,
            penalties: false,
            shootout: PenaltyShootout::default(),
        }
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    fn team_mut(&mut self, side: TeamSide) -> &mut Team {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    pub fn scores_level(&self) -> bool {
        self.home.score == self.away.score
    }

    /// Adjusts a team's score, clamped at zero. Malformed input is corrected,
    /// not reported.
    pub fn change_score(&mut self, side: TeamSide, delta: i32) {
        let team = self.team_mut(side);
        team.score = team.score.saturating_add_signed(delta);
    }

    /// Sets the stoppage minutes for the second half, clamped to the
    /// operator-visible range.
    pub fn set_stoppage_time(&mut self, minutes: u32) {
        self.stoppage_time = minutes.min(STOPPAGE_MAX_MINUTES);
    }

    /// Appends a kick to the shootout log. Ignored outside the shootout.
    pub fn push_kick(&mut self, side: TeamSide, kick: PenaltyKick) {
        if self.phase != MatchPhase::Penalties {
            return;
        }
        self.shootout.kicks_mut(side).push(kick);
    }

    /// Removes the most recent kick for a team. Ignored outside the shootout.
    pub fn undo_kick(&mut self, side: TeamSide) {
        if self.phase != MatchPhase::Penalties {
            return;
        }
        self.shootout.kicks_mut(side).pop();
    }

    /// Flips one recorded kick between goal and miss. Out-of-range indices
    /// are ignored.
    pub fn toggle_kick(&mut self, side: TeamSide, index: usize) {
        if self.phase != MatchPhase::Penalties {
            return;
        }
        let kicks = self.shootout.kicks_mut(side);
        if let Some(kick) = kicks.get_mut(index) {
            *kick = kick.toggled();
        }
    }

    /// Reinitializes the match: kickoff state, zero scores, team identity
    /// re-read from the configuration collaborator.
    pub fn reset(&mut self, config: &MatchConfig) {
        *self = MatchState::from_config(config);
    }

    /// Shallow-merges an operator patch into the state, one top-level field
    /// at a time. Penalty logs are replaced wholesale per team when present.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(home) = patch.home {
            self.home = home;
        }
        if let Some(away) = patch.away {
            self.away = away;
        }
        if let Some(timer) = patch.timer {
            self.timer = timer;
        }
        if let Some(max_time) = patch.max_time {
            self.max_time = max_time;
        }
        if let Some(minutes) = patch.stoppage_time {
            self.set_stoppage_time(minutes);
        }
        if let Some(phase) = patch.phase {
            self.phase = phase;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(extra_time) = patch.extra_time {
            self.extra_time = extra_time;
        }
        if let Some(penalties) = patch.penalties {
            self.penalties = penalties;
        }
        if let Some(shootout) = patch.shootout {
            // The shootout log only exists while penalties are under way.
            if self.phase == MatchPhase::Penalties {
                if let Some(home) = shootout.home {
                    self.shootout.home = home;
                }
                if let Some(away) = shootout.away {
                    self.shootout.away = away;
                }
            }
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        MatchState::from_config(&MatchConfig::default())
    }
}

/// A partial match update: every field optional, merged per top-level field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatePatch {
    pub home: Option<Team>,
    pub away: Option<Team>,
    pub timer: Option<u32>,
    pub max_time: Option<u32>,
    pub stoppage_time: Option<u32>,
    pub phase: Option<MatchPhase>,
    pub kind: Option<MatchKind>,
    pub extra_time: Option<bool>,
    pub penalties: Option<bool>,
    pub shootout: Option<ShootoutPatch>,
}

/// Wholesale replacement for one or both penalty logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShootoutPatch {
    pub home: Option<Vec<PenaltyKick>>,
    pub away: Option<Vec<PenaltyKick>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_clamps_at_zero() {
        let mut state = MatchState::default();
        state.change_score(TeamSide::Home, -1);
        assert_eq!(state.home.score, 0);

        state.change_score(TeamSide::Home, 2);
        state.change_score(TeamSide::Home, -1);
        assert_eq!(state.home.score, 1);
        assert_eq!(state.away.score, 0);
    }

    #[test]
    fn stoppage_time_clamps_to_range() {
        let mut state = MatchState::default();
        state.set_stoppage_time(45);
        assert_eq!(state.stoppage_time, STOPPAGE_MAX_MINUTES);
        state.set_stoppage_time(3);
        assert_eq!(state.stoppage_time, 3);
    }

    #[test]
    fn reset_restores_kickoff_shape() {
        let mut state = MatchState::default();
        state.change_score(TeamSide::Home, 2);
        state.change_score(TeamSide::Away, 1);
        state.timer = 5210;
        state.phase = MatchPhase::Penalties;
        state.push_kick(TeamSide::Home, PenaltyKick::Goal);
        state.set_stoppage_time(4);

        state.reset(&MatchConfig::default());

        assert_eq!(state.phase, MatchPhase::FirstHalf);
        assert_eq!(state.timer, 0);
        assert_eq!(state.home.score, 0);
        assert_eq!(state.away.score, 0);
        assert_eq!(state.stoppage_time, 0);
        assert!(state.shootout.home.is_empty());
        assert!(state.shootout.away.is_empty());
        assert!(!state.extra_time);
        assert!(!state.penalties);
    }

    #[test]
    fn penalty_log_only_grows_during_shootout() {
        let mut state = MatchState::default();
        state.push_kick(TeamSide::Home, PenaltyKick::Goal);
        assert!(state.shootout.home.is_empty());

        state.phase = MatchPhase::Penalties;
        state.push_kick(TeamSide::Home, PenaltyKick::Goal);
        state.push_kick(TeamSide::Home, PenaltyKick::Miss);
        state.push_kick(TeamSide::Away, PenaltyKick::Goal);
        assert_eq!(state.shootout.home.len(), 2);
        assert_eq!(state.shootout.goals(TeamSide::Home), 1);
        assert_eq!(state.shootout.goals(TeamSide::Away), 1);

        state.toggle_kick(TeamSide::Home, 1);
        assert_eq!(state.shootout.goals(TeamSide::Home), 2);
        // Out of range: silently ignored.
        state.toggle_kick(TeamSide::Home, 9);

        state.undo_kick(TeamSide::Home);
        assert_eq!(state.shootout.home.len(), 1);
        // Undo on an empty log is a no-op.
        state.undo_kick(TeamSide::Away);
        state.undo_kick(TeamSide::Away);
        assert!(state.shootout.away.is_empty());
    }

    #[test]
    fn patch_merges_per_field() {
        let mut state = MatchState::default();
        let patch = StatePatch {
            stoppage_time: Some(5),
            kind: Some(MatchKind::Knockout),
            ..Default::default()
        };
        state.apply(patch);
        assert_eq!(state.stoppage_time, 5);
        assert_eq!(state.kind, MatchKind::Knockout);
        // Untouched fields survive the merge.
        assert_eq!(state.phase, MatchPhase::FirstHalf);
        assert_eq!(state.home.name, "Team A");
    }

    #[test]
    fn patch_replaces_penalty_log_wholesale() {
        let mut state = MatchState::default();
        state.phase = MatchPhase::Penalties;
        state.push_kick(TeamSide::Home, PenaltyKick::Miss);
        state.push_kick(TeamSide::Away, PenaltyKick::Goal);

        state.apply(StatePatch {
            shootout: Some(ShootoutPatch {
                home: Some(vec![PenaltyKick::Goal, PenaltyKick::Goal]),
                away: None,
            }),
            ..Default::default()
        });

        assert_eq!(state.shootout.home, vec![PenaltyKick::Goal, PenaltyKick::Goal]);
        // The away log was absent from the patch and is preserved.
        assert_eq!(state.shootout.away, vec![PenaltyKick::Goal]);
    }

    #[test]
    fn patch_ignores_penalty_log_outside_shootout() {
        let mut state = MatchState::default();
        state.apply(StatePatch {
            shootout: Some(ShootoutPatch {
                home: Some(vec![PenaltyKick::Goal]),
                away: None,
            }),
            ..Default::default()
        });
        assert!(state.shootout.home.is_empty());
    }
}
