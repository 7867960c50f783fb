//! Consumer-side view of the broadcast contract.
//!
//! A display window never touches the engine's state directly: it bootstraps
//! from a point-in-time snapshot, then re-renders from the update stream.
//! [`ScoreboardView`] is the projection of a snapshot that display surfaces
//! actually draw; rendering itself stays out of this crate.

use crate::config::{MatchConfig, ScoreboardStyle};
use crate::state::{MatchState, TeamSide};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Formats a second count as `MM:SS`.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Everything a late-joining display needs: the current snapshot and
/// configuration pulled point-in-time, plus the live streams. Messages
/// published before the feed was handed out are not replayed.
pub struct DisplayFeed {
    pub snapshot: Arc<MatchState>,
    pub config: MatchConfig,
    pub updates: broadcast::Receiver<Arc<MatchState>>,
    pub timeout: broadcast::Receiver<u32>,
    pub config_updates: broadcast::Receiver<MatchConfig>,
    pub style: broadcast::Receiver<ScoreboardStyle>,
}

/// A snapshot projected into display-ready fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardView {
    pub home_name: String,
    pub home_score: u32,
    pub home_logo: String,
    pub away_name: String,
    pub away_score: u32,
    pub away_logo: String,
    /// The match clock as `MM:SS`.
    pub clock: String,
    pub phase_label: &'static str,
    /// Stoppage badge ("+2") shown only when minutes were announced.
    pub stoppage: Option<String>,
    /// Shootout tally as (home goals, away goals) while penalties run.
    pub shootout: Option<(usize, usize)>,
}

impl From<&MatchState> for ScoreboardView {
    fn from(state: &MatchState) -> Self {
        let stoppage = (state.stoppage_time > 0).then(|| format!("+{}", state.stoppage_time));
        let shootout = state.penalties.then(|| {
            (
                state.shootout.goals(TeamSide::Home),
                state.shootout.goals(TeamSide::Away),
            )
        });
        Self {
            home_name: state.home.name.clone(),
            home_score: state.home.score,
            home_logo: state.home.logo.clone(),
            away_name: state.away.name.clone(),
            away_score: state.away.score,
            away_logo: state.away.logo.clone(),
            clock: format_clock(state.timer),
            phase_label: state.phase.label(),
            stoppage,
            shootout,
        }
    }
}

impl ScoreboardView {
    /// Compact single-line rendering for console displays and logs.
    pub fn headline(&self) -> String {
        let mut line = format!(
            "{} {} - {} {}  [{} {}",
            self.home_name, self.home_score, self.away_score, self.away_name, self.clock, self.phase_label
        );
        if let Some(stoppage) = &self.stoppage {
            line.push(' ');
            line.push_str(stoppage);
        }
        line.push(']');
        if let Some((home, away)) = self.shootout {
            line.push_str(&format!(" pens {home}-{away}"));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MatchPhase, PenaltyKick};

    #[test]
    fn clock_formats_with_zero_padding() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(2700), "45:00");
        assert_eq!(format_clock(5520), "92:00");
    }

    #[test]
    fn view_projects_scores_and_badges() {
        let mut state = MatchState::default();
        state.change_score(TeamSide::Home, 2);
        state.set_stoppage_time(3);
        state.timer = 2815;
        state.phase = MatchPhase::SecondHalf;

        let view = ScoreboardView::from(&state);
        assert_eq!(view.home_score, 2);
        assert_eq!(view.clock, "46:55");
        assert_eq!(view.stoppage.as_deref(), Some("+3"));
        assert_eq!(view.shootout, None);
        assert_eq!(
            view.headline(),
            "Team A 2 - 0 Team B  [46:55 Second Half +3]"
        );
    }

    #[test]
    fn view_summarizes_the_shootout() {
        let mut state = MatchState::default();
        state.phase = MatchPhase::Penalties;
        state.penalties = true;
        state.push_kick(TeamSide::Home, PenaltyKick::Goal);
        state.push_kick(TeamSide::Home, PenaltyKick::Miss);
        state.push_kick(TeamSide::Away, PenaltyKick::Goal);

        let view = ScoreboardView::from(&state);
        assert_eq!(view.shootout, Some((1, 1)));
    }
}
