//! Fixture configuration for the scoreboard engine.
//!
//! These structs are deserialized from a TOML file via the `config` crate.
//! A missing or corrupt file never stops the control process: loading falls
//! back to a hardcoded default fixture and logs a warning.

use crate::state::MatchKind;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// One team's configured identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    /// Path or URL of the team crest; empty means "no crest".
    #[serde(default)]
    pub logo: String,
}

/// Visual styling forwarded to the display windows. Opaque to the engine;
/// it is carried on the wire and never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardStyle {
    pub theme: String,
    pub accent: String,
    pub font_scale: f32,
}

impl Default for ScoreboardStyle {
    fn default() -> Self {
        Self {
            theme: "classic".to_string(),
            accent: "#0d6efd".to_string(),
            font_scale: 1.0,
        }
    }
}

/// The top-level fixture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_home")]
    pub home: TeamConfig,
    #[serde(default = "default_away")]
    pub away: TeamConfig,
    #[serde(default = "default_kind")]
    pub kind: MatchKind,
    #[serde(default)]
    pub style: ScoreboardStyle,
    #[serde(default)]
    pub league_logo: String,
    /// Whether operator stoppage minutes also stretch the extra-time
    /// boundaries. Off by default; regulation stoppage only affects the
    /// end of the second half.
    #[serde(default)]
    pub stoppage_in_extra_time: bool,
}

impl MatchConfig {
    /// Loads the fixture from a TOML file, falling back to the default
    /// fixture on any failure.
    pub fn load(path: impl AsRef<Path>) -> MatchConfig {
        let path = path.as_ref();
        let loaded = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|settings| settings.try_deserialize::<MatchConfig>());
        match loaded {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("could not load fixture config from {}: {err}", path.display());
                MatchConfig::default()
            }
        }
    }

    /// Writes the fixture back out as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let rendered = toml::to_string_pretty(self).context("serializing fixture config")?;
        std::fs::write(path, rendered)
            .with_context(|| format!("writing fixture config to {}", path.display()))?;
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            away: default_away(),
            kind: default_kind(),
            style: ScoreboardStyle::default(),
            league_logo: String::new(),
            stoppage_in_extra_time: false,
        }
    }
}

// --- Default value functions for serde ---

fn default_home() -> TeamConfig {
    TeamConfig {
        name: "Team A".to_string(),
        logo: String::new(),
    }
}

fn default_away() -> TeamConfig {
    TeamConfig {
        name: "Team B".to_string(),
        logo: String::new(),
    }
}

fn default_kind() -> MatchKind {
    MatchKind::League
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = MatchConfig::load("/definitely/not/here.toml");
        assert_eq!(cfg, MatchConfig::default());
        assert_eq!(cfg.home.name, "Team A");
        assert_eq!(cfg.kind, MatchKind::League);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.toml");

        let cfg = MatchConfig {
            home: TeamConfig {
                name: "Rovers".to_string(),
                logo: "logos/rovers.png".to_string(),
            },
            kind: MatchKind::Knockout,
            stoppage_in_extra_time: true,
            ..Default::default()
        };
        cfg.save(&path).unwrap();

        let loaded = MatchConfig::load(&path);
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.toml");
        std::fs::write(&path, "kind = \"knockout\"\n").unwrap();

        let cfg = MatchConfig::load(&path);
        assert_eq!(cfg.kind, MatchKind::Knockout);
        assert_eq!(cfg.away.name, "Team B");
        assert!(!cfg.stoppage_in_extra_time);
    }
}
