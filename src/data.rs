use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type RoleId = u32;
/// Zero-based team index used inside the model.
pub type TeamIndex = usize;
/// One-based team number used in configuration and reports.
pub type TeamNumber = usize;

/// A signed-up player.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub skill: f64,
    pub role: RoleId,
    #[serde(default)]
    pub captain: bool,
    #[serde(default)]
    pub avoid: Option<String>,
}

impl Player {
    pub fn new(name: impl Into<String>, skill: f64, role: RoleId) -> Self {
        Self {
            name: name.into(),
            skill,
            role,
            captain: false,
            avoid: None,
        }
    }

    pub fn captain(mut self) -> Self {
        self.captain = true;
        self
    }

    pub fn avoiding(mut self, other: impl Into<String>) -> Self {
        self.avoid = Some(other.into());
        self
    }
}

/// How captain-flagged players are spread across teams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptainPolicy {
    #[default]
    None,
    AtLeastOne,
    Separate,
}

impl fmt::Display for CaptainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptainPolicy::None => write!(f, "none"),
            CaptainPolicy::AtLeastOne => write!(f, "at_least_one"),
            CaptainPolicy::Separate => write!(f, "separate"),
        }
    }
}

/// How the captain policy ends up in the model for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptainMode {
    Off,
    Hard,
    Soft,
}

/// Non-fatal conditions recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnresolvedAvoid { player: String, target: String },
    SelfAvoid { player: String },
    CaptainSoftened {
        policy: CaptainPolicy,
        captains: usize,
        teams: usize,
    },
    CaptainRetrySoftened { policy: CaptainPolicy },
    NotProvenOptimal,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedAvoid { player, target } => write!(
                f,
                "{player} avoids '{target}', who is not on the roster; ignoring"
            ),
            Warning::SelfAvoid { player } => write!(f, "{player} avoids themselves; ignoring"),
            Warning::CaptainSoftened {
                policy: CaptainPolicy::AtLeastOne,
                captains,
                teams,
            } => write!(
                f,
                "only {captains} captains for {teams} teams ({} short) under 'at_least_one'; downgrading to soft penalty",
                teams.saturating_sub(*captains)
            ),
            Warning::CaptainSoftened {
                policy,
                captains,
                teams,
            } => write!(
                f,
                "{captains} captains for {teams} teams under '{policy}'; downgrading to soft penalty"
            ),
            Warning::CaptainRetrySoftened { policy } => write!(
                f,
                "hard '{policy}' captain constraints made the model infeasible; re-solved with soft penalty"
            ),
            Warning::NotProvenOptimal => {
                write!(f, "time budget exhausted; solution is feasible but not proven optimal")
            }
        }
    }
}

/// Terminal status of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
}

/// One player's seat in the final roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub role: RoleId,
    pub skill: f64,
    pub captain: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    pub team: TeamNumber,
    /// Sorted by role.
    pub members: Vec<Member>,
    pub score: f64,
    pub deviation: f64,
    pub captains: usize,
}

/// An avoid-pair whose players ended up on the same team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvoidConflict {
    pub team: TeamNumber,
    /// The player who asked to be kept apart.
    pub player: String,
    pub avoids: String,
    /// Both players named each other.
    pub mutual: bool,
}

/// Objective components. `total` is the weighted sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveBreakdown {
    pub balance: f64,
    pub conflict: f64,
    pub captain: f64,
    pub total: f64,
}

/// The final output of the balancer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub status: SolveStatus,
    pub captain_mode: CaptainMode,
    pub teams: Vec<TeamRoster>,
    pub target_score: f64,
    pub conflicts: Vec<AvoidConflict>,
    /// Recomputed from the final rosters.
    pub objective: ObjectiveBreakdown,
    /// Read back from the model's auxiliary variables.
    pub model_objective: ObjectiveBreakdown,
    pub warnings: Vec<Warning>,
}

impl Solution {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Team number of the named player, if present.
    pub fn team_of(&self, name: &str) -> Option<TeamNumber> {
        self.teams
            .iter()
            .find(|t| t.members.iter().any(|m| m.name == name))
            .map(|t| t.team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captain_policy_parses_snake_case() {
        let p: CaptainPolicy = serde_json::from_str("\"at_least_one\"").unwrap();
        assert_eq!(p, CaptainPolicy::AtLeastOne);
        assert_eq!(p.to_string(), "at_least_one");
    }

    #[test]
    fn player_json_defaults_optional_fields() {
        let p: Player = serde_json::from_str(r#"{"name":"ana","skill":3100,"role":2}"#).unwrap();
        assert_eq!(p, Player::new("ana", 3100.0, 2));
    }

    #[test]
    fn softened_warning_names_the_shortfall() {
        let w = Warning::CaptainSoftened {
            policy: CaptainPolicy::AtLeastOne,
            captains: 1,
            teams: 4,
        };
        assert!(w.to_string().contains("3 short"));
    }
}
