use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::data::{RoleId, TeamNumber};

pub type Result<T> = std::result::Result<T, BalanceError>;

/// Which class of hard constraint is the likely reason a model has no solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfeasibilityCause {
    /// Two players of the same role are pinned to the same team.
    PresetCollision {
        team: TeamNumber,
        role: RoleId,
        players: Vec<String>,
    },
    /// Hard captain constraints were active when the solve failed.
    CaptainPolicy { detail: String },
    /// No structural explanation found; role coverage combined with presets.
    RoleCoverage,
}

impl fmt::Display for InfeasibilityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibilityCause::PresetCollision {
                team,
                role,
                players,
            } => write!(
                f,
                "role coverage conflict: players {} (role {role}) are all preset to team {team}",
                players.join(", ")
            ),
            InfeasibilityCause::CaptainPolicy { detail } => {
                write!(f, "captain policy cannot be met: {detail}")
            }
            InfeasibilityCause::RoleCoverage => write!(
                f,
                "role coverage cannot be satisfied; check presets and role counts"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum BalanceError {
    // input
    #[error("roster is empty")]
    EmptyRoster,

    #[error("team count must be at least 1 (got {0})")]
    InvalidTeamCount(usize),

    #[error("each role must have exactly {expected} players; offending roles: {}", format_counts(.offending))]
    RoleCountMismatch {
        expected: usize,
        offending: Vec<(RoleId, usize)>,
    },

    #[error("player count ({players}) != teams ({teams}) * roles ({roles})")]
    RosterSizeMismatch {
        players: usize,
        teams: usize,
        roles: usize,
    },

    #[error("duplicate player names: {}", .0.join(", "))]
    DuplicateName(Vec<String>),

    #[error("player '{player}' has role {role}, allowed roles are {allowed:?}")]
    UnknownRole {
        player: String,
        role: RoleId,
        allowed: Vec<RoleId>,
    },

    #[error("player '{player}' has a non-finite skill ({skill})")]
    InvalidSkill { player: String, skill: f64 },

    #[error("invalid preset for '{player}': {reason}")]
    InvalidPreset { player: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // model / solver
    #[error("no feasible assignment found: {cause}")]
    Infeasible { cause: InfeasibilityCause },

    #[error("solver failure: {0}")]
    Solver(String),

    // collaborators
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BalanceError {
    /// True for errors caused by the roster or configuration rather than the model or I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BalanceError::EmptyRoster
                | BalanceError::InvalidTeamCount(_)
                | BalanceError::RoleCountMismatch { .. }
                | BalanceError::RosterSizeMismatch { .. }
                | BalanceError::DuplicateName(_)
                | BalanceError::UnknownRole { .. }
                | BalanceError::InvalidSkill { .. }
                | BalanceError::InvalidPreset { .. }
                | BalanceError::InvalidConfig(_)
        )
    }
}

fn format_counts(counts: &[(RoleId, usize)]) -> String {
    counts
        .iter()
        .map(|(role, n)| format!("role {role} has {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_count_mismatch_lists_offending_roles() {
        let err = BalanceError::RoleCountMismatch {
            expected: 3,
            offending: vec![(2, 1), (4, 5)],
        };
        assert_eq!(
            err.to_string(),
            "each role must have exactly 3 players; offending roles: role 2 has 1, role 4 has 5"
        );
        assert!(err.is_input_error());
    }

    #[test]
    fn preset_collision_reads_as_role_coverage_conflict() {
        let err = BalanceError::Infeasible {
            cause: InfeasibilityCause::PresetCollision {
                team: 1,
                role: 2,
                players: vec!["a".into(), "b".into()],
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("role coverage conflict"));
        assert!(msg.contains("a, b"));
        assert!(!err.is_input_error());
    }
}
