//! Captain-policy feasibility checks and infeasibility diagnosis.

use itertools::Itertools;
use log::warn;

use crate::config::BalanceConfig;
use crate::data::{CaptainMode, CaptainPolicy, Warning};
use crate::error::{BalanceError, InfeasibilityCause, Result};
use crate::roster::Roster;

/// How the captain policy is encoded for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptainPlan {
    pub policy: CaptainPolicy,
    pub mode: CaptainMode,
}

impl CaptainPlan {
    pub fn softened(self) -> Self {
        match self.mode {
            CaptainMode::Hard => Self {
                mode: CaptainMode::Soft,
                ..self
            },
            _ => self,
        }
    }
}

/// Decides hard vs soft captain handling before any model is built.
///
/// Only the global captain count is checked: presets and role coverage can
/// still make the hard form infeasible, which the solver reports later.
pub fn plan_captains(
    roster: &Roster<'_>,
    config: &BalanceConfig,
    warnings: &mut Vec<Warning>,
) -> Result<CaptainPlan> {
    let policy = config.captain_policy;
    let mode = match (policy, config.captain_hard) {
        (CaptainPolicy::None, _) => CaptainMode::Off,
        (_, false) => CaptainMode::Soft,
        (_, true) => CaptainMode::Hard,
    };
    let plan = CaptainPlan { policy, mode };
    if mode != CaptainMode::Hard {
        return Ok(plan);
    }

    let captains = roster.captain_count();
    let teams = roster.team_count;
    let provably_infeasible = match policy {
        CaptainPolicy::AtLeastOne => captains < teams,
        CaptainPolicy::Separate => captains > teams,
        CaptainPolicy::None => false,
    };
    if !provably_infeasible {
        return Ok(plan);
    }

    if config.captain_strict {
        return Err(BalanceError::Infeasible {
            cause: InfeasibilityCause::CaptainPolicy {
                detail: format!("{captains} captains for {teams} teams under '{policy}'"),
            },
        });
    }
    let warning = Warning::CaptainSoftened {
        policy,
        captains,
        teams,
    };
    warn!("{warning}");
    warnings.push(warning);
    Ok(plan.softened())
}

/// Best guess at why a solve with `plan` came back infeasible.
pub fn diagnose_infeasibility(roster: &Roster<'_>, plan: CaptainPlan) -> InfeasibilityCause {
    let collision = roster
        .presets
        .iter()
        .map(|&(p, t)| ((t, roster.players[p].role), p))
        .into_group_map()
        .into_iter()
        .filter(|(_, ps)| ps.len() > 1)
        .sorted()
        .next();
    if let Some(((team, role), ps)) = collision {
        return InfeasibilityCause::PresetCollision {
            team: team + 1,
            role,
            players: ps
                .into_iter()
                .map(|p| roster.players[p].name.clone())
                .collect(),
        };
    }
    if plan.mode == CaptainMode::Hard {
        return InfeasibilityCause::CaptainPolicy {
            detail: format!(
                "hard '{}' constraints conflict with presets or role coverage",
                plan.policy
            ),
        };
    }
    InfeasibilityCause::RoleCoverage
}
