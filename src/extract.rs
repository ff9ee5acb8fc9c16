use log::debug;

use crate::config::BalanceConfig;
use crate::data::{
    AvoidConflict, CaptainMode, CaptainPolicy, Member, ObjectiveBreakdown, Solution, SolveStatus,
    TeamIndex, TeamRoster, Warning,
};
use crate::error::{BalanceError, Result};
use crate::model::AssignmentVars;
use crate::objective::ObjectiveTerms;
use crate::relax::CaptainPlan;
use crate::roster::Roster;

/// Binary values above this count as true.
const TRUE_THRESHOLD: f64 = 0.5;

/// Reads x(p, t) into a team per player.
pub fn read_assignment(x: &AssignmentVars, values: &[f64]) -> Result<Vec<TeamIndex>> {
    (0..x.player_count())
        .map(|p| {
            (0..x.team_count())
                .find(|&t| values[x.x(p, t)] > TRUE_THRESHOLD)
                .ok_or_else(|| {
                    BalanceError::Solver(format!("solver left player #{p} without a team"))
                })
        })
        .collect()
}

/// Packages a solved model into a [`Solution`].
///
/// Scores, captain counts and objective components are recomputed from the
/// assignment itself; at a time-limited feasible point the auxiliary variables
/// may be loose, so they only feed `model_objective`.
#[allow(clippy::too_many_arguments)]
pub fn extract_solution(
    roster: &Roster<'_>,
    config: &BalanceConfig,
    x: &AssignmentVars,
    terms: &ObjectiveTerms,
    captains: CaptainPlan,
    status: SolveStatus,
    values: &[f64],
    warnings: Vec<Warning>,
) -> Result<Solution> {
    let team_of = read_assignment(x, values)?;
    let teams = roster.team_count;

    let mut rosters: Vec<TeamRoster> = (0..teams)
        .map(|t| TeamRoster {
            team: t + 1,
            members: Vec::new(),
            score: 0.0,
            deviation: 0.0,
            captains: 0,
        })
        .collect();
    for (p, &t) in team_of.iter().enumerate() {
        let player = &roster.players[p];
        let team = &mut rosters[t];
        team.score += config.role_weight(player.role) * player.skill;
        team.captains += usize::from(player.captain);
        team.members.push(Member {
            name: player.name.clone(),
            role: player.role,
            skill: player.skill,
            captain: player.captain,
        });
    }
    let target_score = rosters.iter().map(|t| t.score).sum::<f64>() / teams as f64;
    for team in &mut rosters {
        team.members.sort_by_key(|m| m.role);
        team.deviation = (team.score - target_score).abs();
    }

    let conflicts: Vec<AvoidConflict> = roster
        .avoid_edges
        .iter()
        .filter(|e| team_of[e.from] == team_of[e.to])
        .map(|e| AvoidConflict {
            team: team_of[e.from] + 1,
            player: roster.players[e.from].name.clone(),
            avoids: roster.players[e.to].name.clone(),
            mutual: e.mutual,
        })
        .collect();

    let captain_violations: usize = match (captains.policy, captains.mode) {
        (CaptainPolicy::None, _) | (_, CaptainMode::Off) => 0,
        (CaptainPolicy::AtLeastOne, _) => rosters.iter().filter(|t| t.captains == 0).count(),
        (CaptainPolicy::Separate, _) => rosters.iter().map(|t| t.captains.saturating_sub(1)).sum(),
    };

    let objective = weighted(
        config,
        rosters.iter().map(|t| t.deviation).sum(),
        conflicts.len() as f64,
        captain_violations as f64,
    );
    let model_objective = weighted(
        config,
        terms.balance.eval(values),
        terms.conflict.eval(values),
        terms.captain.eval(values),
    );
    debug!("Recomputed objective {objective:?}, model objective {model_objective:?}");

    Ok(Solution {
        status,
        captain_mode: captains.mode,
        teams: rosters,
        target_score,
        conflicts,
        objective,
        model_objective,
        warnings,
    })
}

fn weighted(config: &BalanceConfig, balance: f64, conflict: f64, captain: f64) -> ObjectiveBreakdown {
    ObjectiveBreakdown {
        balance,
        conflict,
        captain,
        total: config.balance_weight * balance
            + config.conflict_weight * conflict
            + config.captain_weight * captain,
    }
}
