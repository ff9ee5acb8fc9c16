//! Balance, conflict and captain penalty terms.
//!
//! Each term is linearized with its own auxiliary variables:
//!
//! * balance: `d_t >= S_t - mean`, `d_t >= mean - S_t`, minimise `Σ d_t`
//! * conflict: `y <= x_at`, `y <= x_bt`, `y >= x_at + x_bt - 1`, minimise `Σ y`
//! * captains: per-team slack `m_t >= 1 - C_t` or `k_t >= C_t - 1`, minimise `Σ slack`
//!
//! The bounds on `d_t` and `y` are only tight because they are minimised with
//! a non-negative weight.

use log::{debug, info};

use crate::config::BalanceConfig;
use crate::data::{CaptainMode, CaptainPolicy, TeamIndex};
use crate::model::{AssignmentVars, ConstraintClass, LinearExpr, LinearModel, Sense, VarId, VarKind};
use crate::relax::CaptainPlan;
use crate::roster::{AvoidEdge, Roster};

#[derive(Debug, Clone, Copy)]
pub struct ConflictVar {
    pub edge: AvoidEdge,
    pub team: TeamIndex,
    pub var: VarId,
}

/// Handles to everything the assembler added, for reading values back.
#[derive(Debug, Clone)]
pub struct ObjectiveTerms {
    pub team_scores: Vec<LinearExpr>,
    pub mean_score: LinearExpr,
    pub deviations: Vec<VarId>,
    pub conflicts: Vec<ConflictVar>,
    pub captain_counts: Vec<LinearExpr>,
    pub captain_slack: Vec<VarId>,
    pub balance: LinearExpr,
    pub conflict: LinearExpr,
    pub captain: LinearExpr,
}

pub fn assemble_objective(
    model: &mut LinearModel,
    x: &AssignmentVars,
    roster: &Roster<'_>,
    config: &BalanceConfig,
    captains: CaptainPlan,
) -> ObjectiveTerms {
    let teams = roster.team_count;

    // S_t = Σ role_weight * skill * x_pt
    let team_scores: Vec<LinearExpr> = (0..teams)
        .map(|t| {
            let mut s = LinearExpr::new();
            for (p, player) in roster.players.iter().enumerate() {
                s.add_term(x.x(p, t), config.role_weight(player.role) * player.skill);
            }
            s
        })
        .collect();
    let mut mean_score = LinearExpr::new();
    for s in &team_scores {
        mean_score.add_scaled(s, 1.0 / teams as f64);
    }

    info!("Adding balance deviation variables...");
    let mut deviations = Vec::with_capacity(teams);
    for (t, score) in team_scores.iter().enumerate() {
        let d = model.add_var(format!("d_t{t}"), VarKind::NonNegative);
        // S_t - mean - d_t <= 0
        let mut above = score.clone();
        above.add_scaled(&mean_score, -1.0).add_term(d, -1.0);
        model.add_constraint(above, Sense::Le, 0.0, ConstraintClass::BalanceDeviation);
        // mean - S_t - d_t <= 0
        let mut below = mean_score.clone();
        below.add_scaled(score, -1.0).add_term(d, -1.0);
        model.add_constraint(below, Sense::Le, 0.0, ConstraintClass::BalanceDeviation);
        deviations.push(d);
    }

    if !roster.avoid_edges.is_empty() {
        info!("Adding conflict variables for {} avoid pairs...", roster.avoid_edges.len());
    }
    let mut conflicts = Vec::new();
    for &edge in &roster.avoid_edges {
        for t in 0..teams {
            // no y when a preset keeps either player off this team
            if !roster.can_play_for(edge.from, t) || !roster.can_play_for(edge.to, t) {
                continue;
            }
            let y = model.add_var(format!("y_{}_{}_t{t}", edge.from, edge.to), VarKind::Binary);
            let (xa, xb) = (x.x(edge.from, t), x.x(edge.to, t));
            let mut le_a = LinearExpr::sum([y]);
            le_a.add_term(xa, -1.0);
            model.add_constraint(le_a, Sense::Le, 0.0, ConstraintClass::ConflictLink);
            let mut le_b = LinearExpr::sum([y]);
            le_b.add_term(xb, -1.0);
            model.add_constraint(le_b, Sense::Le, 0.0, ConstraintClass::ConflictLink);
            let mut ge = LinearExpr::sum([y]);
            ge.add_term(xa, -1.0).add_term(xb, -1.0);
            model.add_constraint(ge, Sense::Ge, -1.0, ConstraintClass::ConflictLink);
            conflicts.push(ConflictVar { edge, team: t, var: y });
        }
    }

    // C_t = Σ captain x_pt
    let captain_counts: Vec<LinearExpr> = (0..teams)
        .map(|t| {
            LinearExpr::sum(
                roster
                    .players
                    .iter()
                    .enumerate()
                    .filter(|(_, pl)| pl.captain)
                    .map(|(p, _)| x.x(p, t)),
            )
        })
        .collect();

    let mut captain_slack = Vec::new();
    match (captains.policy, captains.mode) {
        (CaptainPolicy::None, _) | (_, CaptainMode::Off) => {}
        (CaptainPolicy::AtLeastOne, CaptainMode::Hard) => {
            info!("Adding hard 'at least one captain' constraints...");
            for c in &captain_counts {
                model.add_constraint(c.clone(), Sense::Ge, 1.0, ConstraintClass::CaptainPolicy);
            }
        }
        (CaptainPolicy::Separate, CaptainMode::Hard) => {
            info!("Adding hard 'at most one captain' constraints...");
            for c in &captain_counts {
                model.add_constraint(c.clone(), Sense::Le, 1.0, ConstraintClass::CaptainPolicy);
            }
        }
        (CaptainPolicy::AtLeastOne, CaptainMode::Soft) => {
            info!("Adding soft 'at least one captain' penalties...");
            for (t, c) in captain_counts.iter().enumerate() {
                let m = model.add_var(format!("capt_min_violation_t{t}"), VarKind::NonNegative);
                // m_t >= 1 - C_t  <=>  C_t + m_t >= 1
                let mut lhs = c.clone();
                lhs.add_term(m, 1.0);
                model.add_constraint(lhs, Sense::Ge, 1.0, ConstraintClass::CaptainPolicy);
                captain_slack.push(m);
            }
        }
        (CaptainPolicy::Separate, CaptainMode::Soft) => {
            info!("Adding soft 'at most one captain' penalties...");
            for (t, c) in captain_counts.iter().enumerate() {
                let k = model.add_var(format!("capt_max_violation_t{t}"), VarKind::NonNegative);
                // k_t >= C_t - 1  <=>  C_t - k_t <= 1
                let mut lhs = c.clone();
                lhs.add_term(k, -1.0);
                model.add_constraint(lhs, Sense::Le, 1.0, ConstraintClass::CaptainPolicy);
                captain_slack.push(k);
            }
        }
    }

    let balance = LinearExpr::sum(deviations.iter().copied());
    let conflict = LinearExpr::sum(conflicts.iter().map(|c| c.var));
    let captain = LinearExpr::sum(captain_slack.iter().copied());

    let mut objective = LinearExpr::new();
    objective
        .add_scaled(&balance, config.balance_weight)
        .add_scaled(&conflict, config.conflict_weight)
        .add_scaled(&captain, config.captain_weight);
    model.set_objective(objective);
    debug!(
        "Objective: {} deviation, {} conflict, {} captain slack variables",
        deviations.len(),
        conflicts.len(),
        captain_slack.len()
    );

    ObjectiveTerms {
        team_scores,
        mean_score,
        deviations,
        conflicts,
        captain_counts,
        captain_slack,
        balance,
        conflict,
        captain,
    }
}
