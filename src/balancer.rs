//! End-to-end balancing: validate, build, solve, extract.

use log::{info, warn};
use std::time::Instant;

use crate::config::BalanceConfig;
use crate::data::{CaptainMode, Player, Solution, SolveStatus, Warning};
use crate::error::{BalanceError, InfeasibilityCause, Result};
use crate::extract::extract_solution;
use crate::model::build_assignment;
use crate::objective::assemble_objective;
use crate::relax::{CaptainPlan, diagnose_infeasibility, plan_captains};
use crate::roster::{Roster, validate};
use crate::solver::{RawStatus, Solver, SolverOutcome};

/// Assigns `players` to teams under `config` using `solver`.
///
/// A solve that comes back infeasible while hard captain constraints are in
/// the model is retried once with them softened, unless presets already
/// explain the failure or the config forbids softening.
pub fn balance(players: &[Player], config: &BalanceConfig, solver: &dyn Solver) -> Result<Solution> {
    let start_time = Instant::now();
    let roster = validate(players, config)?;
    let mut warnings = roster.warnings.clone();
    let plan = plan_captains(&roster, config, &mut warnings)?;

    let solution = match solve_once(&roster, config, solver, plan, &mut warnings)? {
        Some(solution) => solution,
        None => {
            let cause = diagnose_infeasibility(&roster, plan);
            let retry = plan.mode == CaptainMode::Hard
                && !config.captain_strict
                && !matches!(cause, InfeasibilityCause::PresetCollision { .. });
            if !retry {
                return Err(BalanceError::Infeasible { cause });
            }

            let warning = Warning::CaptainRetrySoftened {
                policy: plan.policy,
            };
            warn!("{warning}");
            warnings.push(warning);
            let softened = plan.softened();
            match solve_once(&roster, config, solver, softened, &mut warnings)? {
                Some(solution) => solution,
                None => {
                    return Err(BalanceError::Infeasible {
                        cause: diagnose_infeasibility(&roster, softened),
                    });
                }
            }
        }
    };

    info!(
        "Balanced {} players into {} teams in {:.2?} (objective {:.2})",
        players.len(),
        solution.teams.len(),
        start_time.elapsed(),
        solution.objective.total
    );
    Ok(solution)
}

/// One build/solve/extract cycle. `None` means the solver proved infeasibility.
fn solve_once(
    roster: &Roster<'_>,
    config: &BalanceConfig,
    solver: &dyn Solver,
    plan: CaptainPlan,
    warnings: &mut Vec<Warning>,
) -> Result<Option<Solution>> {
    let (mut model, x) = build_assignment(roster);
    let terms = assemble_objective(&mut model, &x, roster, config, plan);

    info!("Solving with {} ({:?} captains)...", solver.name(), plan.mode);
    let (raw, values) = match solver.solve(&model, &config.solve_params())? {
        SolverOutcome::Infeasible => return Ok(None),
        SolverOutcome::Solved { status, values } => (status, values),
    };
    if values.len() != model.vars().len() {
        return Err(BalanceError::Solver(format!(
            "expected {} variable values, got {}",
            model.vars().len(),
            values.len()
        )));
    }

    let status = match raw {
        RawStatus::Optimal => SolveStatus::Optimal,
        RawStatus::Feasible => {
            warn!("{}", Warning::NotProvenOptimal);
            warnings.push(Warning::NotProvenOptimal);
            SolveStatus::Feasible
        }
    };
    extract_solution(
        roster,
        config,
        &x,
        &terms,
        plan,
        status,
        &values,
        warnings.clone(),
    )
    .map(Some)
}
