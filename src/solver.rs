use good_lp::solvers::SolutionStatus;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    default_solver, variable,
};
use log::{info, trace};
use std::time::{Duration, Instant};

use crate::error::{BalanceError, Result};
use crate::model::{LinearExpr, LinearModel, Sense, VarKind};

/// Knobs passed to the engine for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveParams {
    pub time_limit: Duration,
    pub seed: u64,
    pub workers: u32,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            seed: 42,
            workers: 8,
        }
    }
}

/// Whether the returned values are a proven optimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    Optimal,
    /// Stopped by the time budget with an incumbent.
    Feasible,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// One value per model variable, indexed by `VarId`.
    Solved { status: RawStatus, values: Vec<f64> },
    Infeasible,
}

/// A discrete optimisation engine that minimises a [`LinearModel`].
pub trait Solver {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &LinearModel, params: &SolveParams) -> Result<SolverOutcome>;
}

/// HiGHS MILP backend through `good_lp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver {
    pub verbose: bool,
}

/// HiGHS reports `GapLimit` for a model it calls optimal whenever the final gap
/// is nonzero. With `mip_rel_gap = 0` that gap is within the absolute MIP
/// tolerance, and no objective bound or target is set, so it counts as proven.
/// Every limit-based stop (time, iterations, memory) arrives as `TimeLimit`.
fn raw_status(status: SolutionStatus) -> RawStatus {
    match status {
        SolutionStatus::Optimal | SolutionStatus::GapLimit => RawStatus::Optimal,
        SolutionStatus::TimeLimit => RawStatus::Feasible,
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    let mut out = Expression::with_capacity(expr.terms.len());
    for &(v, coef) in &expr.terms {
        out.add_mul(coef, vars[v]);
    }
    out + expr.constant
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, model: &LinearModel, params: &SolveParams) -> Result<SolverOutcome> {
        let start_time = Instant::now();
        info!(
            "Setting up MILP with {} variables and {} constraints...",
            model.vars().len(),
            model.constraints().len()
        );

        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = model
            .vars()
            .iter()
            .map(|def| match def.kind {
                VarKind::Binary => problem.add(variable().binary().name(&def.name)),
                VarKind::NonNegative => problem.add(variable().min(0.0).name(&def.name)),
            })
            .collect();

        // HiGHS takes the seed as a non-negative i32
        let seed = (params.seed % i32::MAX as u64) as i32;
        let mut highs = problem
            .minimise(to_expression(model.objective(), &vars))
            .using(default_solver)
            .set_option("threads", params.workers as i32)
            .set_option("random_seed", seed)
            .set_option("time_limit", params.time_limit.as_secs_f64())
            // optimal means proven, not within the default relative gap
            .set_option("mip_rel_gap", 0.0)
            .set_option("output_flag", self.verbose);

        for c in model.constraints() {
            let lhs = to_expression(&c.lhs, &vars);
            let constraint = match c.sense {
                Sense::Eq => lhs.eq(c.rhs),
                Sense::Le => lhs.leq(c.rhs),
                Sense::Ge => lhs.geq(c.rhs),
            };
            highs.add_constraint(constraint);
        }
        trace!("Model handed to HiGHS in {:.2?}", start_time.elapsed());

        info!(
            "Starting HiGHS (threads={}, seed={}, time limit={:.1?})...",
            params.workers, params.seed, params.time_limit
        );
        let solution = match highs.solve() {
            Ok(s) => s,
            Err(ResolutionError::Infeasible) => {
                info!("HiGHS reports the model infeasible after {:.2?}", start_time.elapsed());
                return Ok(SolverOutcome::Infeasible);
            }
            Err(e) => return Err(BalanceError::Solver(e.to_string())),
        };
        let status = raw_status(solution.status());
        info!("Solution ({status:?}) found in {:.2?}", start_time.elapsed());

        let values = vars.iter().map(|v| solution.value(*v)).collect();
        Ok(SolverOutcome::Solved { status, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_limit_stops_are_reported_as_feasible() {
        assert_eq!(raw_status(SolutionStatus::Optimal), RawStatus::Optimal);
        assert_eq!(raw_status(SolutionStatus::GapLimit), RawStatus::Optimal);
        assert_eq!(raw_status(SolutionStatus::TimeLimit), RawStatus::Feasible);
    }
}
