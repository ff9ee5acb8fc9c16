//! Solver-independent linear model and the hard structural constraints.
//!
//! The model is plain data: variables, linear expressions over them, and
//! tagged constraints. A [`crate::solver::Solver`] turns it into whatever its
//! backend needs.

use log::{debug, info};
use serde::Serialize;

use crate::data::TeamIndex;
use crate::roster::Roster;

pub type VarId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    /// Continuous, bounded below by zero.
    NonNegative,
}

#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

/// `constant + Σ coef * var`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    pub fn add_constant(&mut self, c: f64) -> &mut Self {
        self.constant += c;
        self
    }

    /// `self += scale * other`
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|(v, c)| (*v, c * scale)));
        self.constant += other.constant * scale;
        self
    }

    pub fn eval(&self, values: &[f64]) -> f64 {
        self.constant + self.terms.iter().map(|(v, c)| c * values[*v]).sum::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

/// What a constraint is for; used to explain infeasibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintClass {
    PlayerPartition,
    RoleCoverage,
    Preset,
    BalanceDeviation,
    ConflictLink,
    CaptainPolicy,
}

/// `lhs <sense> rhs`
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub lhs: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
    pub class: ConstraintClass,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.eval(values);
        match self.sense {
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
        }
    }
}

/// A minimisation problem.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    vars: Vec<VarDef>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: impl Into<String>, kind: VarKind) -> VarId {
        self.vars.push(VarDef {
            name: name.into(),
            kind,
        });
        self.vars.len() - 1
    }

    pub fn add_constraint(
        &mut self,
        lhs: LinearExpr,
        sense: Sense,
        rhs: f64,
        class: ConstraintClass,
    ) {
        self.constraints.push(LinearConstraint {
            lhs,
            sense,
            rhs,
            class,
        });
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn count_class(&self, class: ConstraintClass) -> usize {
        self.constraints.iter().filter(|c| c.class == class).count()
    }
}

/// The x(p, t) matrix, row-major by player.
#[derive(Debug, Clone)]
pub struct AssignmentVars {
    vars: Vec<VarId>,
    team_count: usize,
}

impl AssignmentVars {
    pub fn x(&self, player: usize, team: TeamIndex) -> VarId {
        self.vars[player * self.team_count + team]
    }

    pub fn team_count(&self) -> usize {
        self.team_count
    }

    pub fn player_count(&self) -> usize {
        self.vars.len() / self.team_count.max(1)
    }
}

/// Creates x(p, t) and adds partition, role coverage and preset constraints.
pub fn build_assignment(roster: &Roster<'_>) -> (LinearModel, AssignmentVars) {
    let teams = roster.team_count;
    let players = roster.players;
    let mut model = LinearModel::new();

    // x_pt = 1 if player p plays for team t
    let vars = (0..players.len())
        .flat_map(|p| (0..teams).map(move |t| (p, t)))
        .map(|(p, t)| model.add_var(format!("x_p{p}_t{t}"), VarKind::Binary))
        .collect();
    let x = AssignmentVars {
        vars,
        team_count: teams,
    };
    debug!("Created {} assignment variables", players.len() * teams);

    info!("Adding 'one team per player' constraints...");
    for p in 0..players.len() {
        let row = LinearExpr::sum((0..teams).map(|t| x.x(p, t)));
        model.add_constraint(row, Sense::Eq, 1.0, ConstraintClass::PlayerPartition);
    }

    info!("Adding 'one player per role per team' constraints...");
    for t in 0..teams {
        for role in &roster.roles {
            let slot = LinearExpr::sum(
                players
                    .iter()
                    .enumerate()
                    .filter(|(_, pl)| pl.role == *role)
                    .map(|(p, _)| x.x(p, t)),
            );
            model.add_constraint(slot, Sense::Eq, 1.0, ConstraintClass::RoleCoverage);
        }
    }

    if !roster.presets.is_empty() {
        info!("Pinning {} preset players...", roster.presets.len());
    }
    for &(p, pinned) in &roster.presets {
        for t in 0..teams {
            let rhs = if t == pinned { 1.0 } else { 0.0 };
            model.add_constraint(
                LinearExpr::sum([x.x(p, t)]),
                Sense::Eq,
                rhs,
                ConstraintClass::Preset,
            );
        }
    }

    (model, x)
}
