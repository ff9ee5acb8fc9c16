//! Role-balanced team assignment as a mixed-integer program.
//!
//! Players are validated ([`roster`]), turned into a solver-independent
//! linear model ([`model`], [`objective`]), checked for captain-policy
//! feasibility ([`relax`]), solved through a [`solver::Solver`] and read back
//! into a [`data::Solution`] ([`extract`]). [`balancer::balance`] runs the
//! whole pipeline.

pub mod balancer;
pub mod config;
pub mod data;
pub mod error;
pub mod extract;
pub mod io;
pub mod model;
pub mod objective;
pub mod relax;
pub mod roster;
pub mod server;
pub mod solver;

pub use balancer::balance;
pub use config::{BalanceConfig, RunConfig};
pub use data::{CaptainPolicy, Player, Solution, SolveStatus, Warning};
pub use error::{BalanceError, InfeasibilityCause, Result};
pub use solver::{HighsSolver, SolveParams, Solver};
