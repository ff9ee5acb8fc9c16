//! Run configuration.
//!
//! Loaded from YAML with the same defaults the signup tooling has always used,
//! so a config file only has to name what it changes:
//!
//! ```yaml
//! roles: [1, 2, 3, 4, 5]
//! captain_policy: at_least_one
//! captain_hard: true
//! presets:
//!   alice: 1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::data::{CaptainPolicy, RoleId, TeamNumber};
use crate::error::{BalanceError, Result};
use crate::solver::SolveParams;

/// Everything the core needs for one assignment problem.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// `None` means infer from the roster.
    pub num_teams: Option<usize>,
    pub roles: Vec<RoleId>,
    /// Missing roles weigh 1.0.
    pub role_weights: BTreeMap<RoleId, f64>,
    pub captain_policy: CaptainPolicy,
    pub captain_hard: bool,
    /// Never soften a hard captain policy; fail instead.
    pub captain_strict: bool,
    pub balance_weight: f64,
    pub conflict_weight: f64,
    pub captain_weight: f64,
    /// Player name -> 1-based team number.
    pub presets: BTreeMap<String, TeamNumber>,
    pub random_seed: u64,
    pub time_limit_secs: f64,
    pub workers: u32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            num_teams: None,
            roles: vec![1, 2, 3, 4, 5],
            role_weights: BTreeMap::new(),
            captain_policy: CaptainPolicy::None,
            captain_hard: false,
            captain_strict: false,
            balance_weight: 1.0,
            conflict_weight: 1.0,
            captain_weight: 5.0,
            presets: BTreeMap::new(),
            random_seed: 42,
            time_limit_secs: 30.0,
            workers: 8,
        }
    }
}

impl BalanceConfig {
    pub fn role_weight(&self, role: RoleId) -> f64 {
        self.role_weights.get(&role).copied().unwrap_or(1.0)
    }

    /// Sorted, deduplicated role set.
    pub fn role_set(&self) -> Vec<RoleId> {
        let mut roles = self.roles.clone();
        roles.sort_unstable();
        roles.dedup();
        roles
    }

    /// Assumes [`validate`](Self::validate) passed; an unrepresentable limit saturates.
    pub fn solve_params(&self) -> SolveParams {
        SolveParams {
            time_limit: Duration::try_from_secs_f64(self.time_limit_secs).unwrap_or(Duration::MAX),
            seed: self.random_seed,
            workers: self.workers,
        }
    }

    /// Rejects settings under which the linearized objective stops being exact.
    pub fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(BalanceError::InvalidConfig("role set is empty".into()));
        }
        let weights = [
            ("balance_weight", self.balance_weight),
            ("conflict_weight", self.conflict_weight),
            ("captain_weight", self.captain_weight),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(BalanceError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number (got {w})"
                )));
            }
        }
        for (role, w) in &self.role_weights {
            if !w.is_finite() {
                return Err(BalanceError::InvalidConfig(format!(
                    "weight for role {role} is not finite"
                )));
            }
        }
        let representable = Duration::try_from_secs_f64(self.time_limit_secs).is_ok();
        if !representable || self.time_limit_secs <= 0.0 {
            return Err(BalanceError::InvalidConfig(format!(
                "time_limit_secs must be a positive, representable duration (got {})",
                self.time_limit_secs
            )));
        }
        if self.workers == 0 {
            return Err(BalanceError::InvalidConfig("workers must be at least 1".into()));
        }
        Ok(())
    }
}

/// Config file layout: the balancing settings plus where outputs go.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default = "default_run_name")]
    pub run_name: String,
    #[serde(default = "default_output_root")]
    pub output_root: String,
    #[serde(flatten)]
    pub balance: BalanceConfig,
}

fn default_run_name() -> String {
    "team_run".to_string()
}

fn default_output_root() -> String {
    "./outputs".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: default_run_name(),
            output_root: default_output_root(),
            balance: BalanceConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        // An empty document is a valid "all defaults" config.
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn run_dir(&self) -> std::path::PathBuf {
        Path::new(&self.output_root).join(&self.run_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg = RunConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg, RunConfig::default());
        assert_eq!(cfg.balance.roles, vec![1, 2, 3, 4, 5]);
        assert_eq!(cfg.balance.captain_weight, 5.0);
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let cfg = RunConfig::from_yaml_str(
            r#"
run_name: friday
num_teams: 4
roles: [1, 2]
role_weights:
  1: 1.5
captain_policy: separate
captain_hard: true
presets:
  alice: 2
"#,
        )
        .unwrap();
        assert_eq!(cfg.run_name, "friday");
        assert_eq!(cfg.output_root, "./outputs");
        assert_eq!(cfg.balance.num_teams, Some(4));
        assert_eq!(cfg.balance.role_weight(1), 1.5);
        assert_eq!(cfg.balance.role_weight(2), 1.0);
        assert_eq!(cfg.balance.captain_policy, CaptainPolicy::Separate);
        assert!(cfg.balance.captain_hard);
        assert_eq!(cfg.balance.presets.get("alice"), Some(&2));
        assert_eq!(cfg.balance.random_seed, 42);
    }

    #[test]
    fn unknown_captain_policy_is_rejected() {
        let err = RunConfig::from_yaml_str("captain_policy: everyone").unwrap_err();
        assert!(matches!(err, BalanceError::Yaml(_)));
    }

    #[test]
    fn negative_weight_fails_validation() {
        let cfg = BalanceConfig {
            conflict_weight: -1.0,
            ..BalanceConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(BalanceError::InvalidConfig(_))));
    }

    #[test]
    fn unrepresentable_time_limit_fails_validation() {
        for secs in [1e20, f64::INFINITY, f64::NAN, 0.0] {
            let cfg = BalanceConfig {
                time_limit_secs: secs,
                ..BalanceConfig::default()
            };
            assert!(
                matches!(cfg.validate(), Err(BalanceError::InvalidConfig(_))),
                "{secs}"
            );
        }
        let cfg = BalanceConfig {
            time_limit_secs: 1e20,
            ..BalanceConfig::default()
        };
        assert_eq!(cfg.solve_params().time_limit, Duration::MAX);
    }

    #[test]
    fn role_set_is_sorted_and_deduplicated() {
        let cfg = BalanceConfig {
            roles: vec![3, 1, 3, 2],
            ..BalanceConfig::default()
        };
        assert_eq!(cfg.role_set(), vec![1, 2, 3]);
    }
}
