//! Roster validation: everything that can be rejected before a model exists.

use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

use crate::config::BalanceConfig;
use crate::data::{Player, RoleId, TeamIndex, Warning};
use crate::error::{BalanceError, Result};

/// "`from` prefers not to share a team with `to`", as player indices.
///
/// One edge per unordered pair; `mutual` is set when `to` also avoids `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AvoidEdge {
    pub from: usize,
    pub to: usize,
    pub mutual: bool,
}

/// A roster that passed validation, with names resolved to indices.
#[derive(Debug, Clone)]
pub struct Roster<'a> {
    pub players: &'a [Player],
    pub roles: Vec<RoleId>,
    pub team_count: usize,
    pub avoid_edges: Vec<AvoidEdge>,
    /// (player index, zero-based team), sorted by player.
    pub presets: Vec<(usize, TeamIndex)>,
    pub warnings: Vec<Warning>,
}

impl Roster<'_> {
    pub fn preset_team(&self, player: usize) -> Option<TeamIndex> {
        self.presets
            .iter()
            .find(|(p, _)| *p == player)
            .map(|(_, t)| *t)
    }

    /// False when a preset pins the player elsewhere.
    pub fn can_play_for(&self, player: usize, team: TeamIndex) -> bool {
        self.preset_team(player).is_none_or(|t| t == team)
    }

    pub fn captain_count(&self) -> usize {
        self.players.iter().filter(|p| p.captain).count()
    }
}

pub fn validate<'a>(players: &'a [Player], config: &BalanceConfig) -> Result<Roster<'a>> {
    config.validate()?;
    if players.is_empty() {
        return Err(BalanceError::EmptyRoster);
    }

    let duplicates: Vec<String> = players
        .iter()
        .map(|p| p.name.clone())
        .duplicates()
        .collect();
    if !duplicates.is_empty() {
        return Err(BalanceError::DuplicateName(duplicates));
    }

    let roles = config.role_set();
    if let Some(p) = players.iter().find(|p| roles.binary_search(&p.role).is_err()) {
        return Err(BalanceError::UnknownRole {
            player: p.name.clone(),
            role: p.role,
            allowed: roles,
        });
    }

    if let Some(p) = players.iter().find(|p| !p.skill.is_finite()) {
        return Err(BalanceError::InvalidSkill {
            player: p.name.clone(),
            skill: p.skill,
        });
    }

    let counts = players.iter().map(|p| p.role).counts();
    let team_count = match config.num_teams {
        Some(0) => return Err(BalanceError::InvalidTeamCount(0)),
        Some(n) => n,
        None => counts.values().copied().max().unwrap_or(0),
    };
    let offending: Vec<(RoleId, usize)> = roles
        .iter()
        .map(|r| (*r, counts.get(r).copied().unwrap_or(0)))
        .filter(|(_, n)| *n != team_count)
        .collect();
    if !offending.is_empty() {
        return Err(BalanceError::RoleCountMismatch {
            expected: team_count,
            offending,
        });
    }
    // Implied by the per-role counts above; kept as a guard on the model size.
    if players.len() != team_count * roles.len() {
        return Err(BalanceError::RosterSizeMismatch {
            players: players.len(),
            teams: team_count,
            roles: roles.len(),
        });
    }
    info!(
        "Roster: {} players, {} roles, {} teams{}",
        players.len(),
        roles.len(),
        team_count,
        if config.num_teams.is_none() { " (inferred)" } else { "" }
    );

    let index: HashMap<&str, usize> = players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    let mut presets = Vec::with_capacity(config.presets.len());
    for (name, team) in &config.presets {
        let Some(&p) = index.get(name.as_str()) else {
            return Err(BalanceError::InvalidPreset {
                player: name.clone(),
                reason: "player not found in roster".into(),
            });
        };
        if !(1..=team_count).contains(team) {
            return Err(BalanceError::InvalidPreset {
                player: name.clone(),
                reason: format!("team {team} out of range 1..={team_count}"),
            });
        }
        presets.push((p, team - 1));
    }
    presets.sort_unstable();

    let mut warnings = Vec::new();
    let mut edges: BTreeMap<(usize, usize), AvoidEdge> = BTreeMap::new();
    for (i, player) in players.iter().enumerate() {
        let Some(target) = player.avoid.as_deref() else {
            continue;
        };
        match index.get(target) {
            Some(&j) if j == i => warnings.push(Warning::SelfAvoid {
                player: player.name.clone(),
            }),
            Some(&j) => {
                edges
                    .entry((i.min(j), i.max(j)))
                    .and_modify(|e| e.mutual |= e.from != i)
                    .or_insert(AvoidEdge {
                        from: i,
                        to: j,
                        mutual: false,
                    });
            }
            None => warnings.push(Warning::UnresolvedAvoid {
                player: player.name.clone(),
                target: target.to_string(),
            }),
        }
    }
    for w in &warnings {
        warn!("{w}");
    }
    debug!("{} distinct avoid pairs, {} presets", edges.len(), presets.len());

    Ok(Roster {
        players,
        roles,
        team_count,
        avoid_edges: edges.into_values().collect(),
        presets,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(roles: Vec<RoleId>) -> BalanceConfig {
        BalanceConfig {
            roles,
            ..BalanceConfig::default()
        }
    }

    fn two_by_two() -> Vec<Player> {
        vec![
            Player::new("a", 10.0, 1),
            Player::new("b", 10.0, 1),
            Player::new("c", 10.0, 2),
            Player::new("d", 10.0, 2),
        ]
    }

    #[test]
    fn infers_team_count_from_role_sizes() {
        let players = two_by_two();
        let roster = validate(&players, &config(vec![1, 2])).unwrap();
        assert_eq!(roster.team_count, 2);
        assert_eq!(roster.roles, vec![1, 2]);
        assert!(roster.warnings.is_empty());
    }

    #[test]
    fn uneven_roles_are_a_count_mismatch() {
        let mut players = two_by_two();
        players[1].role = 2;
        let err = validate(&players, &config(vec![1, 2])).unwrap_err();
        match err {
            BalanceError::RoleCountMismatch {
                expected,
                offending,
            } => {
                assert_eq!(expected, 3);
                assert_eq!(offending, vec![(1, 1)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_team_count_must_match_every_role() {
        let players = two_by_two();
        let cfg = BalanceConfig {
            num_teams: Some(3),
            ..config(vec![1, 2])
        };
        let err = validate(&players, &cfg).unwrap_err();
        assert!(matches!(err, BalanceError::RoleCountMismatch { expected: 3, .. }));
    }

    #[test]
    fn configured_role_without_players_is_a_mismatch() {
        let players = two_by_two();
        let err = validate(&players, &config(vec![1, 2, 3])).unwrap_err();
        match err {
            BalanceError::RoleCountMismatch { offending, .. } => {
                assert_eq!(offending, vec![(3, 0)])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut players = two_by_two();
        players[3].name = "a".into();
        let err = validate(&players, &config(vec![1, 2])).unwrap_err();
        assert!(matches!(err, BalanceError::DuplicateName(ref n) if n == &["a".to_string()]));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut players = two_by_two();
        players[0].role = 9;
        let err = validate(&players, &config(vec![1, 2])).unwrap_err();
        assert!(matches!(err, BalanceError::UnknownRole { role: 9, .. }));
    }

    #[test]
    fn zero_teams_is_rejected() {
        let players = two_by_two();
        let cfg = BalanceConfig {
            num_teams: Some(0),
            ..config(vec![1, 2])
        };
        assert!(matches!(
            validate(&players, &cfg),
            Err(BalanceError::InvalidTeamCount(0))
        ));
    }

    #[test]
    fn presets_must_be_in_range_and_known() {
        let players = two_by_two();
        let mut cfg = config(vec![1, 2]);
        cfg.presets.insert("a".into(), 3);
        assert!(matches!(
            validate(&players, &cfg),
            Err(BalanceError::InvalidPreset { ref player, .. }) if player == "a"
        ));

        cfg.presets.clear();
        cfg.presets.insert("zed".into(), 1);
        assert!(matches!(
            validate(&players, &cfg),
            Err(BalanceError::InvalidPreset { ref player, .. }) if player == "zed"
        ));

        cfg.presets.clear();
        cfg.presets.insert("c".into(), 2);
        let roster = validate(&players, &cfg).unwrap();
        assert_eq!(roster.presets, vec![(2, 1)]);
        assert!(roster.can_play_for(2, 1));
        assert!(!roster.can_play_for(2, 0));
        assert!(roster.can_play_for(0, 0));
    }

    #[test]
    fn avoid_references_are_resolved_and_deduplicated() {
        let mut players = two_by_two();
        players[0].avoid = Some("c".into());
        players[2].avoid = Some("a".into());
        players[1].avoid = Some("nobody".into());
        players[3].avoid = Some("d".into());
        let roster = validate(&players, &config(vec![1, 2])).unwrap();
        assert_eq!(
            roster.avoid_edges,
            vec![AvoidEdge {
                from: 0,
                to: 2,
                mutual: true
            }]
        );
        assert_eq!(
            roster.warnings,
            vec![
                Warning::UnresolvedAvoid {
                    player: "b".into(),
                    target: "nobody".into()
                },
                Warning::SelfAvoid { player: "d".into() },
            ]
        );
    }

    #[test]
    fn avoid_direction_is_kept_when_the_avoider_comes_later() {
        let mut players = two_by_two();
        players[3].avoid = Some("a".into());
        let roster = validate(&players, &config(vec![1, 2])).unwrap();
        assert_eq!(
            roster.avoid_edges,
            vec![AvoidEdge {
                from: 3,
                to: 0,
                mutual: false
            }]
        );
    }

    #[test]
    fn non_finite_skill_is_rejected() {
        let mut players = two_by_two();
        players[2].skill = f64::NAN;
        let err = validate(&players, &config(vec![1, 2])).unwrap_err();
        assert!(matches!(err, BalanceError::InvalidSkill { ref player, .. } if player == "c"));
        assert!(err.is_input_error());

        players[2].skill = f64::INFINITY;
        assert!(matches!(
            validate(&players, &config(vec![1, 2])),
            Err(BalanceError::InvalidSkill { .. })
        ));
    }
}
