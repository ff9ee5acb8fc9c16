//! Signup CSV parsing and run output files.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write as _};
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::data::{Member, Player, RoleId, Solution, TeamNumber};
use crate::error::Result;

/// One row of `signups.csv`.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SignupRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Skill")]
    skill: f64,
    #[serde(rename = "Position")]
    position: RoleId,
    #[serde(rename = "Captain")]
    captain: u8,
    #[serde(rename = "Avoid", default)]
    avoid: Option<String>,
}

impl From<SignupRecord> for Player {
    fn from(r: SignupRecord) -> Self {
        Player {
            name: r.name.trim().to_string(),
            skill: r.skill,
            role: r.position,
            captain: r.captain != 0,
            avoid: r
                .avoid
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        }
    }
}

/// Output row of `assignments.csv`: the signup columns plus the team.
#[derive(Debug, Serialize)]
struct AssignmentRecord<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Skill")]
    skill: f64,
    #[serde(rename = "Position")]
    position: RoleId,
    #[serde(rename = "Captain")]
    captain: u8,
    #[serde(rename = "Avoid")]
    avoid: &'a str,
    #[serde(rename = "Team")]
    team: TeamNumber,
}

pub fn read_signups(reader: impl Read) -> Result<Vec<Player>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut players = Vec::new();
    for record in rdr.deserialize::<SignupRecord>() {
        players.push(record?.into());
    }
    Ok(players)
}

pub fn load_signups(path: impl AsRef<Path>) -> Result<Vec<Player>> {
    let path = path.as_ref();
    let players = read_signups(fs::File::open(path)?)?;
    info!("Loaded {} signups from {}", players.len(), path.display());
    Ok(players)
}

/// Role bands reported alongside the overall average in `teams.md`.
const ROLE_GROUPS: [(&str, RoleId, RoleId); 2] = [("Core", 1, 3), ("Support", 4, 5)];

fn average_skill<'a>(members: impl Iterator<Item = &'a Member>) -> Option<f64> {
    let (sum, n) = members.fold((0.0, 0usize), |(s, n), m| (s + m.skill, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Markdown roster: one table per team, ordered by role.
pub fn render_markdown(solution: &Solution) -> String {
    let mut out = String::new();
    for team in &solution.teams {
        let _ = writeln!(out, "## Team {}\n", team.team);
        out.push_str("| Role | Name | Skill | Captain |\n");
        out.push_str("|-----:|------|------:|:-------:|\n");
        for m in &team.members {
            let cap = if m.captain { "yes" } else { "" };
            let _ = writeln!(out, "| {} | {} | {} | {} |", m.role, m.name, m.skill, cap);
        }
        let avg = average_skill(team.members.iter()).unwrap_or(0.0);
        let _ = write!(out, "\n**Average skill**: {avg:.1}");
        for (label, lo, hi) in ROLE_GROUPS {
            let group = team.members.iter().filter(|m| (lo..=hi).contains(&m.role));
            if let Some(g) = average_skill(group) {
                let _ = write!(out, " | {label} ({lo}-{hi}): {g:.1}");
            }
        }
        let _ = writeln!(
            out,
            " | **Weighted score**: {:.1} (deviation {:.1}) | **Captains**: {}\n",
            team.score, team.deviation, team.captains
        );
    }
    if !solution.conflicts.is_empty() {
        out.push_str("## Unresolved avoid pairs\n\n");
        for c in &solution.conflicts {
            let mark = if c.mutual { " (mutual)" } else { "" };
            let _ = writeln!(out, "- Team {}: {} avoids {}{mark}", c.team, c.player, c.avoids);
        }
        out.push('\n');
    }
    out
}

pub fn write_assignments_csv(
    path: impl AsRef<Path>,
    players: &[Player],
    solution: &Solution,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for p in players {
        let team = solution.team_of(&p.name).unwrap_or_default();
        wtr.serialize(AssignmentRecord {
            name: &p.name,
            skill: p.skill,
            position: p.role,
            captain: u8::from(p.captain),
            avoid: p.avoid.as_deref().unwrap_or(""),
            team,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Console summary printed after a CLI run. Warnings were already logged by
/// the stage that raised them, so they only go to `out` here.
pub fn write_console_summary(
    out: &mut dyn io::Write,
    solution: &Solution,
    run_dir: &Path,
) -> Result<()> {
    writeln!(out, "Solver status: {:?}", solution.status)?;
    for w in &solution.warnings {
        writeln!(out, "Warning: {w}")?;
    }
    writeln!(out, "Target weighted score: {:.2}", solution.target_score)?;
    for team in &solution.teams {
        writeln!(
            out,
            "  Team {}: score={:.2} (dev={:.2}), captains={}",
            team.team, team.score, team.deviation, team.captains
        )?;
    }
    if !solution.conflicts.is_empty() {
        writeln!(out, "Unresolved avoid pairs: {}", solution.conflicts.len())?;
    }
    writeln!(out, "All outputs saved in: {}", run_dir.display())?;
    Ok(())
}

#[derive(Serialize)]
struct EffectiveConfig<'a> {
    #[serde(flatten)]
    config: &'a RunConfig,
    signups_csv: String,
}

/// Writes teams.md, assignments.csv, used_config.yaml and summary.json.
pub fn write_run_outputs(
    config: &RunConfig,
    signups_path: &Path,
    players: &[Player],
    solution: &Solution,
) -> Result<PathBuf> {
    let run_dir = config.run_dir();
    fs::create_dir_all(&run_dir)?;

    let used = EffectiveConfig {
        config,
        signups_csv: fs::canonicalize(signups_path)
            .unwrap_or_else(|_| signups_path.to_path_buf())
            .display()
            .to_string(),
    };
    fs::write(run_dir.join("used_config.yaml"), serde_yaml::to_string(&used)?)?;
    fs::write(run_dir.join("teams.md"), render_markdown(solution))?;
    write_assignments_csv(run_dir.join("assignments.csv"), players, solution)?;
    fs::write(
        run_dir.join("summary.json"),
        serde_json::to_string_pretty(solution)?,
    )?;
    info!("Outputs written to {}", run_dir.display());
    Ok(run_dir)
}
