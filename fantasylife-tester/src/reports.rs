use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use fantasylife_logic::Catalog;
use serde::Serialize;
use std::io::Write;

use crate::probe::ProbeResult;
use crate::sweep::SweepReport;

/// Everything one tester run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub seed: u64,
    pub scheme: String,
    pub dlc: bool,
    pub goal: String,
    pub starting_life: Option<String>,
    pub starting_items: Vec<String>,
    pub rule_count: usize,
    pub probes: Vec<ProbeResult>,
    pub sweep: Option<SweepReport>,
}

impl RunReport {
    pub fn new(
        catalog: &Catalog,
        seed: u64,
        probes: Vec<ProbeResult>,
        sweep: Option<SweepReport>,
    ) -> Self {
        let snapshot = catalog.snapshot();
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            seed,
            scheme: snapshot.scheme().to_string(),
            dlc: snapshot.dlc(),
            goal: snapshot.goal().to_string(),
            starting_life: snapshot.starting_life().map(|life| life.to_string()),
            starting_items: snapshot.starting_items(),
            rule_count: catalog.len(),
            probes,
            sweep,
        }
    }

    pub fn failed(&self) -> bool {
        self.probes.iter().any(ProbeResult::is_error)
            || self.sweep.as_ref().is_some_and(|sweep| !sweep.passed())
    }
}

fn verdict(passed: Option<bool>) -> &'static str {
    match passed {
        Some(true) => "reachable",
        Some(false) => "blocked",
        None => "unknown",
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &RunReport,
    verbose: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Rule Probe Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    writeln!(
        out,
        "Licenses: {}  DLC: {}  Goal: {}  Seed: {:#x}",
        report.scheme, report.dlc, report.goal, report.seed
    )?;
    if let Some(life) = &report.starting_life {
        writeln!(out, "Starting life: {life}")?;
    }
    if !report.starting_items.is_empty() {
        writeln!(out, "Precollected: {}", report.starting_items.join(", "))?;
    }
    writeln!(out, "Rules built: {}", report.rule_count)?;
    writeln!(out)?;

    for probe in &report.probes {
        let status = match probe.passed {
            Some(true) => "✅ REACHABLE".green(),
            Some(false) => "⛔ BLOCKED".yellow(),
            None => "❌ UNKNOWN".red(),
        };
        writeln!(out, "{status} {}", probe.key.bold())?;
        if let Some(rule) = &probe.rule {
            writeln!(out, "   Rule: {rule}")?;
        }
        if let Some(error) = &probe.error {
            writeln!(out, "   Error: {}", error.red())?;
        }
        if verbose {
            for entry in &probe.trace {
                let mark = if entry.passed { "✓" } else { "✗" };
                writeln!(
                    out,
                    "     {mark} {} {}/{}",
                    entry.item, entry.held, entry.required
                )?;
            }
        }
    }

    if let Some(sweep) = &report.sweep {
        writeln!(out)?;
        writeln!(out, "{}", "🔁 Property Sweep".bright_yellow().bold())?;
        writeln!(out, "{}", "=================".yellow())?;
        writeln!(
            out,
            "Iterations: {}  Rules: {}  Evaluations: {}  Time: {:?}",
            sweep.iterations, sweep.rules_checked, sweep.evaluations, sweep.duration
        )?;
        if sweep.passed() {
            writeln!(out, "{}", "No violations".green())?;
        } else {
            writeln!(out, "Violations: {}", sweep.violation_count.to_string().red())?;
            for violation in &sweep.violations {
                writeln!(out, "     • {}", violation.red())?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    writeln!(out, "# Fantasy Life Rule Probe\n")?;
    writeln!(out, "_Generated {}_\n", report.generated_at)?;
    writeln!(out, "## Configuration\n")?;
    writeln!(out, "- **Licenses**: {}", report.scheme)?;
    writeln!(out, "- **DLC**: {}", report.dlc)?;
    writeln!(out, "- **Goal**: {}", report.goal)?;
    writeln!(out, "- **Seed**: {}", report.seed)?;
    writeln!(out, "- **Rules built**: {}\n", report.rule_count)?;

    if !report.probes.is_empty() {
        writeln!(out, "## Probes\n")?;
        writeln!(out, "| Key | Result | Rule |")?;
        writeln!(out, "|---|---|---|")?;
        for probe in &report.probes {
            let detail = probe
                .rule
                .as_deref()
                .or(probe.error.as_deref())
                .unwrap_or_default()
                .replace('|', "\\|");
            writeln!(out, "| `{}` | {} | {detail} |", probe.key, verdict(probe.passed))?;
        }
        writeln!(out)?;
    }

    if let Some(sweep) = &report.sweep {
        let status = if sweep.passed() { "✅" } else { "❌" };
        writeln!(out, "## {status} Property Sweep\n")?;
        writeln!(out, "- **Iterations**: {}", sweep.iterations)?;
        writeln!(out, "- **Evaluations**: {}", sweep.evaluations)?;
        writeln!(out, "- **Violations**: {}", sweep.violation_count)?;
        for violation in &sweep.violations {
            writeln!(out, "  - {violation}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
