use anyhow::Result;
use colored::Colorize;
use racetrail_core::format_duration;
use std::io::Write;

use crate::replay::{FrameSummary, ReplayReport, RunnerSummary};

fn runner_outcome(runner: &RunnerSummary) -> &'static str {
    if runner.finished {
        "finished"
    } else if runner.abandoned {
        "abandoned"
    } else {
        "racing"
    }
}

fn frame_line(frame: &FrameSummary) -> String {
    let leader = frame.leader.as_deref().unwrap_or("-");
    format!("{} igt, leader {leader}", format_duration(frame.igt_ms))
}

pub fn generate_console_report(out: &mut impl Write, report: &ReplayReport) -> Result<()> {
    writeln!(out)?;
    let heading = format!("🏁 {} ({})", report.race_id, report.status);
    writeln!(out, "{}", heading.bright_cyan().bold())?;
    writeln!(out, "{}", "=".repeat(30).cyan())?;
    if !report.race_name.is_empty() {
        writeln!(out, "Race: {}", report.race_name)?;
    }
    writeln!(out, "Runners: {}", report.runners.len())?;
    writeln!(out, "Longest run: {}", format_duration(report.max_igt_ms))?;
    writeln!(out)?;

    for runner in &report.runners {
        let outcome = if runner.finished {
            "✅ finished".green()
        } else if runner.abandoned {
            "❌ abandoned".red()
        } else {
            "🏃 racing".yellow()
        };
        writeln!(out, "{} {}", outcome, runner.name.bold())?;
        writeln!(
            out,
            "   IGT: {}, zones: {}, deaths: {}",
            format_duration(runner.total_igt_ms),
            runner.zones,
            runner.deaths
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "⚡ Highlights".bright_yellow().bold())?;
    writeln!(out, "{}", "=".repeat(12).yellow())?;
    if report.highlights.is_empty() {
        writeln!(out, "No highlights.")?;
    }
    for highlight in &report.highlights {
        writeln!(
            out,
            "[{}] {}: {}",
            format_duration(highlight.igt_ms),
            highlight.title.bold(),
            highlight.text
        )?;
    }

    if !report.frames.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🎬 Replay".bright_blue().bold())?;
        writeln!(out, "{}", "=".repeat(9).blue())?;
        for frame in &report.frames {
            writeln!(out, "{}", frame_line(frame))?;
            for position in &frame.positions {
                let marker = if position.frozen {
                    " (frozen)"
                } else if position.in_transit {
                    " (moving)"
                } else {
                    ""
                };
                writeln!(out, "     • {} @ {}{marker}", position.name, position.zone)?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut impl Write, report: &ReplayReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut impl Write, report: &ReplayReport) -> Result<()> {
    writeln!(out, "# Race {}\n", report.race_id)?;
    if !report.race_name.is_empty() {
        writeln!(out, "_{}_\n", report.race_name)?;
    }

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Status**: {}", report.status)?;
    writeln!(out, "- **Runners**: {}", report.runners.len())?;
    writeln!(out, "- **Longest run**: {}\n", format_duration(report.max_igt_ms))?;

    writeln!(out, "## Runners\n")?;
    writeln!(out, "| Runner | Outcome | IGT | Zones | Deaths |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for runner in &report.runners {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            runner.name,
            runner_outcome(runner),
            format_duration(runner.total_igt_ms),
            runner.zones,
            runner.deaths
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Highlights\n")?;
    if report.highlights.is_empty() {
        writeln!(out, "_No highlights._")?;
    }
    for highlight in &report.highlights {
        writeln!(
            out,
            "- **{}** ({}): {}",
            highlight.title,
            format_duration(highlight.igt_ms),
            highlight.text
        )?;
    }

    if !report.frames.is_empty() {
        writeln!(out, "\n## Replay\n")?;
        for frame in &report.frames {
            writeln!(out, "- {}", frame_line(frame))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::HighlightSummary;
    use racetrail_core::{HighlightCategory, HighlightKind, RaceStatus};

    fn report() -> ReplayReport {
        ReplayReport {
            race_id: "r-9".into(),
            race_name: "Sunday Seeds".into(),
            status: RaceStatus::Finished,
            max_igt_ms: 65_000,
            runners: vec![RunnerSummary {
                id: "a".into(),
                name: "Ana".into(),
                color: "#ff0000".into(),
                total_igt_ms: 65_000,
                deaths: 2,
                zones: 4,
                finished: true,
                abandoned: false,
            }],
            highlights: vec![HighlightSummary {
                kind: HighlightKind::SpeedDemon,
                category: HighlightCategory::Speed,
                title: "Speed Demon".into(),
                text: "Ana cleared Keep in 0:20".into(),
                igt_ms: 30_000,
                replay_ms: 27_000.0,
            }],
            frames: vec![FrameSummary {
                replay_ms: 60_000.0,
                igt_ms: 65_000,
                leader: Some("Ana".into()),
                positions: Vec::new(),
            }],
        }
    }

    #[test]
    fn markdown_lists_runners_and_highlights() {
        let mut out = Vec::new();
        generate_markdown_report(&mut out, &report()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# Race r-9"));
        assert!(text.contains("| Ana | finished | 1:05 | 4 | 2 |"));
        assert!(text.contains("- **Speed Demon** (0:30): Ana cleared Keep in 0:20"));
        assert!(text.contains("- 1:05 igt, leader Ana"));
    }

    #[test]
    fn json_report_is_machine_readable() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "finished");
        assert_eq!(value["highlights"][0]["kind"], "speed_demon");
        assert_eq!(value["frames"][0]["leader"], "Ana");
    }

    #[test]
    fn console_report_handles_an_empty_field() {
        let mut empty = report();
        empty.runners.clear();
        empty.highlights.clear();
        empty.frames.clear();
        let mut out = Vec::new();
        generate_console_report(&mut out, &empty).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Runners: 0"));
        assert!(text.contains("No highlights."));
    }
}
