mod replay;
mod reports;
mod watch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use racetrail_core::AnalysisConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use replay::{ReplayReport, load_snapshot};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for the terminal
    Console,
    /// Full report as pretty-printed JSON
    Json,
    /// Markdown tables for sharing
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "racetrail", version)]
#[command(about = "Spectate racetrail races live or replay a saved race offline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow a race over its live channel until Ctrl-C
    Watch {
        /// Server base URL (http, https, ws or wss)
        #[arg(long)]
        server: String,

        /// Race to follow
        #[arg(long)]
        race: String,

        /// Spectator auth token sent after connecting
        #[arg(long)]
        token: Option<String>,

        /// Locale for zone names, e.g. fr or pt-BR
        #[arg(long)]
        locale: Option<String>,
    },
    /// Analyse a saved race_state payload
    Replay {
        /// JSON file holding a race_state frame or its payload
        #[arg(long)]
        input: PathBuf,

        /// Analysis config JSON (highlight thresholds, replay geometry)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of evenly spaced replay frames to sample
        #[arg(long, default_value_t = 5)]
        frames: usize,

        /// Output report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,

        /// Optional path to write the report output instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Watch {
            server,
            race,
            token,
            locale,
        } => watch::run(&server, &race, token, locale.as_deref()).await,
        Command::Replay {
            input,
            config,
            frames,
            report,
            output,
        } => run_replay(&input, config, frames, report, output),
    }
}

fn run_replay(
    input: &std::path::Path,
    config: Option<PathBuf>,
    frames: usize,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => AnalysisConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let snapshot = load_snapshot(input)?;
    let report = ReplayReport::build(&snapshot, config, frames)?;
    if matches!(format, ReportFormat::Console) && output.is_none() {
        println!("{}", "🎮 Racetrail Replay".bright_cyan().bold());
    }

    let mut output_target = OutputTarget::new(output)?;
    match format {
        ReportFormat::Console => reports::generate_console_report(&mut output_target, &report)?,
        ReportFormat::Json => reports::generate_json_report(&mut output_target, &report)?,
        ReportFormat::Markdown => reports::generate_markdown_report(&mut output_target, &report)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_arguments() {
        let args = Args::try_parse_from([
            "racetrail", "replay", "--input", "race.json", "--frames", "3", "--report", "json",
        ])
        .unwrap();
        let Command::Replay {
            input,
            frames,
            report,
            output,
            ..
        } = args.command
        else {
            panic!("expected replay");
        };
        assert_eq!(input, PathBuf::from("race.json"));
        assert_eq!(frames, 3);
        assert!(matches!(report, ReportFormat::Json));
        assert!(output.is_none());
    }

    #[test]
    fn watch_requires_server_and_race() {
        assert!(Args::try_parse_from(["racetrail", "watch", "--race", "r"]).is_err());
        let args =
            Args::try_parse_from(["racetrail", "watch", "--server", "http://h", "--race", "r"])
                .unwrap();
        assert!(matches!(args.command, Command::Watch { token: None, .. }));
    }

    #[test]
    fn output_target_writes_files() {
        let path = std::env::temp_dir().join(format!("racetrail-out-{}", std::process::id()));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(path);
    }
}
