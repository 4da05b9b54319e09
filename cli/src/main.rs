//! llms.txt generator CLI
//!
//! Submits a website to the generation service, streams progress to stderr
//! and writes the finished artifacts to disk.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use llmstxt::{
    export_artifact, init_logging, load_config, Artifact, ClientConfig, FileSink, JobController,
    JobSnapshot, JobState, LogFormat,
};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "llmstxt")]
#[command(about = "Generate llms.txt files for a website", version)]
struct Cli {
    /// Website to generate llms.txt for
    url: String,

    /// Path to a JSON client config (defaults plus environment otherwise)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory the artifacts are written to
    #[arg(long, short = 'o', default_value = ".")]
    out: PathBuf,

    /// Which artifacts to write
    #[arg(long, value_enum, default_value_t = ArtifactChoice::Both)]
    artifact: ArtifactChoice,

    /// Print the final job snapshot as JSON on stdout and log in JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArtifactChoice {
    Summary,
    Full,
    Both,
}

impl ArtifactChoice {
    fn artifacts(self) -> &'static [Artifact] {
        match self {
            ArtifactChoice::Summary => &[Artifact::Summary],
            ArtifactChoice::Full => &[Artifact::Full],
            ArtifactChoice::Both => &Artifact::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Human
    });

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs one generation job. `Ok(false)` means the job itself failed.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_env_overrides()?,
        None => ClientConfig::from_env()?,
    };
    log::debug!("Using generation service at {}", config.api_base);

    let controller = JobController::from_config(&config)?;
    let mut events = controller.subscribe();
    controller.submit(&cli.url)?;

    let mut progress = Progress::default();
    let snapshot = loop {
        let snapshot = match events.recv().await {
            Ok(event) => event.snapshot,
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Skipped {} progress updates", skipped);
                controller.snapshot()
            }
            Err(RecvError::Closed) => bail!("Job event channel closed"),
        };

        for line in progress.render(&snapshot) {
            eprintln!("{}", line);
        }
        if snapshot.is_terminal() {
            break snapshot;
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    match snapshot.state {
        JobState::Completed => {
            let sink = FileSink::new(&cli.out);
            for &artifact in cli.artifact.artifacts() {
                let path = export_artifact(&snapshot, artifact, &sink)?;
                let chars = snapshot
                    .result
                    .as_ref()
                    .map(|r| r.char_count(artifact))
                    .unwrap_or(0);
                eprintln!("Wrote {} ({} chars)", path.display(), chars);
            }
            Ok(true)
        }
        _ => {
            let message = snapshot
                .error_message
                .as_deref()
                .unwrap_or("Generation failed");
            eprintln!("Generation failed: {}", message);
            Ok(false)
        }
    }
}

/// Turns successive snapshots into the lines not yet shown.
#[derive(Default)]
struct Progress {
    step: Option<String>,
    logs: Vec<String>,
}

impl Progress {
    fn render(&mut self, snapshot: &JobSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if snapshot.state == JobState::Submitting {
            if let Some(target) = &snapshot.target {
                lines.push(format!("Submitting {}", target));
            }
        }

        if snapshot.state == JobState::InProgress {
            let step = snapshot.step_label();
            if self.step.as_deref() != Some(step) {
                lines.push(format!("==> {}", step));
                self.step = Some(step.to_string());
            }
        }

        // Logs are full snapshots; print only what extends the previous one.
        let new_logs = if snapshot.logs.starts_with(&self.logs) {
            &snapshot.logs[self.logs.len()..]
        } else {
            &snapshot.logs[..]
        };
        lines.extend(new_logs.iter().map(|l| format!("    {}", l)));
        self.logs = snapshot.logs.clone();

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: JobState, step: Option<&str>, logs: &[&str]) -> JobSnapshot {
        JobSnapshot {
            state,
            target: Some("https://docs.example.com".to_string()),
            logs: logs.iter().map(|l| l.to_string()).collect(),
            current_step: step.map(String::from),
            result: None,
            error_message: None,
        }
    }

    #[test]
    fn test_progress_prints_only_new_lines() {
        let mut progress = Progress::default();

        assert_eq!(
            progress.render(&snapshot(JobState::Submitting, None, &[])),
            ["Submitting https://docs.example.com"]
        );
        assert_eq!(
            progress.render(&snapshot(JobState::InProgress, Some("Crawling"), &["a"])),
            ["==> Crawling", "    a"]
        );
        assert_eq!(
            progress.render(&snapshot(JobState::InProgress, Some("Crawling"), &["a", "b"])),
            ["    b"]
        );
    }

    #[test]
    fn test_progress_reprints_rewritten_logs() {
        let mut progress = Progress::default();
        progress.render(&snapshot(JobState::InProgress, Some("Crawling"), &["a", "b"]));

        assert_eq!(
            progress.render(&snapshot(JobState::InProgress, Some("Crawling"), &["c"])),
            ["    c"]
        );
    }

    #[test]
    fn test_artifact_choice() {
        assert_eq!(ArtifactChoice::Full.artifacts(), [Artifact::Full]);
        assert_eq!(ArtifactChoice::Both.artifacts().len(), 2);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "llmstxt",
            "https://docs.example.com",
            "--artifact",
            "summary",
            "--out",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(cli.url, "https://docs.example.com");
        assert_eq!(cli.artifact, ArtifactChoice::Summary);
        assert_eq!(cli.out, PathBuf::from("/tmp/out"));
        assert!(!cli.json);
    }
}
