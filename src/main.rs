use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use rusty_gpr::config::load_config;
use rusty_gpr::data::loader::{load_file, LoadedProfile};
use rusty_gpr::export::{save_detections, save_profile, save_summary, write_detections, RunSummary};
use rusty_gpr::processing::{trace_mean_amplitudes, ProcessingStep, Survey};

#[derive(Parser)]
#[command(name = "rusty-gpr", version, about = "GPR profile filtering and utility location")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the header and shape of a profile.
    Info {
        input: PathBuf,
        /// Also print the mean amplitude of every n-th trace.
        #[arg(long)]
        trace_stride: Option<usize>,
    },
    /// Apply filter steps and write the result as a CSV grid.
    Process {
        input: PathBuf,
        /// Steps such as `dewow(10)`, `smooth(3,2)`, `zero_time(2.5)`.
        #[arg(long = "step")]
        steps: Vec<String>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Filter per the config file, then locate reflectors.
    Locate {
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        /// Detections CSV; printed to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON summary of the run.
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { input, trace_stride } => info_cmd(&input, trace_stride),
        Command::Process {
            input,
            steps,
            output,
        } => {
            let steps = steps
                .iter()
                .map(|s| s.parse::<ProcessingStep>())
                .collect::<Result<Vec<_>, _>>()?;
            let survey = run_steps(&input, &steps)?;
            save_profile(&output, &survey.profile)?;
            info!("wrote {}", output.display());
            Ok(())
        }
        Command::Locate {
            input,
            config,
            output,
            summary,
        } => locate_cmd(&input, &config, output, summary),
    }
}

fn info_cmd(input: &Path, trace_stride: Option<usize>) -> Result<()> {
    let LoadedProfile {
        profile,
        metadata,
        header,
    } = load_file(input)?;
    for (key, value) in &header {
        println!("{key}: {value}");
    }
    println!(
        "shape: {} samples x {} traces, {:.2} ns, {:.3} m spacing",
        profile.sample_count(),
        profile.trace_count(),
        metadata.time_window_ns,
        metadata.distance_interval_m
    );
    if let Some(stride) = trace_stride {
        for (trace, amp) in trace_mean_amplitudes(&profile, stride)? {
            println!("trace {trace}: mean amplitude {amp:.2}");
        }
    }
    Ok(())
}

fn run_steps(input: &Path, steps: &[ProcessingStep]) -> Result<Survey> {
    let loaded = load_file(input)?;
    let mut survey = Survey::new(loaded.profile, loaded.metadata)?;
    survey.apply_all(steps)?;
    Ok(survey)
}

fn locate_cmd(
    input: &Path,
    config_path: &Path,
    output: Option<PathBuf>,
    summary: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let locator = config
        .locator
        .as_ref()
        .with_context(|| format!("{} has no 'locator' section", config_path.display()))?;

    let survey = run_steps(input, &config.steps)?;
    let detections = survey.locate(locator)?;

    match &output {
        Some(path) => save_detections(path, &detections)?,
        None => write_detections(std::io::stdout().lock(), &detections)?,
    }
    if let Some(path) = summary {
        let run = RunSummary {
            input: input.display().to_string(),
            metadata: &survey.metadata,
            steps: &survey.log,
            detections: &detections,
        };
        save_summary(&path, &run)?;
    }
    Ok(())
}
