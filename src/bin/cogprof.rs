#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use cognitive_profiler::{
    build_run_report, compare_profiles, generate_battery, load_config_from_path, read_json,
    read_jsonl, render_report_markdown, run_pipeline, write_json_pretty, write_jsonl,
    AnalysisRecord, BatteryOptions, JsonlRecordSink, MetricCalculator, ModelProfile,
    ProfilerConfig, Response, ResponseAnalyzer, RunReportOptions, Task, TaskCategory, TaskIndex,
};

#[derive(Parser)]
#[command(name = "cogprof", version, about = "Cognitive profiling of LLM responses")]
struct Cli {
    /// Debug-level logging (overridden by COGPROF_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or write the built-in configuration
    Config {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a seeded task battery as JSONL
    Tasks {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 6)]
        per_category: usize,
        #[arg(long, value_parser = parse_category)]
        category: Option<TaskCategory>,
        #[arg(long)]
        shuffle: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Analyze responses into JSONL analysis records
    Analyze {
        #[arg(long)]
        tasks: PathBuf,
        #[arg(long)]
        responses: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compute model profiles from analysis records
    Profile {
        #[arg(long)]
        records: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// One profile per task category for every model
        #[arg(long)]
        by_category: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank profiles (a JSON map of model name to profile)
    Compare {
        #[arg(long)]
        profiles: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Analyze, profile, compare and report in one pass
    Run {
        #[arg(long)]
        tasks: PathBuf,
        #[arg(long)]
        responses: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report skipped responses as counts only
        #[arg(long)]
        no_failures: bool,
    },
}

fn parse_category(raw: &str) -> Result<TaskCategory, String> {
    TaskCategory::parse(raw).ok_or_else(|| {
        let known = TaskCategory::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown category `{raw}` (expected one of: {known})")
    })
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("COGPROF_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| format!("failed to initialize tracing subscriber: {e}"))?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ProfilerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(load_config_from_path(path)?),
        None => Ok(ProfilerConfig::default()),
    }
}

fn emit_json<T: serde::Serialize>(
    value: &T,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match out {
        Some(path) => write_json_pretty(path, value)?,
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Config { out } => {
            emit_json(&ProfilerConfig::default(), out.as_deref())?;
        }
        Commands::Tasks {
            seed,
            per_category,
            category,
            shuffle,
            out,
        } => {
            let tasks = generate_battery(&BatteryOptions {
                seed,
                per_category,
                category,
                shuffle,
            });
            match out {
                Some(path) => {
                    write_jsonl(&path, &tasks)?;
                    info!(tasks = tasks.len(), path = %path.display(), "wrote task battery");
                }
                None => {
                    for task in &tasks {
                        println!("{}", serde_json::to_string(task)?);
                    }
                }
            }
        }
        Commands::Analyze {
            tasks,
            responses,
            out,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let analyzer = ResponseAnalyzer::new(&config.analyzer)?;
            let tasks: Vec<Task> = read_jsonl(&tasks)?;
            let responses: Vec<Response> = read_jsonl(&responses)?;
            let (sink, writer) = JsonlRecordSink::new(&out)?;
            let streamed = analyzer.analyze_into(&responses, &TaskIndex::new(tasks), &sink)?;
            drop(sink);
            let written = writer.join()?;
            info!(
                records = streamed.records,
                path = %out.display(),
                "wrote analysis records"
            );
            println!(
                "analyzed {} responses from {} models; skipped {}",
                written.lines,
                written.per_model.len(),
                streamed.failures.len()
            );
        }
        Commands::Profile {
            records,
            config,
            by_category,
            out,
        } => {
            let config = load_config(config.as_deref())?;
            let calculator = MetricCalculator::new(config.metrics)?;
            let records: Vec<AnalysisRecord> = read_jsonl(&records)?;
            if by_category {
                let mut by_model: BTreeMap<String, Vec<AnalysisRecord>> = BTreeMap::new();
                for record in records {
                    by_model
                        .entry(record.model_name.clone())
                        .or_default()
                        .push(record);
                }
                let profiles: BTreeMap<_, _> = by_model
                    .iter()
                    .map(|(model, group)| {
                        (model.clone(), calculator.compute_category_profiles(model, group))
                    })
                    .collect();
                emit_json(&profiles, out.as_deref())?;
            } else {
                emit_json(&calculator.compute_profiles(&records), out.as_deref())?;
            }
        }
        Commands::Compare { profiles, out } => {
            let profiles: BTreeMap<String, ModelProfile> = read_json(&profiles)?;
            let report = compare_profiles(&profiles)?;
            emit_json(&report, out.as_deref())?;
        }
        Commands::Run {
            tasks,
            responses,
            out_dir,
            config,
            no_failures,
        } => {
            let config = load_config(config.as_deref())?;
            let analyzer = ResponseAnalyzer::new(&config.analyzer)?;
            let calculator = MetricCalculator::new(config.metrics)?;
            let tasks: Vec<Task> = read_jsonl(&tasks)?;
            let responses: Vec<Response> = read_jsonl(&responses)?;

            let output = run_pipeline(&analyzer, &calculator, &tasks, &responses)?;

            std::fs::create_dir_all(&out_dir)?;
            write_jsonl(out_dir.join("records.jsonl"), &output.records)?;
            let report = build_run_report(
                &output,
                &RunReportOptions {
                    include_failures: !no_failures,
                },
            )?;
            write_json_pretty(out_dir.join("report.json"), &report)?;
            std::fs::write(out_dir.join("report.md"), render_report_markdown(&report))?;
            println!(
                "profiled {} models from {} records ({} skipped); report in {}",
                output.profiles.len(),
                output.records.len(),
                output.failures.len(),
                out_dir.display()
            );
        }
    }

    Ok(())
}
