mod error;
mod scenario;
mod scripts;

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use fb_results::{ResultsCollector, RunManifest, RunOutcome, RunStore, compute_run_id};
use fb_sched::{ExecutionPlan, Progress, SchedulerContext, run};
use tracing::Level;

use crate::error::CliResult;
use crate::scenario::Scenario;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "fbflow")]
#[command(about = "fbflow - functional block diagram simulation runner", long_about = None)]
struct Cli {
    /// Log per-block scheduling decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a scenario file: syntax, links and script names
    Validate {
        /// Path to the scenario YAML file
        scenario: PathBuf,
    },
    /// Run a scenario
    Run {
        /// Path to the scenario YAML file
        scenario: PathBuf,
        /// Override the number of iterations
        #[arg(long)]
        iterations: Option<u32>,
        /// Directory to store results in
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// List stored runs
    Runs {
        /// Results directory
        store: PathBuf,
    },
    /// Show a stored run
    Show {
        /// Results directory
        store: PathBuf,
        /// Run ID to display
        run_id: String,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Validate { scenario } => cmd_validate(&scenario),
        Commands::Run {
            scenario,
            iterations,
            store,
        } => cmd_run(&scenario, iterations, store.as_deref()),
        Commands::Runs { store } => cmd_runs(&store),
        Commands::Show { store, run_id } => cmd_show(&store, &run_id),
    }
}

fn cmd_validate(path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", path.display());
    let scenario = Scenario::load(path)?;
    scenario.settings.validate()?;
    let built = scenario.build()?;
    let registry = scripts::builtin();
    ExecutionPlan::resolve(&built.graph, &registry)?;
    println!(
        "✓ Scenario is valid ({} blocks, {} links)",
        built.graph.len(),
        built.graph.links().count()
    );
    Ok(())
}

fn cmd_run(path: &Path, iterations: Option<u32>, store: Option<&Path>) -> CliResult<()> {
    let mut scenario = Scenario::load(path)?;
    if let Some(n) = iterations {
        scenario.settings.iterations = n;
    }
    let built = scenario.build()?;
    let registry = scripts::builtin();
    let plan = ExecutionPlan::resolve(&built.graph, &registry)?;

    let mut ctx = SchedulerContext::new(scenario.settings.clone())?;
    for (port, signal) in &built.seeds {
        ctx.seed_feedback(*port, signal.clone());
    }

    println!("Running scenario: {}", scenario.name);
    let started = Instant::now();
    let mut last_emit = Instant::now();
    let mut collector = ResultsCollector::new().with_progress(|p| {
        if last_emit.elapsed().as_millis() >= 100 || p.blocks_completed == p.blocks_total {
            render_progress(p);
            last_emit = Instant::now();
        }
    });
    let result = run(&mut ctx, &plan, &mut collector);
    clear_progress_line();

    let outcome = RunOutcome::from_result(&result);
    let summary = ctx.summary().clone();
    match &outcome {
        RunOutcome::Finished => println!("✓ Run finished in {:.3}s", started.elapsed().as_secs_f64()),
        RunOutcome::Stopped { iteration, segment } => {
            println!("Run stopped in iteration {iteration}, segment {segment}")
        }
        RunOutcome::Failed { message } => println!("✗ Run failed: {message}"),
    }
    println!("  Iterations: {}", summary.iterations);
    println!("  Passes:     {}", summary.passes);
    println!("  Invocations: {}", summary.invocations);
    println!("  Unable:     {}", summary.unable);
    for warning in collector.warnings() {
        println!("  warning: {warning}");
    }

    println!("\nFinal block states:");
    for (block, state) in built.graph.blocks().iter().zip(ctx.state().blocks()) {
        println!(
            "  {:<16} {:<9} retries={:<3} {}",
            block.name,
            format!("{:?}", state.status),
            state.retry_count,
            format_table(&state.results)
        );
    }

    if let Some(dir) = store {
        let store = RunStore::new(dir.to_path_buf())?;
        let run_id = compute_run_id(&built.graph, ctx.settings(), &built.seeds, ENGINE_VERSION);
        let manifest = RunManifest {
            run_id: run_id.clone(),
            scenario: scenario.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            outcome,
            settings: ctx.settings().clone(),
            summary,
            engine_version: ENGINE_VERSION.to_string(),
        };
        let (records, log) = collector.into_parts();
        if store.has_run(&run_id) {
            tracing::info!(%run_id, "replacing stored run");
        }
        store.save_run(&manifest, &records, &log)?;
        println!("\nSaved run {run_id}");
    }

    result.map(|_| ()).map_err(Into::into)
}

fn cmd_runs(store: &Path) -> CliResult<()> {
    let store = RunStore::new(store.to_path_buf())?;
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No stored runs in {}", store.root().display());
        return Ok(());
    }
    println!("Stored runs:");
    for manifest in runs {
        println!(
            "  {} - {} ({}) {:?}",
            manifest.run_id, manifest.scenario, manifest.timestamp, manifest.outcome
        );
    }
    Ok(())
}

fn cmd_show(store: &Path, run_id: &str) -> CliResult<()> {
    let store = RunStore::new(store.to_path_buf())?;
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_records(run_id)?;

    println!("Run: {}", manifest.run_id);
    println!("  Scenario:  {}", manifest.scenario);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Outcome:   {:?}", manifest.outcome);
    println!("  Engine:    {}", manifest.engine_version);
    println!(
        "  Settings:  iterations={} feedback={} segments={} max_attempts={}",
        manifest.settings.iterations,
        manifest.settings.feedback_enabled,
        manifest.settings.segments_per_iteration(),
        manifest.settings.max_calculation_attempts
    );
    println!(
        "  Summary:   passes={} invocations={} unable={}",
        manifest.summary.passes, manifest.summary.invocations, manifest.summary.unable
    );

    println!("\nRecords:");
    for r in &records {
        println!(
            "  it={} seg={} {:<16} {:<9} retries={:<3} {}",
            r.iteration,
            r.segment,
            r.name,
            format!("{:?}", r.status),
            r.retry_count,
            format_table(&r.results)
        );
    }
    Ok(())
}

fn format_table(table: &fb_core::Table) -> String {
    table
        .iter()
        .map(|(k, v)| match v.as_real() {
            Some(x) => format!("{k}={x:.4}"),
            None => format!("{k}={v:?}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(p: &Progress) {
    let width = 28usize;
    let fraction = p.fraction();
    let filled = ((fraction * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] {:>6.2}%  iteration={}/{}  segment={}/{}  blocks={}/{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        fraction * 100.0,
        p.iteration,
        p.iterations_total,
        p.segment,
        p.segments_total,
        p.blocks_completed,
        p.blocks_total
    );
    let _ = io::stdout().flush();
}
