//! codescout - LLM-driven codebase exploration
//!
//! CLI entry point: fingerprint a repository, plan an exploration, run
//! the exploration loop, and print the synthesized answer.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use codescout::cache::FileCache;
use codescout::cli::{Cli, Command, OutputFormat};
use codescout::compress::{ContextCompressor, LlmCompressor};
use codescout::config::Config;
use codescout::explore::{ExplorationOrchestrator, OrchestratorConfig, PhaseRecord};
use codescout::llm::{StreamChunk, create_client};
use codescout::planner::Planner;
use codescout::prompts::PromptLoader;
use codescout::scan;
use codescout::tools::{ToolContext, ToolDispatcher};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codescout")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("codescout.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "codescout loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Some(Command::Explore {
            query,
            path,
            max_iterations,
            format,
        }) => cmd_explore(&config, &query, &path, max_iterations, format).await,
        Some(Command::Plan { query, path }) => cmd_plan(&config, &query, &path).await,
        Some(Command::Scan { path, format }) => cmd_scan(&path, format).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Run a full exploration: fingerprint, plan, explore, synthesize
async fn cmd_explore(
    config: &Config,
    query: &str,
    path: &Path,
    max_iterations: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    config.validate()?;

    let root = path
        .canonicalize()
        .context(format!("Failed to resolve path: {}", path.display()))?;

    let text_mode = matches!(format, OutputFormat::Text);
    if text_mode {
        println!("{}", "Codebase Exploration".bold());
        println!("Query: {}", query.cyan());
        println!("Root: {}", root.display());
        println!();
    }

    // Fingerprint phase
    let cache = Arc::new(FileCache::new(root.clone()));
    let fingerprint_start = Instant::now();
    let fingerprint = scan::scan(&cache).await.context("Failed to fingerprint codebase")?;
    let mut phases = vec![PhaseRecord::new("fingerprint", fingerprint_start.elapsed())];
    let fingerprint_json = serde_json::to_string_pretty(&fingerprint)?;

    if text_mode {
        println!(
            "Fingerprinted {} files in {:.2}s",
            fingerprint.total_files, fingerprint.scan_time
        );
    }

    let client = create_client(&config.llm).context("Failed to create LLM client")?;

    // Planning phase
    let planner = Planner::new(client.clone(), PromptLoader::new(&root), config.llm.max_tokens);
    let planning_start = Instant::now();
    let plan = planner.plan(query, &fingerprint_json).await?;
    phases.push(PhaseRecord::new("planning", planning_start.elapsed()));

    if text_mode {
        println!();
        println!("{}", "Exploration Plan".bold());
        for (i, step) in plan.steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        println!();
    }

    // Exploration and synthesis
    let compressor: Arc<dyn ContextCompressor> = Arc::new(LlmCompressor::new(
        client.clone(),
        PromptLoader::new(&root),
        config.llm.max_tokens,
    ));
    let dispatcher = Arc::new(ToolDispatcher::standard(compressor.clone()));

    let run_id = Uuid::now_v7().to_string();
    let ctx = ToolContext::new(root.clone(), run_id, cache);

    let orchestrator_config = OrchestratorConfig {
        model: config.llm.model.clone(),
        max_tokens: config.llm.max_tokens,
        max_iterations: max_iterations.unwrap_or(config.explore.max_iterations),
        step_max_iterations: config.explore.step_max_iterations,
    };
    let mut orchestrator = ExplorationOrchestrator::new(
        client,
        dispatcher,
        compressor,
        PromptLoader::new(&root),
        orchestrator_config,
    );

    // Text mode streams the answer as it generates
    let printer = if text_mode {
        let (chunk_tx, mut chunk_rx) = mpsc::channel::<StreamChunk>(64);
        orchestrator = orchestrator.with_live_output(chunk_tx);
        println!("{}", "Answer".bold());
        Some(tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                if let StreamChunk::TextDelta(text) = chunk {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
            }
        }))
    } else {
        None
    };

    let result = orchestrator.run(query, &plan, &fingerprint, &ctx, phases).await?;

    // Closing the orchestrator's channel ends the printer task
    drop(orchestrator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            println!();
            println!();
            println!("{}", "Execution Summary".bold());
            println!("-----------------");
            println!("Termination: {}", result.termination_reason.as_str());
            println!("Time: {:.1}s", result.execution_time);
            for phase in &result.phases_executed {
                println!("  {}: {:.1}s", phase.name, phase.duration);
            }
            if let Some(error) = &result.error {
                println!("{} {}", "✗".red(), error);
            }
            if !result.tool_errors.is_empty() {
                println!("{} {} tool call(s) failed", "⚠".yellow(), result.tool_errors.len());
            }
        }
    }

    Ok(())
}

/// Generate and print an exploration plan without running it
async fn cmd_plan(config: &Config, query: &str, path: &Path) -> Result<()> {
    config.validate()?;

    let root = path
        .canonicalize()
        .context(format!("Failed to resolve path: {}", path.display()))?;

    let cache = Arc::new(FileCache::new(root.clone()));
    let fingerprint = scan::scan(&cache).await.context("Failed to fingerprint codebase")?;
    let fingerprint_json = serde_json::to_string_pretty(&fingerprint)?;

    let client = create_client(&config.llm).context("Failed to create LLM client")?;
    let planner = Planner::new(client, PromptLoader::new(&root), config.llm.max_tokens);
    let plan = planner.plan(query, &fingerprint_json).await?;

    if plan.steps.is_empty() {
        println!("No exploration plan could be generated.");
        return Ok(());
    }

    println!("{}", "Exploration Plan".bold());
    println!("Query: {}", query.cyan());
    println!();
    for (i, step) in plan.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    Ok(())
}

/// Fingerprint a codebase and print the result
async fn cmd_scan(path: &Path, format: OutputFormat) -> Result<()> {
    let root = path
        .canonicalize()
        .context(format!("Failed to resolve path: {}", path.display()))?;

    let cache = Arc::new(FileCache::new(root));
    let fingerprint = scan::scan(&cache).await.context("Failed to fingerprint codebase")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&fingerprint)?);
        }
        OutputFormat::Text => {
            println!("{}", fingerprint.name.bold());
            println!("-----------------");
            println!("Path: {}", fingerprint.path);
            println!("Files: {}", fingerprint.total_files);
            if !fingerprint.languages.is_empty() {
                println!("Languages:");
                for (language, count) in &fingerprint.languages {
                    println!("  {}: {}", language, count);
                }
            }
            if !fingerprint.build_tools.is_empty() {
                println!("Build tools: {}", fingerprint.build_tools.join(", "));
            }
            println!("Scan time: {:.2}s", fingerprint.scan_time);
        }
    }

    Ok(())
}
