pub mod shell;

use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;

use crate::config::resolve::resolve_config;
use crate::config::RagConfig;
use crate::core::edge::Edge;
use crate::core::node::NodeId;
use crate::core::scenario::{load_scenario, Scenario, ScenarioRun};
use crate::core::simulator::Simulator;
use crate::error::{RagError, Result};
use crate::graph::detect::CycleStep;
use crate::graph::store::NodeView;
use crate::graph::viz;
use crate::util::{output, parallel, template};

#[derive(Parser, Debug)]
#[command(name = "ragsim")]
#[command(about = "Resource allocation graph deadlock simulator", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Connect policy for new sessions (storytelling or manual).
    #[arg(long, global = true)]
    pub policy: Option<String>,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a process, a resource and a second process, then check for deadlock.
    Demo(DemoArgs),
    /// Execute a scenario file.
    Run(RunArgs),
    /// Execute many scenario files in parallel and check their expectations.
    Batch(BatchArgs),
    /// Drive a session interactively from stdin.
    Shell(ShellArgs),
    /// Print shell completions.
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    #[arg(short = 'f', long)]
    pub format: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    pub scenario: PathBuf,
    #[arg(short = 'f', long)]
    pub format: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[arg(required = true)]
    pub patterns: Vec<String>,
    #[arg(long)]
    pub parallel: Option<usize>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Skip the confirmation prompt on reset.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    pub shell: clap_complete::Shell,
}

pub fn run() {
    let cli = Cli::parse();
    output::configure(cli.verbose, cli.quiet, cli.no_color);
    if let Err(err) = dispatch(cli) {
        output::error(&err.to_string());
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    if let Commands::Completions(args) = &cli.command {
        clap_complete::generate(args.shell, &mut Cli::command(), "ragsim", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config, cli.policy.as_deref())?;
    match cli.command {
        Commands::Demo(args) => handle_demo(args, &config),
        Commands::Run(args) => handle_run(args, &config),
        Commands::Batch(args) => handle_batch(args, &config),
        Commands::Shell(args) => handle_shell(args, &config),
        Commands::Completions(_) => Ok(()),
    }
}

fn load_config(config_path: Option<PathBuf>, policy: Option<&str>) -> Result<RagConfig> {
    let cwd = env::current_dir()?;
    let resolved = resolve_config(cwd, config_path)?;
    match &resolved.path {
        Some(path) => output::debug(&format!("using config {}", path.display())),
        None => output::debug("no ragsim.toml found, using defaults"),
    }
    let mut config = resolved.config;
    if let Some(policy) = policy {
        config.simulator.policy = policy.parse()?;
    }
    output::debug(&format!("connect policy: {}", config.simulator.policy));
    Ok(config)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Dot,
    Report,
}

fn parse_output_format(input: &str) -> Result<OutputFormat> {
    match input.to_ascii_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "dot" => Ok(OutputFormat::Dot),
        "report" => Ok(OutputFormat::Report),
        _ => Err(RagError::Other(anyhow::anyhow!(format!(
            "unknown output format '{}'",
            input
        )))),
    }
}

fn handle_demo(args: DemoArgs, config: &RagConfig) -> Result<()> {
    let run = Scenario::demo().run(config.simulator.policy)?;
    print_run(&run, args.format.as_deref(), config)
}

fn handle_run(args: RunArgs, config: &RagConfig) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    output::debug(&format!(
        "loaded {} steps from {}",
        scenario.steps.len(),
        args.scenario.display()
    ));
    let run = scenario.run(config.simulator.policy)?;
    print_run(&run, args.format.as_deref(), config)
}

fn print_run(run: &ScenarioRun, format: Option<&str>, config: &RagConfig) -> Result<()> {
    let format = parse_output_format(format.unwrap_or(config.output.format.as_str()))?;
    match format {
        OutputFormat::Text => {
            for message in &run.messages {
                println!("{}", message);
            }
            print!("{}", viz::render_text(&run.snapshot, &run.detection));
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&RunJson::from(run))
                    .map_err(|err| RagError::Other(anyhow::Error::new(err)))?
            );
        }
        OutputFormat::Dot => print!("{}", viz::render_dot(&run.snapshot, &run.detection)),
        OutputFormat::Report => {
            let report = template::render_report(run, config.output.template.as_deref())?;
            print!("{}", report);
        }
    }
    Ok(())
}

fn handle_batch(args: BatchArgs, config: &RagConfig) -> Result<()> {
    let paths = expand_patterns(&args.patterns)?;
    if paths.is_empty() {
        return Err(RagError::Other(anyhow::anyhow!(
            "no scenario files matched the given patterns"
        )));
    }
    let jobs = args.parallel.or(config.batch.jobs);
    output::debug(&format!(
        "running {} scenarios with {} jobs",
        paths.len(),
        jobs.unwrap_or(1)
    ));

    let policy = config.simulator.policy;
    let hidden = args.json || output::is_quiet() || !io::stderr().is_terminal();
    let results = parallel::run_with_progress(paths, jobs, hidden, |path| {
        let outcome = load_scenario(&path).and_then(|scenario| scenario.run(policy));
        (path, outcome)
    });

    let entries: Vec<BatchEntryJson> = results
        .iter()
        .map(|(path, outcome)| BatchEntryJson::new(path, outcome))
        .collect();
    let failed = entries.iter().filter(|entry| !entry.passed).count();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries)
                .map_err(|err| RagError::Other(anyhow::Error::new(err)))?
        );
    } else {
        print_batch_table(&entries);
    }

    if failed > 0 {
        return Err(RagError::Other(anyhow::anyhow!(format!(
            "{} of {} scenarios failed",
            failed,
            entries.len()
        ))));
    }
    output::info(&format!("{} scenarios passed", entries.len()));
    Ok(())
}

fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matches = glob::glob(pattern).map_err(|err| {
            RagError::Other(anyhow::anyhow!(format!(
                "invalid pattern '{}': {}",
                pattern, err
            )))
        })?;
        let mut found = false;
        for entry in matches {
            let path = entry.map_err(|err| RagError::Other(anyhow::Error::new(err)))?;
            if path.is_file() {
                paths.push(path);
                found = true;
            }
        }
        if !found {
            output::warn(&format!("pattern '{}' matched no files", pattern));
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn print_batch_table(entries: &[BatchEntryJson]) {
    println!("{:<6} {:<24} {}", "Result", "Scenario", "Outcome");
    println!("----------------------------------------------");
    for entry in entries {
        let result = if entry.passed { "PASS" } else { "FAIL" };
        let outcome = match (&entry.error, &entry.cycle) {
            (Some(error), _) => format!("error: {}", error),
            (None, Some(cycle)) => format!("deadlock {}", cycle),
            (None, None) => "deadlock-free".to_string(),
        };
        println!("{:<6} {:<24} {}", result, entry.name, outcome);
    }
}

fn handle_shell(args: ShellArgs, config: &RagConfig) -> Result<()> {
    let mut sim = Simulator::with_policy(config.simulator.policy);
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        output::info("Resource Allocation Graph Simulator. Type 'help' for commands.");
    }
    let assume_yes = args.yes || !interactive;
    let mut stdout = io::stdout();
    shell::run_shell(
        &mut sim,
        stdin.lock(),
        &mut stdout,
        interactive,
        |prompt| {
            output::confirm(prompt, assume_yes)
                .map_err(|err| RagError::Other(anyhow::Error::new(err)))
        },
    )
}

#[derive(Serialize)]
struct RunJson<'a> {
    name: &'a str,
    policy: &'a str,
    messages: &'a [String],
    nodes: &'a [NodeView],
    edges: &'a [Edge],
    allocations: Vec<[String; 2]>,
    requests: Vec<[String; 2]>,
    deadlock: bool,
    cycle: Vec<CycleStep>,
    cycle_path: Option<String>,
}

impl<'a> From<&'a ScenarioRun> for RunJson<'a> {
    fn from(run: &'a ScenarioRun) -> Self {
        let pairs = |pairs: &[(NodeId, NodeId)]| -> Vec<[String; 2]> {
            pairs
                .iter()
                .map(|(from, to)| [from.to_string(), to.to_string()])
                .collect()
        };
        Self {
            name: &run.name,
            policy: run.policy,
            messages: &run.messages,
            nodes: &run.snapshot.nodes,
            edges: &run.snapshot.edges,
            allocations: pairs(&run.snapshot.allocations),
            requests: pairs(&run.snapshot.requests),
            deadlock: run.detection.is_deadlocked(),
            cycle: run
                .detection
                .cycle()
                .map(|cycle| cycle.steps().to_vec())
                .unwrap_or_default(),
            cycle_path: run.detection.cycle().map(|cycle| cycle.path()),
        }
    }
}

#[derive(Serialize)]
struct BatchEntryJson {
    path: String,
    name: String,
    deadlock: Option<bool>,
    expected: Option<bool>,
    cycle: Option<String>,
    passed: bool,
    error: Option<String>,
}

impl BatchEntryJson {
    fn new(path: &Path, outcome: &Result<ScenarioRun>) -> Self {
        let fallback = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("scenario")
            .to_string();
        match outcome {
            Ok(run) => Self {
                path: path.display().to_string(),
                name: run.name.clone(),
                deadlock: Some(run.detection.is_deadlocked()),
                expected: run.expected,
                cycle: run.detection.cycle().map(|cycle| cycle.path()),
                passed: run.meets_expectation().unwrap_or(true),
                error: None,
            },
            Err(err) => Self {
                path: path.display().to_string(),
                name: fallback,
                deadlock: None,
                expected: None,
                cycle: None,
                passed: false,
                error: Some(err.to_string()),
            },
        }
    }
}
