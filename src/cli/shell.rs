use std::io::{BufRead, Write};

use crate::core::node::NodeId;
use crate::core::scenario::Step;
use crate::core::simulator::Simulator;
use crate::error::{RagError, Result};
use crate::graph::viz;

const HELP: &str = "commands:
  process | p                 add a process, then auto-connect
  resource | r                add a resource, then auto-connect
  alloc <R> <P>               allocate resource R to process P
  request <P> <R>             process P requests resource R
  detect | d                  check for a deadlock cycle
  show [text|dot|json]        print the current graph
  reset                       discard the graph and start over
  help | ?                    show this help
  quit | q                    leave the shell
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Empty,
    Apply(Step),
    Show(String),
    Reset,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::Empty);
    };
    let args: Vec<&str> = words.collect();
    let command = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("process" | "p", []) => Command::Apply(Step::AddProcess),
        ("resource" | "r", []) => Command::Apply(Step::AddResource),
        ("alloc" | "allocate", [resource, process]) => Command::Apply(Step::Allocate {
            resource: resource.parse()?,
            process: process.parse()?,
        }),
        ("request" | "req", [process, resource]) => Command::Apply(Step::Request {
            process: process.parse::<NodeId>()?,
            resource: resource.parse::<NodeId>()?,
        }),
        ("detect" | "d", []) => Command::Apply(Step::Detect),
        ("show", []) => Command::Show("text".to_string()),
        ("show", [format]) => Command::Show(format.to_ascii_lowercase()),
        ("reset" | "clear", []) => Command::Reset,
        ("help" | "?", _) => Command::Help,
        ("quit" | "q" | "exit", []) => Command::Quit,
        _ => {
            return Err(RagError::Other(anyhow::anyhow!(format!(
                "unknown command '{}' (try 'help')",
                line.trim()
            ))))
        }
    };
    Ok(command)
}

/// Reads commands line by line until EOF or `quit`. Command errors are
/// reported on `out` and the session continues; I/O errors end it.
pub fn run_shell<R, W, C>(
    sim: &mut Simulator,
    input: R,
    out: &mut W,
    prompt: bool,
    mut confirm: C,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    C: FnMut(&str) -> Result<bool>,
{
    write_prompt(out, prompt)?;
    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "error: {}", err)?;
                write_prompt(out, prompt)?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(err) = execute(sim, command, out, &mut confirm) {
            match err {
                RagError::Io(err) => return Err(RagError::Io(err)),
                other => writeln!(out, "error: {}", other)?,
            }
        }
        write_prompt(out, prompt)?;
    }
    Ok(())
}

fn execute<W, C>(sim: &mut Simulator, command: Command, out: &mut W, confirm: &mut C) -> Result<()>
where
    W: Write,
    C: FnMut(&str) -> Result<bool>,
{
    match command {
        Command::Empty | Command::Quit => {}
        Command::Apply(step) => {
            let adds_node = matches!(step, Step::AddProcess | Step::AddResource);
            for message in sim.apply(&step)? {
                writeln!(out, "{}", message)?;
            }
            if adds_node {
                writeln!(out, "{}", sim.detect_deadlock().status_line())?;
            }
        }
        Command::Show(format) => {
            let snapshot = sim.snapshot();
            let detection = sim.detect_deadlock();
            match format.as_str() {
                "text" => write!(out, "{}", viz::render_text(&snapshot, &detection))?,
                "dot" => write!(out, "{}", viz::render_dot(&snapshot, &detection))?,
                "json" => writeln!(
                    out,
                    "{}",
                    serde_json::to_string_pretty(&snapshot)
                        .map_err(|err| RagError::Other(anyhow::Error::new(err)))?
                )?,
                other => {
                    return Err(RagError::Other(anyhow::anyhow!(format!(
                        "unknown show format '{}'",
                        other
                    ))))
                }
            }
        }
        Command::Reset => {
            if confirm("Clear all processes and resources?")? {
                for message in sim.apply(&Step::Reset)? {
                    writeln!(out, "{}", message)?;
                }
            } else {
                writeln!(out, "reset cancelled")?;
            }
        }
        Command::Help => {
            write!(out, "{}", HELP)?;
            write!(out, "{}", viz::legend())?;
        }
    }
    Ok(())
}

fn write_prompt<W: Write>(out: &mut W, prompt: bool) -> Result<()> {
    if prompt {
        write!(out, "rag> ")?;
        out.flush()?;
    }
    Ok(())
}
