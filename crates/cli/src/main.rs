mod grammar;
mod logging;
mod render;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmdgrammar_core::{CommandDispatcher, CommandSyntaxError, ErrorKind, ParseResults, to_pretty_json};
use cmdgrammar_diagnostics as diag;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::grammar::{CliSource, demo_dispatcher, load_grammar};
use crate::render::{Format, print_json, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cmdg",
    version,
    about = "Execute, inspect and complete command lines against a command grammar"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// JSON grammar file merged over the built-in commands.
    #[arg(long, global = true)]
    grammar: Option<PathBuf>,

    /// Name of the source running the command.
    #[arg(long = "as", global = true, default_value = "console")]
    source_name: String,

    /// Run with admin permissions.
    #[arg(long, global = true)]
    admin: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse and execute a command line.
    Exec { input: String },
    /// Parse a command line and print what matched.
    Parse { input: String },
    /// Complete a command line.
    Suggest {
        input: String,
        /// Cursor position in bytes; defaults to the end of the input.
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// Print usage for a command path (the whole grammar when empty).
    Usage {
        path: Vec<String>,
        /// One condensed line per child instead of every executable path.
        #[arg(long)]
        smart: bool,
    },
    /// List sibling nodes that accept each other's inputs.
    Ambiguities,
    /// Explain a diagnostic code (e.g., CMD2002).
    Explain { id: String },
}

fn main() {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());
    logging::init(cli.verbose, cli.quiet);

    if let Err(err) = run(cli, format) {
        match format {
            Format::Json => {
                let envelope = json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                });
                match serde_json::to_string_pretty(&envelope) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("error: {err:#}"),
                }
            }
            Format::Pretty => eprintln!("error: {err:#}"),
        }
        process::exit(2);
    }
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let source = CliSource::new(cli.source_name.as_str(), cli.admin);

    if let Cmd::Explain { id } = &cli.cmd {
        return cmd_explain(id, format);
    }

    let mut dispatcher = demo_dispatcher();
    if let Some(path) = &cli.grammar {
        let count = load_grammar(path, &mut dispatcher)?;
        info!(commands = count, "loaded grammar from {}", path.display());
    }

    match cli.cmd {
        Cmd::Exec { input } => cmd_exec(&dispatcher, &input, source, format),
        Cmd::Parse { input } => cmd_parse(&dispatcher, &input, source, format),
        Cmd::Suggest { input, cursor } => cmd_suggest(&dispatcher, &input, cursor, source, format),
        Cmd::Usage { path, smart } => cmd_usage(&dispatcher, &path, smart, &source, format),
        Cmd::Ambiguities => cmd_ambiguities(&dispatcher, format),
        Cmd::Explain { .. } => Ok(()),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_exec(
    dispatcher: &CommandDispatcher<CliSource>,
    input: &str,
    source: CliSource,
    format: Format,
) -> Result<()> {
    let parse = dispatcher.parse(input, source.clone());
    let outcome = dispatcher.execute_parsed(&parse);
    let output = source.take_output();

    match outcome {
        Ok(result) => {
            debug!(result, "command finished");
            match format {
                Format::Json => print_json(&json!({
                    "success": true,
                    "result": result,
                    "output": output,
                }))?,
                Format::Pretty => {
                    for line in &output {
                        println!("{line}");
                    }
                    eprintln!("result: {result}");
                }
            }
            Ok(())
        }
        Err(err) => {
            match format {
                Format::Json => print_json(&json!({
                    "success": false,
                    "output": output,
                    "diagnostics": [err.to_diagnostic()],
                }))?,
                Format::Pretty => {
                    for line in &output {
                        println!("{line}");
                    }
                    report_error(input, &err);
                }
            }
            process::exit(1);
        }
    }
}

fn cmd_parse(
    dispatcher: &CommandDispatcher<CliSource>,
    input: &str,
    source: CliSource,
    format: Format,
) -> Result<()> {
    let parse = dispatcher.parse(input, source);
    let trace = parse.trace(dispatcher);
    let error = parse_error(&parse);

    match format {
        Format::Json => {
            let diagnostics: Vec<_> = error.iter().map(CommandSyntaxError::to_diagnostic).collect();
            print_json(&json!({ "trace": trace, "diagnostics": diagnostics }))?;
        }
        Format::Pretty => {
            println!("{}", to_pretty_json(&trace)?);
            if let Some(err) = &error {
                report_error(input, err);
            }
        }
    }
    if error.is_some() {
        process::exit(1);
    }
    Ok(())
}

fn cmd_suggest(
    dispatcher: &CommandDispatcher<CliSource>,
    input: &str,
    cursor: Option<usize>,
    source: CliSource,
    format: Format,
) -> Result<()> {
    let parse = dispatcher.parse(input, source);
    let suggestions = match cursor {
        Some(cursor) => dispatcher.get_completion_suggestions_at(&parse, cursor),
        None => dispatcher.get_completion_suggestions(&parse),
    };

    match format {
        Format::Json => print_json(&suggestions)?,
        Format::Pretty => {
            for suggestion in suggestions.list() {
                match suggestion.tooltip() {
                    Some(tooltip) => println!("{}\t{tooltip}", suggestion.text()),
                    None => println!("{}", suggestion.text()),
                }
            }
        }
    }
    Ok(())
}

fn cmd_usage(
    dispatcher: &CommandDispatcher<CliSource>,
    path: &[String],
    smart: bool,
    source: &CliSource,
    format: Format,
) -> Result<()> {
    let node = dispatcher
        .find_node(path)
        .with_context(|| format!("unknown command path '{}'", path.join(" ")))?;

    let usage: Vec<String> = if smart {
        dispatcher
            .get_smart_usage(node, source)
            .into_iter()
            .map(|(_, usage)| usage)
            .collect()
    } else {
        dispatcher.get_all_usage(node, source, true)
    };

    match format {
        Format::Json => print_json(&json!({ "path": path, "usage": usage }))?,
        Format::Pretty => {
            if !path.is_empty() {
                println!("{}:", path.join(" "));
            }
            for line in &usage {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Two siblings of `parent` that both accept every entry in `inputs`.
#[derive(Serialize)]
struct Ambiguity {
    parent: Vec<String>,
    child: String,
    sibling: String,
    inputs: Vec<String>,
}

fn cmd_ambiguities(dispatcher: &CommandDispatcher<CliSource>, format: Format) -> Result<()> {
    let mut found = Vec::new();
    dispatcher.find_ambiguities(|parent, child, sibling, inputs| {
        found.push(Ambiguity {
            parent: dispatcher.get_path(parent),
            child: dispatcher.node(child).name().to_string(),
            sibling: dispatcher.node(sibling).name().to_string(),
            inputs: inputs.iter().cloned().collect(),
        });
    });

    match format {
        Format::Json => print_json(&found)?,
        Format::Pretty => {
            for ambiguity in &found {
                let parent = if ambiguity.parent.is_empty() {
                    "<root>".to_string()
                } else {
                    ambiguity.parent.join(" ")
                };
                println!(
                    "{parent}: {} and {} both accept {}",
                    ambiguity.child,
                    ambiguity.sibling,
                    ambiguity.inputs.join(", ")
                );
            }
            if found.is_empty() {
                eprintln!("no ambiguities");
            }
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            print_json(&json!({
                "id": id,
                "explanation": diag::explain(id),
            }))?;
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// The error execution would report, without running anything.
fn parse_error(parse: &ParseResults<CliSource>) -> Option<CommandSyntaxError> {
    parse.syntax_error().or_else(|| {
        (!parse.is_complete()).then(|| ErrorKind::UnknownCommand.create_with_context(parse.reader()))
    })
}

fn report_error(input: &str, err: &CommandSyntaxError) {
    render_diagnostics_pretty(input, &[err.to_diagnostic()]);
}
