//! Output rendering: ariadne reports for humans, JSON for pipes.
//!
//! Syntax errors carry a cursor into the command line; pretty output points
//! at it with a source-annotated report, JSON output carries the
//! [`Diagnostic`] as-is.

use std::io::{self, IsTerminal};

use anyhow::Result;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use cmdgrammar_diagnostics::{Diagnostic, Severity};
use serde::Serialize;

/// Name shown in reports for the command line being rendered.
pub(crate) const INPUT_NAME: &str = "<input>";

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, otherwise pretty for terminals and JSON for pipes.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

/// Widen a zero-width cursor span over the next character so the label
/// has something to underline.
fn label_range(input: &str, start: usize, end: usize) -> std::ops::Range<usize> {
    let start = start.min(input.len());
    let end = end.min(input.len()).max(start);
    if start < end {
        return start..end;
    }
    match input[start..].chars().next() {
        Some(ch) => start..start + ch.len_utf8(),
        None => start..end,
    }
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render diagnostics against the command line `input` to stderr.
pub(crate) fn render_diagnostics_pretty(input: &str, diagnostics: &[Diagnostic]) {
    let config = Config::default().with_compact(false);
    let mut cache = (INPUT_NAME, Source::from(input));

    for diag in diagnostics {
        let Some(span) = &diag.span else {
            let kind_str = match diag.severity {
                Severity::Error => "error",
                Severity::Warn => "warning",
                Severity::Info => "info",
                _ => "diagnostic",
            };
            eprintln!("{kind_str}[{}]: {}", diag.id, diag.message);
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
            continue;
        };

        let range = label_range(input, span.start, span.end);
        let mut builder = Report::build(report_kind(&diag.severity), (INPUT_NAME, range.clone()))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(config);

        builder = builder.with_label(
            Label::new((INPUT_NAME, range))
                .with_message(label_message(diag))
                .with_color(severity_color(&diag.severity)),
        );
        if let Some(explanation) = diag.explain() {
            builder = builder.with_help(explanation);
        }

        builder.finish().eprint(&mut cache).ok();
    }
}

/// Compact `key=value` label from the diagnostic data, or the message.
fn label_message(diag: &Diagnostic) -> String {
    if let Some(ctx) = &diag.context
        && !ctx.is_empty()
    {
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        diag.message.clone()
    }
}

// ── JSON rendering ──────────────────────────────────────────────────────

/// Print `value` as pretty JSON to stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
