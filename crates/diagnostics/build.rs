//! Generates the diagnostic lookup tables from `spec/diagnostics.json`.
//!
//! Outputs in `OUT_DIR`:
//! - `generated_codes.rs`: one `pub const` per code
//! - `generated_explain.rs`: code → description
//! - `generated_severity.rs`: code → default severity
//! - `generated_templates.rs`: code → message template
//!
//! The catalogue is validated before anything is written; a malformed entry
//! fails the build naming its index and id.

use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Deserialize;

const HEADER: &str = "// Generated from spec/diagnostics.json by build.rs.\n\n";

#[derive(Deserialize)]
struct Catalogue {
    diagnostics: Vec<Entry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    id: String,
    const_name: String,
    summary: String,
    description: String,
    severity: String,
    context_keys: Vec<String>,
    message_template: String,
}

fn main() {
    let catalogue_path = Path::new("spec/diagnostics.json");
    println!("cargo:rerun-if-changed={}", catalogue_path.display());

    let raw = fs::read_to_string(catalogue_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", catalogue_path.display()));
    let catalogue: Catalogue = serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("{}: {e}", catalogue_path.display()));

    validate(&catalogue.diagnostics);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let out = Path::new(&out_dir);
    let entries = &catalogue.diagnostics;

    write_out(out, "generated_codes.rs", &codes(entries));
    write_out(
        out,
        "generated_explain.rs",
        &lookup(entries, |e| format!("Some(\"{}\")", escape(&e.description))),
    );
    write_out(
        out,
        "generated_severity.rs",
        &lookup(entries, |e| format!("Some({})", severity_variant(e))),
    );
    write_out(
        out,
        "generated_templates.rs",
        &lookup(entries, |e| format!("Some(\"{}\")", escape(&e.message_template))),
    );
}

fn validate(entries: &[Entry]) {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        let id = &entry.id;
        if id.is_empty() {
            panic!("diagnostics[{i}] missing `id`");
        }
        assert!(ids.insert(id.as_str()), "diagnostics[{i}]: duplicate id '{id}'");

        let name = &entry.const_name;
        assert!(
            name.as_bytes().first().is_some_and(u8::is_ascii_uppercase)
                && name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'),
            "diagnostics[{i}] (id={id}): constName '{name}' is not SCREAMING_SNAKE_CASE"
        );
        assert!(
            names.insert(name.as_str()),
            "diagnostics[{i}] (id={id}): duplicate constName '{name}'"
        );

        for placeholder in placeholders(&entry.message_template) {
            assert!(
                entry.context_keys.iter().any(|k| k == placeholder),
                "diagnostics[{i}] (id={id}): template placeholder '{{{placeholder}}}' is not in contextKeys"
            );
        }
        severity_variant(entry);
    }
}

fn severity_variant(entry: &Entry) -> &'static str {
    match entry.severity.as_str() {
        "error" => "Severity::Error",
        "warn" => "Severity::Warn",
        "info" => "Severity::Info",
        other => panic!("diagnostics (id={}): invalid severity '{other}'", entry.id),
    }
}

fn codes(entries: &[Entry]) -> String {
    let mut out = String::from(HEADER);
    for entry in entries {
        let _ = writeln!(out, "/// {}", entry.summary);
        let _ = writeln!(out, "pub const {}: &str = \"{}\";\n", entry.const_name, entry.id);
    }
    out
}

/// A `match id { .. }` expression mapping each code to `arm(entry)`.
fn lookup(entries: &[Entry], arm: impl Fn(&Entry) -> String) -> String {
    let mut out = String::from(HEADER);
    out.push_str("match id {\n");
    for entry in entries {
        let _ = writeln!(out, "    \"{}\" => {},", entry.id, arm(entry));
    }
    out.push_str("    _ => None,\n}\n");
    out
}

fn write_out(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
}

fn escape(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}

/// `{name}` placeholders in a message template.
fn placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        let key = after[..close].trim();
        if !key.is_empty() {
            found.push(key);
        }
        rest = &after[close + 1..];
    }
    found
}
