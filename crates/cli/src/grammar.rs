//! The command source, the built-in demo grammar, and JSON grammar files.

use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, bail};
use cmdgrammar_core::suggestion::suggest_matching;
use cmdgrammar_core::{
    ArgumentBuilder, CommandContext, CommandDispatcher, NodeId, argument, bool, double_range,
    float_range, greedy_string, integer, integer_range, literal, long_range, string, word,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Execution context seen by command callbacks.
type Ctx = CommandContext<CliSource>;

/// Names the `everyone` fork expands into.
pub(crate) const ROSTER: &[&str] = &["alice", "bob", "carol"];

// ── Source ──────────────────────────────────────────────────────────────

/// Who is running a command. Redirects and forks derive new sources that
/// share one output transcript.
#[derive(Debug, Clone)]
pub(crate) struct CliSource {
    pub(crate) name: String,
    pub(crate) admin: bool,
    output: Arc<Mutex<Vec<String>>>,
}

impl CliSource {
    pub(crate) fn new(name: impl Into<String>, admin: bool) -> Self {
        Self {
            name: name.into(),
            admin,
            output: Arc::default(),
        }
    }

    /// The same source acting under another name.
    pub(crate) fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: self.admin,
            output: Arc::clone(&self.output),
        }
    }

    /// Append a line to the shared transcript.
    pub(crate) fn emit(&self, line: impl Into<String>) {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    /// Drain the shared transcript.
    pub(crate) fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ── Demo grammar ────────────────────────────────────────────────────────

/// The grammar every invocation starts from.
pub(crate) fn demo_dispatcher() -> CommandDispatcher<CliSource> {
    let mut d = CommandDispatcher::<CliSource>::new();

    d.register(
        literal("say").then(argument("message", greedy_string()).executes(|ctx: &Ctx| {
            let message = ctx.get_argument_ref::<String>("message")?;
            ctx.source().emit(format!("<{}> {message}", ctx.source().name));
            Ok(1)
        })),
    );
    d.register(
        literal("echo").then(argument("text", string()).executes(|ctx: &Ctx| {
            ctx.source().emit(ctx.get_argument::<String>("text")?);
            Ok(1)
        })),
    );
    d.register(
        literal("add").then(
            argument("a", integer()).then(argument("b", integer()).executes(|ctx| {
                let a: i32 = ctx.get_argument("a")?;
                let b: i32 = ctx.get_argument("b")?;
                Ok(a.wrapping_add(b))
            })),
        ),
    );
    d.register(
        literal("give").then(
            argument("target", word())
                .suggests(|_, builder| Ok(suggest_matching(ROSTER, builder)))
                .then(
                    argument("count", integer_range(1, 64))
                        .default_value(1i32)
                        .executes(|ctx: &Ctx| {
                            let target = ctx.get_argument_ref::<String>("target")?;
                            let count: i32 = ctx.get_argument("count")?;
                            ctx.source().emit(format!("gave {count} to {target}"));
                            Ok(count)
                        }),
                ),
        ),
    );
    d.register(
        literal("toggle").then(
            argument("value", bool())
                .executes(|ctx| Ok(i32::from(ctx.get_argument::<bool>("value")?))),
        ),
    );
    d.register(literal("whoami").executes(|ctx: &Ctx| {
        ctx.source().emit(ctx.source().name.clone());
        Ok(1)
    }));
    d.register(
        literal("stop")
            .requires(|source: &CliSource| source.admin)
            .executes(|ctx: &Ctx| {
                ctx.source().emit("stopping");
                Ok(1)
            }),
    );
    d.register(literal("as").then(
        argument("name", word()).redirect_with(NodeId::ROOT, |ctx: &Ctx| {
            let name = ctx.get_argument_ref::<String>("name")?;
            Ok(ctx.source().with_name(name.as_str()))
        }),
    ));
    d.register(literal("everyone").fork(NodeId::ROOT, |ctx: &Ctx| {
        Ok(ROSTER
            .iter()
            .map(|name| ctx.source().with_name(*name))
            .collect())
    }));
    d.register(literal("run").redirect(NodeId::ROOT));
    d.register(
        literal("repeat").then(
            argument("times", integer_range(1, 100))
                .then(argument("command", greedy_string()).executes(|ctx: &Ctx| {
                    let times: i32 = ctx.get_argument("times")?;
                    let command = ctx.get_argument_ref::<String>("command")?;
                    if let Some(scheduler) = ctx.scheduler() {
                        for _ in 0..times {
                            scheduler.schedule(command.as_str(), ctx.source().clone());
                        }
                    }
                    Ok(times)
                })),
        ),
    );

    debug!(nodes = d.tree().len(), "demo grammar ready");
    d
}

// ── Grammar files ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GrammarFile {
    commands: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    #[serde(flatten)]
    target: TargetSpec,
    /// Makes the node executable, returning this constant.
    #[serde(default)]
    result: Option<i32>,
    /// Path of an already-registered node; `[]` is the root.
    #[serde(default)]
    redirect: Option<Vec<String>>,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    children: Vec<NodeSpec>,
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetSpec {
    Literal {
        literal: String,
    },
    Argument {
        argument: String,
        #[serde(rename = "type")]
        ty: ArgTypeSpec,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ArgTypeSpec {
    Bool,
    Integer { min: Option<i32>, max: Option<i32> },
    Long { min: Option<i64>, max: Option<i64> },
    Float { min: Option<f32>, max: Option<f32> },
    Double { min: Option<f64>, max: Option<f64> },
    Word,
    String,
    Greedy,
}

/// Merge the commands of the grammar file at `path` into `dispatcher`.
/// Returns how many top-level commands were registered.
pub(crate) fn load_grammar(path: &Path, dispatcher: &mut CommandDispatcher<CliSource>) -> Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read grammar file '{}'", path.display()))?;
    let file: GrammarFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse grammar file '{}'", path.display()))?;

    for spec in &file.commands {
        let builder = build_node(spec, dispatcher)?;
        dispatcher.register(builder);
    }
    debug!(
        path = %path.display(),
        commands = file.commands.len(),
        "grammar file loaded"
    );
    Ok(file.commands.len())
}

fn build_node(
    spec: &NodeSpec,
    dispatcher: &CommandDispatcher<CliSource>,
) -> Result<ArgumentBuilder<CliSource>> {
    let mut builder = match &spec.target {
        TargetSpec::Literal { literal: text } => {
            if spec.default.is_some() {
                bail!("literal '{text}' cannot have a default value");
            }
            literal(text.as_str())
        }
        TargetSpec::Argument { argument: name, ty } => {
            typed_argument(name, ty, spec.default.as_ref())?
        }
    };

    if spec.admin {
        builder = builder.requires(|source: &CliSource| source.admin);
    }
    if let Some(result) = spec.result {
        builder = builder.executes(move |_| Ok(result));
    }

    match &spec.redirect {
        Some(path) => {
            if !spec.children.is_empty() {
                bail!("node '{}' cannot have both children and a redirect", builder.name());
            }
            let target = dispatcher.find_node(path).with_context(|| {
                format!("redirect target '{}' is not registered", path.join(" "))
            })?;
            builder = if spec.fork {
                builder.fork(target, |ctx| Ok(vec![ctx.source().clone()]))
            } else {
                builder.redirect(target)
            };
        }
        None => {
            if spec.fork {
                bail!("node '{}' forks without a redirect target", builder.name());
            }
            for child in &spec.children {
                builder = builder.then(build_node(child, dispatcher)?);
            }
        }
    }
    Ok(builder)
}

fn typed_argument(
    name: &str,
    ty: &ArgTypeSpec,
    default: Option<&Value>,
) -> Result<ArgumentBuilder<CliSource>> {
    match ty {
        ArgTypeSpec::Bool => with_default(argument(name, bool()), default, Value::as_bool),
        ArgTypeSpec::Integer { min, max } => with_default(
            argument(
                name,
                integer_range(min.unwrap_or(i32::MIN), max.unwrap_or(i32::MAX)),
            ),
            default,
            |v| v.as_i64().and_then(|n| i32::try_from(n).ok()),
        ),
        ArgTypeSpec::Long { min, max } => with_default(
            argument(
                name,
                long_range(min.unwrap_or(i64::MIN), max.unwrap_or(i64::MAX)),
            ),
            default,
            Value::as_i64,
        ),
        ArgTypeSpec::Float { min, max } => with_default(
            argument(
                name,
                float_range(min.unwrap_or(f32::MIN), max.unwrap_or(f32::MAX)),
            ),
            default,
            |v| v.as_f64().map(|f| f as f32),
        ),
        ArgTypeSpec::Double { min, max } => with_default(
            argument(
                name,
                double_range(min.unwrap_or(f64::MIN), max.unwrap_or(f64::MAX)),
            ),
            default,
            Value::as_f64,
        ),
        ArgTypeSpec::Word => with_default(argument(name, word()), default, text_value),
        ArgTypeSpec::String => with_default(argument(name, string()), default, text_value),
        ArgTypeSpec::Greedy => with_default(argument(name, greedy_string()), default, text_value),
    }
}

fn text_value(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn with_default<T, F>(
    builder: ArgumentBuilder<CliSource>,
    default: Option<&Value>,
    convert: F,
) -> Result<ArgumentBuilder<CliSource>>
where
    T: Any + Send + Sync,
    F: Fn(&Value) -> Option<T>,
{
    let Some(value) = default else {
        return Ok(builder);
    };
    let converted = convert(value).with_context(|| {
        format!(
            "default value {value} does not fit argument '{}'",
            builder.name()
        )
    })?;
    Ok(builder.default_value(converted))
}
