//! CLI: describe → (schema | render | project | reconstruct)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info};

use crate::codegen::EmitOptions;
use crate::description::{descriptions_from_value, SumTypeDescription};
use crate::pipeline::{GenerateOptions, GeneratedAdapter};
use crate::plan::{Instance, Planner, Row};
use crate::template::{Template, DEFAULT_TEMPLATE};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// flatten closed sum types into a wide nullable row and generate the mapping adapter
#[derive(Parser, Debug)]
#[command(name = "composite-sum", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the flattened schema, common fields and reconstruction order as JSON
    Schema(SchemaOut),
    /// generate the adapter source for every description
    Render(RenderOut),
    /// lay one instance (JSON) out as a row over the flattened schema
    Project(ProbeArgs),
    /// infer the alternative of one row (JSON array) and rebuild the instance
    Reconstruct(ProbeArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more description files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct GenerateSettings {
    /// package of the generated adapters (default: from the description)
    #[arg(long)]
    package: Option<String>,

    /// fail when two alternatives have identical field sets
    #[arg(long, default_value_t = false)]
    deny_ambiguous: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    generate_settings: GenerateSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct RenderOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    generate_settings: GenerateSettings,

    /// adapter skeleton (bundled Hibernate CompositeUserType if omitted)
    #[arg(long)]
    template: Option<PathBuf>,

    /// annotate fields shared by every alternative as non-nullable columns
    #[arg(long, default_value_t = false)]
    non_null_hints: bool,

    /// output root; adapters land in <out-dir>/<package dirs>/<Name>.java (stdout if omitted)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ProbeArgs {
    #[command(flatten)]
    input_settings: InputSettings,

    /// sum type to probe when the input holds several
    #[arg(long)]
    sum_type: Option<String>,

    /// instance or row as inline JSON
    #[arg(long)]
    value: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_descriptions(&self) -> Result<Vec<SumTypeDescription>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read description file {source_path_str}"))?;
            let json_value = serde_json::from_str::<serde_json::Value>(&source)
                .with_context(|| format!("failed to parse JSON file ({source_path_str})"))?;
            let documents = match self.jq_expr.as_ref() {
                None => vec![json_value],
                Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                    format!("failed to apply jq expression to {source_path_str}")
                })?,
            };
            for document in documents {
                let descs = descriptions_from_value(document).map_err(|error| {
                    anyhow::anyhow!("invalid description in {source_path_str}: {error}")
                })?;
                debug!(file = %source_path_str, count = descs.len(), "loaded descriptions");
                out.extend(descs);
            }
        }
        Ok(out)
    }
}

impl GenerateSettings {
    fn options(&self, emit: EmitOptions) -> GenerateOptions {
        GenerateOptions {
            emit,
            package: self.package.clone(),
            deny_ambiguous: self.deny_ambiguous,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let descs = target.input_settings.load_descriptions()?;
                let opts = target.generate_settings.options(EmitOptions::default());
                let reports = descs
                    .iter()
                    .map(|d| {
                        crate::pipeline::analyze(d, &opts).with_context(|| format!("sum type {}", d.name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let schema_src = serde_json::to_string_pretty(&reports)?;
                write_or_print(target.out.as_deref(), &schema_src)
            }
            Command::Render(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let template = load_template(target.template.as_deref())?;
                let descs = target.input_settings.load_descriptions()?;
                let opts = target.generate_settings.options(EmitOptions {
                    non_null_hints: target.non_null_hints,
                });

                let mut failed = 0usize;
                let results = crate::pipeline::generate_all(&descs, &template, &opts);
                for (desc, result) in descs.iter().zip(results) {
                    match result {
                        Ok(adapter) => emit_adapter(target.out_dir.as_deref(), &adapter)?,
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {}: {error}", "❌".red(), desc.name.bold());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} sum types failed to generate", descs.len());
                }
                Ok(())
            }
            Command::Project(target) => {
                let instance: Instance = serde_json::from_str(&target.value)
                    .context("--value must be an instance object")?;
                let row = target.with_planner(|planner| Ok(planner.project(&instance)?))?;
                println!("{}", serde_json::to_string_pretty(&row)?);
                Ok(())
            }
            Command::Reconstruct(target) => {
                let row: Row = serde_json::from_str(&target.value)
                    .context("--value must be a JSON array")?;
                let instance = target.with_planner(|planner| Ok(planner.reconstruct(&row)?))?;
                println!("{}", serde_json::to_string_pretty(&instance)?);
                Ok(())
            }
        }
    }
}

impl ProbeArgs {
    fn with_planner<T>(&self, f: impl FnOnce(&Planner<'_>) -> Result<T>) -> Result<T> {
        let descs = self.input_settings.load_descriptions()?;
        let desc = match (&self.sum_type, descs.as_slice()) {
            (None, [only]) => only,
            (None, _) => bail!("input holds {} sum types; pick one with --sum-type", descs.len()),
            (Some(name), _) => descs
                .iter()
                .find(|d| &d.name == name)
                .with_context(|| format!("no sum type named {name} in the input"))?,
        };
        let def = crate::definition::build(desc)?;
        let schema = crate::unify::flattened_schema(&def);
        let planner = Planner::new(&def, &schema);
        f(&planner)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_template(path: Option<&Path>) -> Result<Template> {
    let (origin, source) = match path {
        Some(path) => (
            path.to_string_lossy().to_string(),
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read template {}", path.display()))?,
        ),
        None => ("<bundled>".to_string(), DEFAULT_TEMPLATE.to_string()),
    };
    Template::parse(&source).with_context(|| format!("invalid template {origin}"))
}

fn emit_adapter(out_dir: Option<&Path>, adapter: &GeneratedAdapter) -> Result<()> {
    match out_dir {
        None => {
            println!("{}", adapter.source);
            Ok(())
        }
        Some(root) => {
            let path = root.join(&adapter.relative_path);
            write_or_print(Some(&path), &adapter.source)?;
            info!(sum_type = %adapter.sum_type, path = %path.display(), "wrote adapter");
            eprintln!("{} {}", "✅".green(), path.display());
            Ok(())
        }
    }
}

fn write_or_print(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // an explicit glob that matches nothing is almost certainly a typo
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.append(&mut matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
