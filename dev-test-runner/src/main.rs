//! Runs the bundled sample descriptions through the whole pipeline and
//! round-trips a few instances per sum type through project/reconstruct.

use anyhow::{Context, Result};
use colored::Colorize;
use composite_sum::description::parse_descriptions;
use composite_sum::template::{Template, DEFAULT_TEMPLATE};
use composite_sum::{build, generate, unify, GenerateOptions, Instance, Planner};
use serde_json::{json, Value};

const SAMPLES: &str = include_str!("../../samples/sum_types.json");

/// A value per field type, good enough to populate every slot.
fn sample_value(ty: &str, seed: usize) -> Value {
    match ty {
        "java.time.LocalDate" => json!(format!("2020-{:02}-01", seed % 12 + 1)),
        "java.lang.Integer" | "int" | "long" => json!(seed),
        "java.math.BigDecimal" => json!(format!("{seed}.50")),
        "java.util.Currency" => json!("EUR"),
        _ => json!(format!("value-{seed}")),
    }
}

fn main() -> Result<()> {
    let template = Template::parse(DEFAULT_TEMPLATE).context("bundled template")?;
    let descs = parse_descriptions(SAMPLES).map_err(anyhow::Error::msg)?;
    let mut failures = 0;

    for desc in &descs {
        match generate(desc, &template, &GenerateOptions::default()) {
            Ok(adapter) => eprintln!("✅ render {} ({} bytes)", adapter.type_name, adapter.source.len()),
            Err(error) => {
                failures += 1;
                eprintln!("❌ render {}: {error}", desc.name);
                continue;
            }
        }

        let def = build(desc)?;
        let unified = unify(&def);
        let planner = Planner::new(&def, &unified.schema);
        for (seed, alt) in def.alternatives.iter().enumerate() {
            let mut instance = Instance::new(alt.name.clone());
            for (i, field) in alt.fields.iter().enumerate() {
                instance = instance.with(field.name.clone(), sample_value(field.ty.as_str(), seed + i));
            }
            let outcome = planner
                .project(&instance)
                .and_then(|row| planner.reconstruct(&row));
            match outcome {
                Ok(back) if back == instance => eprintln!("✅ round trip {}", alt.name),
                Ok(back) => {
                    failures += 1;
                    eprintln!("❌ round trip {}: came back as {}", alt.name, back.alternative);
                }
                Err(error) => {
                    failures += 1;
                    eprintln!("❌ round trip {}: {error}", alt.name);
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} failure(s)", failures.to_string().red());
    }
    eprintln!("{}", "all samples passed".green());
    Ok(())
}
