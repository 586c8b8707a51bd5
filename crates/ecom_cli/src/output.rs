use colored::*;
use ecom_cleaner::{PreparedRun, ProfileSummary};
use ecom_core::{Entity, SchemaRegistry};
use serde_json::{Value, json};

pub fn print_run_report(run: &PreparedRun, format: &str) {
    match format {
        "json" => print_json_run(run),
        _ => print_text_run(run),
    }
}

fn print_text_run(run: &PreparedRun) {
    let summary = &run.summary;

    println!("\n{}", "═".repeat(72));
    println!("{}", "  CLEANING REPORT".bold());
    println!("{}", "═".repeat(72));

    println!(
        "\n  {:<22} {:>9} {:>9} {:>9} {:>9}",
        "table".bold(),
        "original".bold(),
        "clean".bold(),
        "removed".bold(),
        "removed%".bold()
    );
    for table in &summary.tables {
        println!(
            "  {:<22} {:>9} {:>9} {:>9} {:>8.2}%",
            table.table.as_str(),
            table.rows_in,
            table.rows_out,
            table.removed,
            table.removed_pct
        );
    }

    println!("\n{}", "Totals:".bold());
    println!("  Original rows:          {}", summary.total_original_rows);
    println!("  Clean rows:             {}", summary.total_clean_rows);
    println!("  Business-rule removals: {}", summary.business_rule_removed);
    println!("  Error removals:         {}", summary.error_removed);
    println!("  Integrity passes:       {}", summary.integrity_passes);
    println!("  Quality score:          {:.4}", summary.quality_score);

    if let Some(integrity) = run
        .context
        .integrity()
        .filter(|i| !i.violations.is_empty())
    {
        println!(
            "\n{}",
            format!("Integrity violations ({}):", integrity.violations.len())
                .red()
                .bold()
        );
        for (i, violation) in integrity.violations.iter().enumerate() {
            println!("  {}. {}", i + 1, violation.to_string().red());
        }
    }

    let warnings = run.context.warnings();
    if !warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for (i, warning) in warnings.iter().enumerate() {
            println!("  {}. {}", i + 1, warning.yellow());
        }
    }

    if run.ensure_loadable().is_ok() {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Run is loadable".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Run is NOT loadable".red().bold()
        );
    }
    println!("{}", "═".repeat(72));
}

fn print_json_run(run: &PreparedRun) {
    let violations: Vec<String> = run
        .context
        .integrity()
        .map(|i| i.violations.iter().map(|v| v.to_string()).collect())
        .unwrap_or_default();

    let output = json!({
        "loadable": run.ensure_loadable().is_ok(),
        "load_order": names(&run.load_order),
        "summary": &run.summary,
        "violations": violations,
        "warnings": run.context.warnings(),
    });
    print_json(&output);
}

pub fn print_registry(registry: &SchemaRegistry, load_order: &[Entity], format: &str) {
    match format {
        "json" => print_json_registry(registry, load_order),
        _ => print_text_registry(registry, load_order),
    }
}

fn print_text_registry(registry: &SchemaRegistry, load_order: &[Entity]) {
    print_success(&format!("Registry {} is valid", registry.version));

    println!("\n{}", "Entities:".bold());
    for schema in &registry.entities {
        println!(
            "  {} ({} fields, key {})",
            schema.name.as_str().bold(),
            schema.fields.len(),
            schema.primary_key
        );
        for fk in &schema.foreign_keys {
            println!(
                "    {} -> {}.{} [{}]",
                fk.field, fk.references, fk.target_field, fk.on_delete
            );
        }
    }

    print_info(&format!("Load order: {}", names(load_order).join(" -> ")));
}

fn print_json_registry(registry: &SchemaRegistry, load_order: &[Entity]) {
    let entities: Vec<Value> = registry
        .entities
        .iter()
        .map(|schema| {
            json!({
                "name": schema.name,
                "primary_key": schema.primary_key,
                "fields": schema.fields.len(),
                "foreign_keys": schema.foreign_keys,
            })
        })
        .collect();

    let output = json!({
        "valid": true,
        "version": registry.version,
        "entities": entities,
        "load_order": names(load_order),
    });
    print_json(&output);
}

pub fn print_profile(summary: &ProfileSummary, format: &str) {
    match format {
        "json" => match serde_json::to_value(summary) {
            Ok(value) => print_json(&value),
            Err(e) => print_error(&format!("Failed to serialize profile: {}", e)),
        },
        _ => print_text_profile(summary),
    }
}

fn print_text_profile(summary: &ProfileSummary) {
    println!("\n{}", "═".repeat(72));
    println!("{}", "  RAW DATA PROFILE".bold());
    println!("{}", "═".repeat(72));

    println!(
        "\n  {:<22} {:>9} {:>8} {:>9} {:>10} {:>9}",
        "table".bold(),
        "rows".bold(),
        "columns".bold(),
        "missing".bold(),
        "duplicates".bold(),
        "complete%".bold()
    );
    for table in &summary.tables {
        println!(
            "  {:<22} {:>9} {:>8} {:>9} {:>10} {:>8.2}%",
            table.table.as_str(),
            table.rows,
            table.columns,
            table.missing_values,
            table.duplicates,
            table.quality_score
        );
    }

    for entity in &summary.skipped {
        println!("  {:<22} {}", entity.as_str(), "missing extract".yellow());
    }

    println!("\n{}", "Summary:".bold());
    println!("  Mean completeness: {:.2}%", summary.mean_completeness);
    println!("  Total duplicates:  {}", summary.total_duplicates);

    if summary.acceptable {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Raw data quality is acceptable".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Raw data quality needs attention".red().bold()
        );
    }
    println!("{}", "═".repeat(72));
}

fn names(entities: &[Entity]) -> Vec<&'static str> {
    entities.iter().map(|e| e.as_str()).collect()
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => print_error(&format!("Failed to render JSON: {}", e)),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
