use anyhow::Result;
use carelink_gateway::{SummaryEntry, VisitSummary};
use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Prints resources returned by a search or a read.
pub fn print_resources(resources: &[Map<String, Value>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(resources),
        OutputFormat::Table => {
            if resources.is_empty() {
                println!("No resources found.");
            } else {
                println!("{}", resource_table(resources));
                println!("Total: {}", resources.len());
            }
            Ok(())
        }
    }
}

pub fn print_summary(title: &str, entries: &[SummaryEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(entries),
        OutputFormat::Table => {
            println!("{}", title.cyan());
            if entries.is_empty() {
                println!("None recorded.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["ID", "Description"]);
            for entry in entries {
                builder.push_record([entry.id.as_str(), entry.description.as_str()]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            Ok(())
        }
    }
}

pub fn print_visits(visits: &[VisitSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(visits),
        OutputFormat::Table => {
            if visits.is_empty() {
                println!("No visits found.");
            }
            for (index, visit) in visits.iter().enumerate() {
                let heading = visit_heading(visit).unwrap_or_else(|| format!("Visit {}", index + 1));
                println!("{}", heading.cyan());
                let records: Vec<Map<String, Value>> = visit.values().flatten().cloned().collect();
                if records.is_empty() {
                    println!("No records.");
                } else {
                    println!("{}", resource_table(&records));
                }
            }
            Ok(())
        }
    }
}

fn visit_heading(visit: &VisitSummary) -> Option<String> {
    let encounter = visit
        .get(&carelink_core::ResourceType::Encounter)?
        .first()?;
    let id = encounter.get("id")?.as_str()?;
    let start = encounter
        .get("period")
        .and_then(|p| p.get("start"))
        .and_then(Value::as_str)
        .unwrap_or("-");
    Some(format!("Encounter/{id} ({start})"))
}

fn resource_table(resources: &[Map<String, Value>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "ResourceType", "Status", "Description"]);
    for resource in resources {
        builder.push_record([
            field(resource, "id"),
            field(resource, "resourceType"),
            field(resource, "status"),
            describe(resource),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn field<'a>(resource: &'a Map<String, Value>, key: &str) -> &'a str {
    resource.get(key).and_then(Value::as_str).unwrap_or("-")
}

/// Best human-readable label: `code.text`, first coding display, `title`,
/// `description`, `name`.
fn describe(resource: &Map<String, Value>) -> &str {
    let code = resource.get("code");
    code.and_then(|c| c.get("text"))
        .and_then(Value::as_str)
        .or_else(|| {
            code.and_then(|c| c.get("coding"))
                .and_then(Value::as_array)
                .and_then(|codings| {
                    codings
                        .iter()
                        .find_map(|c| c.get("display").and_then(Value::as_str))
                })
        })
        .or_else(|| resource.get("title").and_then(Value::as_str))
        .or_else(|| resource.get("description").and_then(Value::as_str))
        .or_else(|| resource.get("name").and_then(Value::as_str))
        .unwrap_or("-")
}
