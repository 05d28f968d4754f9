// CLI query command: run one SQL statement end to end and print the result.

use std::path::Path;
use std::sync::Arc;

use chrono::TimeZone;

use crate::cli::{resolve_config, Cli};
use crate::client::JobServiceClient;
use crate::cursor::QueryCursor;
use crate::models::{Column, Row};

pub async fn cmd_query(
    cli: &Cli,
    sql: Option<&str>,
    file: Option<&Path>,
    json: bool,
    events: bool,
) -> anyhow::Result<()> {
    let statement = match (sql, file) {
        (Some(s), None) => s.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?,
        _ => {
            anyhow::bail!("Either --sql (-q) or --file (-f) must be specified");
        }
    };

    let config = Arc::new(resolve_config(cli)?);
    let client = Arc::new(JobServiceClient::new(Arc::clone(&config))?);
    let mut cursor = QueryCursor::new(client, config);

    cursor.execute(&statement, &[]).await?;

    if json {
        let body = serde_json::json!({
            "schema": cursor.description(),
            "rows": cursor.fetch_all(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_table(cursor.description(), cursor.fetch_all());
    }

    if events {
        for event in cursor.spark_events().await? {
            let when = chrono::Utc
                .timestamp_millis_opt(event.timestamp_ms)
                .single()
                .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| event.timestamp_ms.to_string());
            println!("{:<40} {}", event.name.as_deref().unwrap_or("-"), when);
        }
    }

    Ok(())
}

fn print_table(schema: &[Column], rows: &[Row]) {
    if schema.is_empty() {
        println!("(no tabular output)");
        return;
    }

    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = schema.iter().map(|c| c.name.len()).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header: Vec<String> = schema
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<width$}", c.name, width = w))
        .collect();
    println!("{}", header.join("  "));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in &rendered {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0))
            })
            .collect();
        println!("{}", cells.join("  "));
    }
    println!(
        "({} row{})",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    );
}
