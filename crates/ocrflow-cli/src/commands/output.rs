//! Rendering of invoice records and command output.

use std::fs;
use std::path::Path;

use console::style;
use serde::Serialize;
use tracing::warn;

use ocrflow_core::models::invoice::{InvoiceRecord, Party};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

/// Print to stdout, or write to `output` when given.
pub fn emit(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("{} Output written to {}", style("✓").green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub fn format_invoice(record: &InvoiceRecord, format: OutputFormat) -> anyhow::Result<String> {
    if record.is_empty() {
        warn!("No invoice fields recognised in the text");
    }

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

#[derive(Clone, Copy, Serialize)]
struct CsvRow<'a> {
    invoice_number: Option<&'a str>,
    issue_date: Option<&'a str>,
    due_date: Option<&'a str>,
    issuer_tax_id: Option<&'a str>,
    issuer_name: Option<&'a str>,
    buyer_tax_id: Option<&'a str>,
    buyer_name: Option<&'a str>,
    item_code: Option<&'a str>,
    item_description: Option<&'a str>,
    item_quantity: Option<f64>,
    item_unit_price: Option<f64>,
    subtotal: Option<f64>,
}

fn format_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let header = CsvRow {
        invoice_number: record.invoice.invoice_number.as_deref(),
        issue_date: record.invoice.issue_date.as_deref(),
        due_date: record.invoice.due_date.as_deref(),
        issuer_tax_id: record.issuer.tax_id.as_deref(),
        issuer_name: record.issuer.name.as_deref(),
        buyer_tax_id: record.buyer.tax_id.as_deref(),
        buyer_name: record.buyer.name.as_deref(),
        item_code: None,
        item_description: None,
        item_quantity: None,
        item_unit_price: None,
        subtotal: record.subtotal,
    };

    if record.line_items.is_empty() {
        wtr.serialize(&header)?;
    }
    for item in &record.line_items {
        wtr.serialize(CsvRow {
            item_code: item.code.as_deref(),
            item_description: item.description.as_deref(),
            item_quantity: item.quantity,
            item_unit_price: item.unit_price,
            ..header
        })?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();
    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    output.push_str(&format!("Invoice: {}\n", or_dash(&record.invoice.invoice_number)));
    output.push_str(&format!("Date: {}\n", or_dash(&record.invoice.issue_date)));
    if let Some(due_date) = &record.invoice.due_date {
        output.push_str(&format!("Due: {}\n", due_date));
    }
    output.push('\n');

    push_party(&mut output, "Issuer", &record.issuer);
    push_party(&mut output, "Buyer", &record.buyer);

    if !record.line_items.is_empty() {
        output.push_str("Items:\n");
        for item in &record.line_items {
            output.push_str(&format!(
                "  {} {} x{} @ {}\n",
                or_dash(&item.code),
                or_dash(&item.description),
                item.quantity.map(|q| q.to_string()).unwrap_or_else(|| "-".to_string()),
                item.unit_price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            ));
        }
        output.push('\n');
    }

    if let Some(subtotal) = record.subtotal {
        output.push_str(&format!("Subtotal: {}\n", subtotal));
    }

    output
}

fn push_party(output: &mut String, title: &str, party: &Party) {
    if party.is_empty() {
        return;
    }
    output.push_str(&format!("{}:\n", title));
    if let Some(name) = &party.name {
        output.push_str(&format!("  {}\n", name));
    }
    if let Some(tax_id) = &party.tax_id {
        output.push_str(&format!("  Tax ID: {}\n", tax_id));
    }
    output.push('\n');
}
