//! Label-prefix invoice parser.
//!
//! The text is read line by line. A line starting with a known label
//! (`Invoice Number:`, `Item:`, ...) sets the matching field; every other
//! line is ignored. `Item:` lines hold comma-separated sub-fields such as
//! `Code ABC, Quantity 2` and produce one line item each.

use tracing::{debug, trace};

use super::{InvoiceParser, Result};
use crate::error::ExtractionError;
use crate::models::invoice::{InvoiceRecord, LineItem};

/// Fields filled from whole lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineField {
    InvoiceNumber,
    IssueDate,
    DueDate,
    IssuerTaxId,
    IssuerName,
    BuyerTaxId,
    BuyerName,
    Item,
    Subtotal,
}

/// Fields filled from the parts of an `Item:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Code,
    Description,
    Quantity,
    UnitPrice,
}

/// Line labels, checked in order; the first match wins.
pub const LINE_LABELS: &[(&str, LineField)] = &[
    ("Invoice Number:", LineField::InvoiceNumber),
    ("Issue Date:", LineField::IssueDate),
    ("Due Date:", LineField::DueDate),
    ("Issuer Tax ID:", LineField::IssuerTaxId),
    ("Issuer Name:", LineField::IssuerName),
    ("Buyer Tax ID:", LineField::BuyerTaxId),
    ("Buyer Name:", LineField::BuyerName),
    ("Item:", LineField::Item),
    ("Subtotal:", LineField::Subtotal),
];

/// Item sub-field prefixes, checked in order.
pub const ITEM_LABELS: &[(&str, ItemField)] = &[
    ("Code", ItemField::Code),
    ("Description", ItemField::Description),
    ("Quantity", ItemField::Quantity),
    ("Unit Price", ItemField::UnitPrice),
];

/// Parser matching literal label prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelParser;

impl InvoiceParser for LabelParser {
    fn parse(&self, text: &str) -> Result<InvoiceRecord> {
        let mut record = InvoiceRecord::default();

        for line in text.split('\n').map(str::trim) {
            let Some((field, value)) = match_label(line, LINE_LABELS) else {
                continue;
            };
            trace!(?field, value, "Matched line");

            match field {
                LineField::InvoiceNumber => record.invoice.invoice_number = Some(value.to_string()),
                LineField::IssueDate => record.invoice.issue_date = Some(value.to_string()),
                LineField::DueDate => record.invoice.due_date = Some(value.to_string()),
                LineField::IssuerTaxId => record.issuer.tax_id = Some(value.to_string()),
                LineField::IssuerName => record.issuer.name = Some(value.to_string()),
                LineField::BuyerTaxId => record.buyer.tax_id = Some(value.to_string()),
                LineField::BuyerName => record.buyer.name = Some(value.to_string()),
                LineField::Item => record.line_items.push(parse_item(value)?),
                LineField::Subtotal => record.subtotal = Some(parse_number("subtotal", value)?),
            }
        }

        debug!(items = record.line_items.len(), "Parsed invoice text");
        Ok(record)
    }
}

fn parse_item(details: &str) -> Result<LineItem> {
    let mut item = LineItem::default();

    for part in details.split(',').map(str::trim) {
        let Some((field, value)) = match_label(part, ITEM_LABELS) else {
            continue;
        };

        match field {
            ItemField::Code => item.code = Some(value.to_string()),
            ItemField::Description => item.description = Some(value.to_string()),
            ItemField::Quantity => item.quantity = Some(parse_number("quantity", value)?),
            ItemField::UnitPrice => item.unit_price = Some(parse_number("unitPrice", value)?),
        }
    }

    Ok(item)
}

/// Find the first label `text` starts with; returns the trimmed remainder.
fn match_label<'a, F: Copy>(text: &'a str, labels: &[(&str, F)]) -> Option<(F, &'a str)> {
    labels
        .iter()
        .find_map(|(label, field)| text.strip_prefix(*label).map(|rest| (*field, rest.trim())))
}

fn parse_number(field: &str, value: &str) -> Result<f64> {
    value.parse::<f64>().map_err(|_| ExtractionError::FieldType {
        field: field.to_string(),
        value: value.to_string(),
    })
}
