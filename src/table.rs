//! Plain-text rendering of price records for terminal output.

use crate::models::PriceRecord;
use crate::reference::region_display_name;

pub const HEADERS: [&str; 8] = [
    "Product",
    "SKU",
    "Retail Price",
    "Unit of Measure",
    "Region",
    "Meter",
    "RI Term",
    "SavingsPlan",
];

/// Display form of a price: four decimal places.
pub fn format_price(price: f64) -> String {
    format!("{price:.4}")
}

pub fn row(record: &PriceRecord) -> [String; 8] {
    let region = record
        .location
        .clone()
        .unwrap_or_else(|| region_display_name(&record.arm_region_name).to_string());
    let savings_plan = record
        .savings_plan
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|plan| format!("{}: {}", plan.term, format_price(plan.retail_price)))
        .collect::<Vec<_>>()
        .join("; ");

    [
        record.product_name.clone(),
        record.arm_sku_name.clone(),
        format_price(record.retail_price),
        record.unit_of_measure.clone(),
        region,
        record.meter_name.clone(),
        record.reservation_term.clone().unwrap_or_default(),
        savings_plan,
    ]
}

/// Renders records as a left-aligned table with a header rule.
pub fn render(records: &[PriceRecord]) -> String {
    let rows: Vec<[String; 8]> = records.iter().map(row).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in &rows {
        for (width, cell) in widths.iter_mut().zip(r.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&HEADERS));
    out.push('\n');
    out.push_str(&line(&widths.map(|w| "-".repeat(w)).each_ref().map(|s| s.as_str())));
    out.push('\n');
    for r in &rows {
        out.push_str(&line(&r.each_ref().map(|s| s.as_str())));
        out.push('\n');
    }
    out
}
