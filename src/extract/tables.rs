//! Table extraction
//!
//! Row rules:
//! - A row belongs to its nearest enclosing `<table>`; nested tables are
//!   separate records
//! - Cells are the direct `<td>`/`<th>` children of the row
//! - The first row made only of `<th>` cells is the header row
//! - Rows with no cells are skipped; rows of blank cells are kept
//! - Rows keep the number of cells present in the markup (no padding)

use crate::extract::collapse_whitespace;
use crate::model::TableRecord;
use scraper::{ElementRef, Html, Selector};

/// Extracts one record per `<table>` element, in document order
pub fn extract_tables(document: &Html) -> Vec<TableRecord> {
    let (Ok(table_selector), Ok(row_selector)) = (Selector::parse("table"), Selector::parse("tr"))
    else {
        return Vec::new();
    };

    document
        .select(&table_selector)
        .map(|table| extract_table(table, &row_selector))
        .collect()
}

fn extract_table(table: ElementRef<'_>, row_selector: &Selector) -> TableRecord {
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for row in table.select(row_selector) {
        if !belongs_to(row, table) {
            continue;
        }

        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();

        if cells.is_empty() {
            continue;
        }

        let texts: Vec<String> = cells.iter().map(|cell| cell_text(*cell)).collect();

        let header_row = cells.iter().all(|cell| cell.value().name() == "th");
        if header_row && headers.is_none() {
            headers = Some(texts);
        } else {
            rows.push(texts);
        }
    }

    TableRecord::new(headers.unwrap_or_default(), rows)
}

/// True when `table` is the nearest `<table>` ancestor of `row`
fn belongs_to(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .find(|node| {
            node.value()
                .as_element()
                .map_or(false, |element| element.name() == "table")
        })
        .map_or(false, |nearest| nearest.id() == table.id())
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<String>())
}
