//! Spreadsheet-backed row store.
//!
//! The sheet has one header row; every following row is a product. Columns
//! are located by exact header name, so their order in the sheet is free.

use async_trait::async_trait;
use regex::Regex;

use crate::config::ColumnNames;
use crate::models::{ProductRow, StockStatus};
use crate::utils::error::{AppError, Result};
use crate::utils::text::parse_price_cell;

pub mod auth;
pub mod sheets;

pub use sheets::SheetsClient;

/// First sheet row holding product data; row 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

#[async_trait]
pub trait RowStore: Send {
    /// All product rows in sheet order.
    async fn fetch_all_rows(&mut self) -> Result<Vec<ProductRow>>;

    /// Writes the known mutable fields of `rows` in one call and returns the
    /// number of cells written.
    async fn batch_update(&mut self, rows: &[ProductRow]) -> Result<usize>;
}

/// Extracts the id from `https://docs.google.com/spreadsheets/d/<id>/edit`.
pub fn spreadsheet_id_from_url(url: &str) -> Option<String> {
    let pattern = Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").ok()?;
    pattern
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Column letters for a 0-based index: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 reference for one cell, e.g. `'Sheet2'!F5`.
pub fn a1_cell(worksheet: &str, row: usize, column: usize) -> String {
    format!(
        "'{}'!{}{}",
        worksheet.replace('\'', "''"),
        column_letters(column),
        row
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub range: String,
    pub value: String,
}

/// 0-based positions of the product columns within a sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    identifier: usize,
    title: Option<usize>,
    name: Option<usize>,
    category: usize,
    price_a: usize,
    stock_a: usize,
    link_b: usize,
    price_b: usize,
}

impl ColumnMap {
    pub fn from_header(header: &[String], names: &ColumnNames) -> Result<Self> {
        let find = |name: &str| header.iter().position(|cell| cell.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| AppError::Schema {
                column: name.to_string(),
            })
        };

        Ok(Self {
            identifier: require(&names.identifier)?,
            title: find(&names.title),
            name: find(&names.name),
            category: require(&names.category)?,
            price_a: require(&names.price_a)?,
            stock_a: require(&names.stock_a)?,
            link_b: require(&names.link_b)?,
            price_b: require(&names.price_b)?,
        })
    }

    pub fn parse_row(&self, position: usize, cells: &[String]) -> ProductRow {
        // The values API drops trailing empty cells, so rows can be short.
        let cell = |index: usize| cells.get(index).map(|c| c.trim()).unwrap_or_default();
        let optional = |index: Option<usize>| index.map(cell).unwrap_or_default().to_string();

        ProductRow {
            position,
            identifier: cell(self.identifier).to_string(),
            title: optional(self.title),
            name: optional(self.name),
            category: cell(self.category).to_string(),
            price_a: parse_price_cell(cell(self.price_a)),
            stock_a: StockStatus::from_cell(cell(self.stock_a)),
            link_b: cell(self.link_b).to_string(),
            price_b: parse_price_cell(cell(self.price_b)),
        }
    }

    /// Cells to write for one row. Unknown values are skipped so a failed
    /// scrape never blanks what the sheet already holds.
    pub fn cell_updates(&self, worksheet: &str, row: &ProductRow) -> Vec<CellUpdate> {
        let mut updates = Vec::with_capacity(3);
        let mut push = |column: usize, value: String| {
            updates.push(CellUpdate {
                range: a1_cell(worksheet, row.position, column),
                value,
            });
        };

        if let Some(price) = row.price_b {
            push(self.price_b, price.normalize().to_string());
        }
        if let Some(price) = row.price_a {
            push(self.price_a, price.normalize().to_string());
        }
        if let Some(stock) = row.stock_a.to_cell() {
            push(self.stock_a, stock.to_string());
        }

        updates
    }
}

/// Turns a raw value grid (header first) into product rows.
pub fn rows_from_grid(grid: &[Vec<String>], names: &ColumnNames) -> Result<(ColumnMap, Vec<ProductRow>)> {
    let Some((header, body)) = grid.split_first() else {
        return Err(AppError::Store("worksheet is empty".to_string()));
    };
    let columns = ColumnMap::from_header(header, names)?;
    let rows = body
        .iter()
        .enumerate()
        .map(|(offset, cells)| columns.parse_row(FIRST_DATA_ROW + offset, cells))
        .collect();
    Ok((columns, rows))
}
