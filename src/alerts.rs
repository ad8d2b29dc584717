//! Alert texts sent to Telegram (HTML parse mode).

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{ProductRow, StockStatus, percent_difference};
use crate::utils::text::{escape_html, format_amount};

/// Out-of-stock products are only reported once a run finds this many.
pub const OUT_OF_STOCK_SUMMARY_THRESHOLD: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfStockEntry {
    pub identifier: String,
    pub name: String,
    pub category: String,
}

impl From<&ProductRow> for OutOfStockEntry {
    fn from(row: &ProductRow) -> Self {
        Self {
            identifier: row.identifier.clone(),
            name: row.display_name().to_string(),
            category: row.category.clone(),
        }
    }
}

/// One category's part of the out-of-stock summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySection {
    pub category: String,
    pub products: usize,
    pub body: String,
}

/// The batched out-of-stock report for a run, kept as per-category sections
/// so each recipient can be sent only the categories it follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfStockSummary {
    sections: Vec<SummarySection>,
}

impl OutOfStockSummary {
    pub fn sections(&self) -> &[SummarySection] {
        &self.sections
    }

    pub fn categories(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.category.clone()).collect()
    }

    /// Message with only the sections for `subscribed`, or `None` when the
    /// recipient follows none of the categories involved.
    pub fn message_for(&self, subscribed: &[String]) -> Option<String> {
        let sections: Vec<&SummarySection> = self
            .sections
            .iter()
            .filter(|s| subscribed.iter().any(|c| c.trim() == s.category))
            .collect();
        if sections.is_empty() {
            return None;
        }
        Some(render_summary(&sections))
    }

    /// Every section, as seen by a recipient subscribed to all categories.
    pub fn full_message(&self) -> String {
        render_summary(&self.sections.iter().collect::<Vec<_>>())
    }
}

fn render_summary(sections: &[&SummarySection]) -> String {
    let products: usize = sections.iter().map(|s| s.products).sum();
    let mut message = format!(
        "⚠️ <b>Out-of-Stock Alert</b> ⚠️\n\n<b>{} products are out of stock.</b>\n",
        products
    );
    for section in sections {
        message.push_str(&section.body);
    }
    message
}

pub fn price_divergence_message(
    row: &ProductRow,
    price_a: Decimal,
    price_b: Decimal,
    currency_label: &str,
) -> String {
    let difference = percent_difference(price_a, price_b)
        .map(|pct| {
            let sign = if pct.is_sign_negative() { "" } else { "+" };
            format!("{}{:.2}%", sign, pct)
        })
        .unwrap_or_else(|| "n/a".to_string());
    let currency = escape_html(currency_label);

    format!(
        "🔔 <b>Price Difference Alert - {category}</b> 🔔\n\n\
         📝 <b>Product Name:</b>\n{name}\n\
         🆔 <b>Product ID:</b> {id}\n\n\
         <b>ShopA Price:</b> {price_a} {currency}\n\
         <b>ShopB Price:</b> {price_b} {currency}\n\
         <b>Price Difference:</b> {difference}\n\n\
         <b>Status:</b> {stock}\n",
        category = escape_html(&row.category),
        name = escape_html(row.display_name()),
        id = escape_html(&row.identifier),
        price_a = format_amount(price_a),
        price_b = format_amount(price_b),
        stock = stock_label(row.stock_a),
    )
}

fn stock_label(stock: StockStatus) -> String {
    match stock {
        StockStatus::InStock => "✅ In Stock".to_string(),
        StockStatus::OutOfStock => "❌ Out of Stock".to_string(),
        StockStatus::Unknown => "❔ Unknown".to_string(),
    }
}

/// Builds the summary, or `None` while fewer than
/// [`OUT_OF_STOCK_SUMMARY_THRESHOLD`] products are out of stock.
pub fn out_of_stock_summary(entries: &[OutOfStockEntry]) -> Option<OutOfStockSummary> {
    if entries.len() < OUT_OF_STOCK_SUMMARY_THRESHOLD {
        return None;
    }

    let mut by_category: BTreeMap<&str, Vec<&OutOfStockEntry>> = BTreeMap::new();
    for entry in entries {
        by_category.entry(entry.category.trim()).or_default().push(entry);
    }

    let sections = by_category
        .into_iter()
        .map(|(category, products)| {
            let mut body = format!("\n<b>{} ({}):</b>\n", escape_html(category), products.len());
            for (i, product) in products.iter().enumerate() {
                body.push_str(&format!(
                    "{}. {} (ID: {})\n",
                    i + 1,
                    escape_html(&product.name),
                    escape_html(&product.identifier)
                ));
            }
            SummarySection {
                category: category.to_string(),
                products: products.len(),
                body,
            }
        })
        .collect();

    Some(OutOfStockSummary { sections })
}
