use super::ui;
use crate::core::price::{Metal, PriceCacheEntry, PriceHistoryPoint, SpotPrices};
use crate::core::pricing::{HistoryQuery, PriceCacheManager};
use anyhow::Result;
use comfy_table::Cell;

pub fn prices_table(prices: &SpotPrices, currency: &str, unit: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Metal"),
        ui::header_cell(&format!("Price ({currency}/{unit})")),
        ui::header_cell("As of (UTC)"),
    ]);

    for metal in Metal::ALL {
        let quote = prices.quote(metal);
        table.add_row(vec![
            Cell::new(metal.to_string()),
            ui::money_cell(quote.price, currency),
            Cell::new(quote.observed_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    format!(
        "{}\n\n{}\n{}",
        ui::style_text("Spot Prices", ui::StyleType::Title),
        table,
        ui::source_note(prices.source)
    )
}

pub fn cached_table(entries: &[PriceCacheEntry], currency: &str, unit: &str) -> String {
    let title = ui::style_text("Cached Spot Prices", ui::StyleType::Title);
    if entries.is_empty() {
        return format!(
            "{title}\n\n{}",
            ui::style_text("Nothing cached yet", ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Metal"),
        ui::header_cell(&format!("Price ({currency}/{unit})")),
        ui::header_cell("Updated (UTC)"),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.metal),
            ui::money_cell(entry.price, currency),
            Cell::new(entry.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    format!("{title}\n\n{table}")
}

pub fn history_table(metal: Metal, points: &[PriceHistoryPoint], currency: &str) -> String {
    let title = ui::style_text(&format!("{metal} Price History"), ui::StyleType::Title);
    if points.is_empty() {
        return format!(
            "{title}\n\n{}",
            ui::style_text("No price history recorded yet", ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&format!("Price ({currency})")),
    ]);
    for point in points {
        table.add_row(vec![
            Cell::new(point.date.to_string()),
            ui::money_cell(point.price, currency),
        ]);
    }

    format!("{title}\n\n{table}")
}

pub async fn run(manager: &PriceCacheManager, currency: &str, unit: &str) -> Result<()> {
    let prices = manager.get_detailed_prices().await;
    println!("{}", prices_table(&prices, currency, unit));
    Ok(())
}

/// Shows the cache as stored, without refreshing it.
pub async fn run_cached(manager: &PriceCacheManager, currency: &str, unit: &str) -> Result<()> {
    let entries = manager.current_prices().await;
    println!("{}", cached_table(&entries, currency, unit));
    Ok(())
}

pub async fn run_history(
    manager: &PriceCacheManager,
    query: HistoryQuery,
    currency: &str,
) -> Result<()> {
    let points = manager.get_price_history(query).await?;
    let metal = query.metal.unwrap_or(Metal::Gold);
    println!("{}", history_table(metal, &points, currency));
    Ok(())
}
