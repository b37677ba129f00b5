use super::ui;
use crate::core::analytics::{self, HoldingPerformance, HoldingSummary};
use crate::core::holding::Holding;
use crate::core::identity::UserId;
use crate::core::price::{Metal, SpotPrices};
use crate::core::pricing::PriceCacheManager;
use crate::store::holdings::HoldingsStore;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use comfy_table::{Cell, CellAlignment};
use rust_decimal::Decimal;

impl HoldingSummary {
    pub fn display_as_table(&self, currency: &str) -> String {
        let allocation = analytics::allocation(self);

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Metal"),
            ui::header_cell("Ounces"),
            ui::header_cell(&format!("Spot ({currency})")),
            ui::header_cell(&format!("Value ({currency})")),
            ui::header_cell("Allocation (%)"),
        ]);

        let rows = [
            (
                Metal::Gold,
                self.total_gold_oz,
                self.gold_price,
                self.gold_value,
                allocation.gold,
            ),
            (
                Metal::Silver,
                self.total_silver_oz,
                self.silver_price,
                self.silver_value,
                allocation.silver,
            ),
        ];
        for (metal, oz, price, value, weight) in rows {
            table.add_row(vec![
                Cell::new(metal),
                ui::decimal_cell(oz, 2),
                ui::money_cell(price, currency),
                ui::money_cell(value, currency),
                Cell::new(format!("{:.2}%", analytics::round2(weight)))
                    .set_alignment(CellAlignment::Right),
            ]);
        }

        let mut output = format!(
            "{} ({} holdings)\n\n",
            ui::style_text("Portfolio Summary", ui::StyleType::Title),
            self.total_holdings
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Total Value", ui::StyleType::TotalLabel),
            ui::style_text(
                &analytics::format_money(self.total_value, currency),
                ui::StyleType::TotalValue
            )
        ));
        output
    }
}

pub fn performance_table(rows: &[HoldingPerformance], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Holding"),
        ui::header_cell("Metal"),
        ui::header_cell("Ounces"),
        ui::header_cell(&format!("Invested ({currency})")),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell(&format!("P/L ({currency})")),
        ui::header_cell("P/L (%)"),
        ui::header_cell("Annualized (%)"),
    ]);

    for row in rows {
        let invested = (row.invested > Decimal::ZERO).then_some(row.invested);
        table.add_row(vec![
            Cell::new(&row.denomination),
            Cell::new(row.metal),
            ui::decimal_cell(row.total_oz, 2),
            ui::format_optional_cell(invested, |v| analytics::format_money(v, currency)),
            ui::money_cell(row.current_value, currency),
            match invested {
                Some(_) => ui::money_cell(row.profit_loss, currency),
                None => ui::na_cell(),
            },
            match invested {
                Some(_) => ui::change_cell(row.profit_loss_pct),
                None => ui::na_cell(),
            },
            row.annualized_return.map_or_else(ui::na_cell, ui::change_cell),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Performance", ui::StyleType::Title),
        table
    )
}

fn performance_rows(
    holdings: &[Holding],
    prices: &SpotPrices,
    today: NaiveDate,
) -> Vec<HoldingPerformance> {
    holdings
        .iter()
        .map(|h| analytics::performance(h, prices.quote(h.metal).price, today))
        .collect()
}

/// Loads prices and holdings together.
async fn load(
    manager: &PriceCacheManager,
    store: &HoldingsStore,
    owner: &UserId,
) -> Result<(SpotPrices, Vec<Holding>)> {
    let (prices, holdings) = futures::join!(manager.get_detailed_prices(), store.list(owner));
    Ok((prices, holdings?))
}

pub async fn run(
    manager: &PriceCacheManager,
    store: &HoldingsStore,
    owner: &UserId,
    currency: &str,
) -> Result<()> {
    let (prices, holdings) = load(manager, store, owner).await?;
    let summary = analytics::summarize(&holdings, prices.gold.price, prices.silver.price);

    println!("{}", summary.display_as_table(currency));
    println!("{}", ui::source_note(prices.source));
    Ok(())
}

pub async fn run_analytics(
    manager: &PriceCacheManager,
    store: &HoldingsStore,
    owner: &UserId,
    currency: &str,
) -> Result<()> {
    let (prices, holdings) = load(manager, store, owner).await?;
    let summary = analytics::summarize(&holdings, prices.gold.price, prices.silver.price);

    println!("{}", summary.display_as_table(currency));
    if !holdings.is_empty() {
        ui::print_separator();
        let rows = performance_rows(&holdings, &prices, Utc::now().date_naive());
        println!("{}", performance_table(&rows, currency));
    }
    println!("{}", ui::source_note(prices.source));
    Ok(())
}
