use super::ui;
use crate::core::analytics;
use crate::core::holding::{Holding, HoldingUpdate, NewHolding};
use crate::core::identity::UserId;
use crate::core::price::Metal;
use crate::store::holdings::HoldingsStore;
use anyhow::{Result, bail};
use comfy_table::Cell;
use uuid::Uuid;

pub fn holdings_table(holdings: &[Holding], currency: &str) -> String {
    let title = ui::style_text("Holdings", ui::StyleType::Title);
    if holdings.is_empty() {
        return format!(
            "{title}\n\n{}",
            ui::style_text("No holdings yet", ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Metal"),
        ui::header_cell("Form"),
        ui::header_cell("Denomination"),
        ui::header_cell("Weight (oz)"),
        ui::header_cell("Qty"),
        ui::header_cell("Total (oz)"),
        ui::header_cell(&format!("Paid/unit ({currency})")),
        ui::header_cell("Purchased"),
    ]);

    for holding in holdings {
        table.add_row(vec![
            Cell::new(holding.id),
            Cell::new(holding.metal),
            Cell::new(holding.form),
            Cell::new(&holding.denomination),
            ui::decimal_cell(holding.weight_oz, 4),
            Cell::new(holding.quantity),
            ui::decimal_cell(holding.total_oz(), 4),
            ui::format_optional_cell(holding.purchase_price, |p| {
                format!("{:.2}", analytics::round2(p))
            }),
            ui::format_optional_cell(holding.purchase_date, |d| d.to_string()),
        ]);
    }

    format!("{title}\n\n{table}")
}

pub async fn list(
    store: &HoldingsStore,
    owner: &UserId,
    metal: Option<Metal>,
    currency: &str,
) -> Result<()> {
    let holdings = match metal {
        Some(metal) => store.list_by_metal(owner, metal).await?,
        None => store.list(owner).await?,
    };
    println!("{}", holdings_table(&holdings, currency));
    Ok(())
}

pub async fn add(store: &HoldingsStore, owner: &UserId, new: NewHolding) -> Result<()> {
    let holding = store.create(owner, new).await?;
    println!(
        "Added {} {} ({} oz) as {}",
        holding.metal,
        holding.denomination,
        holding.total_oz(),
        holding.id
    );
    Ok(())
}

pub async fn update(
    store: &HoldingsStore,
    owner: &UserId,
    id: &Uuid,
    update: HoldingUpdate,
) -> Result<()> {
    let holding = store.update(owner, id, update).await?;
    println!("Updated {}", holding.id);
    Ok(())
}

pub async fn remove(store: &HoldingsStore, owner: &UserId, id: &Uuid) -> Result<()> {
    if !store.delete(owner, id).await? {
        bail!("Holding {id} not found");
    }
    println!("Removed {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::holding::FormType;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn test_holdings_table() {
        let holding = NewHolding {
            metal: Metal::Silver,
            weight_oz: Decimal::ONE,
            form: FormType::Coin,
            denomination: "Kookaburra".to_string(),
            quantity: 20,
            purchase_price: Some("45.5".parse().unwrap()),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            notes: None,
        }
        .into_holding("alice", Utc::now())
        .unwrap();

        let output = holdings_table(std::slice::from_ref(&holding), "AUD");
        assert!(output.contains(&holding.id.to_string()));
        assert!(output.contains("Kookaburra"));
        assert!(output.contains("Coin"));
        assert!(output.contains("45.50"));
        assert!(output.contains("2024-01-15"));

        assert!(holdings_table(&[], "AUD").contains("No holdings yet"));
    }
}
