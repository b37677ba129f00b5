//! Provides functions for valuing holdings and measuring their performance.
use crate::core::holding::Holding;
use crate::core::price::Metal;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_finprim::rate::cagr;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Aggregated ounces and value of one user's holdings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingSummary {
    pub total_value: Decimal,
    pub gold_value: Decimal,
    pub silver_value: Decimal,
    pub total_gold_oz: Decimal,
    pub total_silver_oz: Decimal,
    pub gold_price: Decimal,
    pub silver_price: Decimal,
    pub total_holdings: usize,
}

/// Share of total value per metal, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub gold: Decimal,
    pub silver: Decimal,
}

/// Value and return of a single holding at the current spot price.
#[derive(Debug, Clone)]
pub struct HoldingPerformance {
    pub id: Uuid,
    pub metal: Metal,
    pub denomination: String,
    pub total_oz: Decimal,
    pub current_value: Decimal,
    pub invested: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_pct: Decimal,
    /// Annualised return in percent, when purchase price and date are known.
    pub annualized_return: Option<Decimal>,
}

pub fn summarize(holdings: &[Holding], gold_price: Decimal, silver_price: Decimal) -> HoldingSummary {
    let total_oz = |metal: Metal| -> Decimal {
        holdings
            .iter()
            .filter(|h| h.metal == metal)
            .map(Holding::total_oz)
            .sum()
    };

    let total_gold_oz = total_oz(Metal::Gold);
    let total_silver_oz = total_oz(Metal::Silver);
    let gold_value = total_gold_oz * gold_price;
    let silver_value = total_silver_oz * silver_price;

    HoldingSummary {
        total_value: gold_value + silver_value,
        gold_value,
        silver_value,
        total_gold_oz,
        total_silver_oz,
        gold_price,
        silver_price,
        total_holdings: holdings.len(),
    }
}

pub fn allocation(summary: &HoldingSummary) -> Allocation {
    let total = summary.gold_value + summary.silver_value;
    if total.is_zero() {
        return Allocation {
            gold: Decimal::ZERO,
            silver: Decimal::ZERO,
        };
    }
    let hundred = Decimal::ONE_HUNDRED;
    Allocation {
        gold: summary.gold_value / total * hundred,
        silver: summary.silver_value / total * hundred,
    }
}

pub fn performance(holding: &Holding, price: Decimal, today: NaiveDate) -> HoldingPerformance {
    let total_oz = holding.total_oz();
    let current_value = total_oz * price;
    let invested = holding
        .purchase_price
        .map_or(Decimal::ZERO, |p| p * Decimal::from(holding.quantity));
    let profit_loss = current_value - invested;
    let profit_loss_pct = if invested > Decimal::ZERO {
        profit_loss / invested * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let annualized_return = holding
        .purchase_date
        .and_then(|date| annualized_return(invested, current_value, date, today));

    HoldingPerformance {
        id: holding.id,
        metal: holding.metal,
        denomination: holding.denomination.clone(),
        total_oz,
        current_value,
        invested,
        profit_loss,
        profit_loss_pct,
        annualized_return,
    }
}

fn annualized_return(
    invested: Decimal,
    current_value: Decimal,
    purchased: NaiveDate,
    today: NaiveDate,
) -> Option<Decimal> {
    let days_held = (today - purchased).num_days();
    if days_held < 1 || invested <= Decimal::ZERO || current_value <= Decimal::ZERO {
        return None;
    }

    let n_years = Decimal::from(days_held) / Decimal::from(365);
    let rate = cagr(invested, current_value, n_years);
    debug!("cagr: {invested}, {current_value}, {n_years} = {rate}");
    Some(rate * Decimal::from(100))
}

/// Rounds to two decimals, halves away from zero. `{:.2}` on a `Decimal`
/// truncates, so values are rounded with this before display.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount as `CUR 1,234.56`.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let amount = round2(amount);
    let rounded = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{currency} {grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::holding::{FormType, NewHolding};
    use chrono::Utc;

    fn holding(metal: Metal, weight: &str, quantity: u32, price: Option<i64>) -> Holding {
        NewHolding {
            metal,
            weight_oz: weight.parse().unwrap(),
            form: FormType::Coin,
            denomination: format!("{weight}oz"),
            quantity,
            purchase_price: price.map(Decimal::from),
            purchase_date: None,
            notes: None,
        }
        .into_holding("alice", Utc::now())
        .unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_summarize_totals() {
        let holdings = vec![
            holding(Metal::Gold, "1", 2, None),
            holding(Metal::Gold, "0.5", 1, None),
            holding(Metal::Silver, "10", 3, None),
        ];

        let summary = summarize(&holdings, Decimal::from(3000), Decimal::from(40));

        assert_eq!(summary.total_gold_oz, "2.5".parse::<Decimal>().unwrap());
        assert_eq!(summary.total_silver_oz, Decimal::from(30));
        assert_eq!(summary.gold_value, Decimal::from(7500));
        assert_eq!(summary.silver_value, Decimal::from(1200));
        assert_eq!(summary.total_value, Decimal::from(8700));
        assert_eq!(summary.total_holdings, 3);
    }

    #[test]
    fn test_allocation() {
        let holdings = vec![
            holding(Metal::Gold, "1", 1, None),
            holding(Metal::Silver, "25", 1, None),
        ];
        let summary = summarize(&holdings, Decimal::from(3000), Decimal::from(40));
        let alloc = allocation(&summary);
        assert_eq!(alloc.gold, Decimal::from(75));
        assert_eq!(alloc.silver, Decimal::from(25));

        let empty = summarize(&[], Decimal::from(3000), Decimal::from(40));
        let alloc = allocation(&empty);
        assert_eq!(alloc.gold, Decimal::ZERO);
        assert_eq!(alloc.silver, Decimal::ZERO);
    }

    #[test]
    fn test_performance_profit_and_loss() {
        let h = holding(Metal::Silver, "1", 10, Some(40));
        let perf = performance(&h, Decimal::from(50), day("2024-06-01"));

        assert_eq!(perf.current_value, Decimal::from(500));
        assert_eq!(perf.invested, Decimal::from(400));
        assert_eq!(perf.profit_loss, Decimal::from(100));
        assert_eq!(perf.profit_loss_pct, Decimal::from(25));
        assert!(perf.annualized_return.is_none());

        let unknown_cost = holding(Metal::Gold, "1", 1, None);
        let perf = performance(&unknown_cost, Decimal::from(3000), day("2024-06-01"));
        assert_eq!(perf.invested, Decimal::ZERO);
        assert_eq!(perf.profit_loss_pct, Decimal::ZERO);
    }

    #[test]
    fn test_annualized_return() {
        let mut h = holding(Metal::Gold, "1", 1, Some(2000));
        h.purchase_date = Some(day("2022-06-01"));

        // Doubled over two years (730 days): roughly 41.42% a year.
        let perf = performance(&h, Decimal::from(4000), day("2024-05-31"));
        let annualized = perf.annualized_return.unwrap();
        assert!(
            (annualized - "41.42".parse::<Decimal>().unwrap()).abs() < Decimal::ONE,
            "{annualized}"
        );

        // Bought today: too short to annualise.
        h.purchase_date = Some(day("2024-05-31"));
        let perf = performance(&h, Decimal::from(4000), day("2024-05-31"));
        assert!(perf.annualized_return.is_none());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::from(1234567), "AUD"), "AUD 1,234,567.00");
        assert_eq!(format_money("48.1".parse().unwrap(), "AUD"), "AUD 48.10");
        assert_eq!(format_money("-999.999".parse().unwrap(), "USD"), "-USD 1,000.00");
        assert_eq!(format_money(Decimal::ZERO, "AUD"), "AUD 0.00");
        assert_eq!(format_money("3612.455".parse().unwrap(), "AUD"), "AUD 3,612.46");
        assert_eq!(format_money("48.104".parse().unwrap(), "AUD"), "AUD 48.10");
        assert_eq!(format_money("-0.004".parse().unwrap(), "AUD"), "AUD 0.00");
    }

    #[test]
    fn test_round2_rounds_half_away_from_zero() {
        assert_eq!(format!("{:.2}", round2("66.666".parse().unwrap())), "66.67");
        assert_eq!(format!("{:.2}", round2("-12.345".parse().unwrap())), "-12.35");
        assert_eq!(format!("{:.2}", round2("2.5".parse().unwrap())), "2.50");
    }
}
