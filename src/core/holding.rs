use crate::core::price::Metal;
use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Bar,
    Coin,
}

impl Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormType::Bar => write!(f, "Bar"),
            FormType::Coin => write!(f, "Coin"),
        }
    }
}

impl FromStr for FormType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(FormType::Bar),
            "coin" => Ok(FormType::Coin),
            _ => Err(anyhow::anyhow!("Invalid form type: {}", s)),
        }
    }
}

/// A user-owned lot of bullion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: Uuid,
    pub owner: String,
    pub metal: Metal,
    /// Troy ounces per unit.
    pub weight_oz: Decimal,
    pub form: FormType,
    pub denomination: String,
    pub quantity: u32,
    /// Price paid per unit.
    pub purchase_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn total_oz(&self) -> Decimal {
        self.weight_oz * Decimal::from(self.quantity)
    }

    fn validate(&self) -> Result<()> {
        validate_fields(self.weight_oz, self.quantity, self.purchase_price)
    }
}

#[derive(Debug, Clone)]
pub struct NewHolding {
    pub metal: Metal,
    pub weight_oz: Decimal,
    pub form: FormType,
    pub denomination: String,
    pub quantity: u32,
    pub purchase_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewHolding {
    pub fn into_holding(self, owner: &str, now: DateTime<Utc>) -> Result<Holding> {
        let holding = Holding {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            metal: self.metal,
            weight_oz: self.weight_oz,
            form: self.form,
            denomination: self.denomination,
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            purchase_date: self.purchase_date,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        };
        holding.validate()?;
        Ok(holding)
    }
}

/// Partial update of a holding; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct HoldingUpdate {
    pub metal: Option<Metal>,
    pub weight_oz: Option<Decimal>,
    pub form: Option<FormType>,
    pub denomination: Option<String>,
    pub quantity: Option<u32>,
    pub purchase_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl HoldingUpdate {
    pub fn apply(self, holding: &Holding, now: DateTime<Utc>) -> Result<Holding> {
        let updated = Holding {
            id: holding.id,
            owner: holding.owner.clone(),
            metal: self.metal.unwrap_or(holding.metal),
            weight_oz: self.weight_oz.unwrap_or(holding.weight_oz),
            form: self.form.unwrap_or(holding.form),
            denomination: self
                .denomination
                .unwrap_or_else(|| holding.denomination.clone()),
            quantity: self.quantity.unwrap_or(holding.quantity),
            purchase_price: self.purchase_price.or(holding.purchase_price),
            purchase_date: self.purchase_date.or(holding.purchase_date),
            notes: self.notes.or_else(|| holding.notes.clone()),
            created_at: holding.created_at,
            updated_at: now,
        };
        updated.validate()?;
        Ok(updated)
    }
}

fn validate_fields(weight_oz: Decimal, quantity: u32, purchase_price: Option<Decimal>) -> Result<()> {
    if weight_oz <= Decimal::ZERO {
        bail!("Weight must be positive, got {weight_oz}");
    }
    if quantity == 0 {
        bail!("Quantity must be at least 1");
    }
    if let Some(price) = purchase_price
        && price <= Decimal::ZERO
    {
        bail!("Purchase price must be positive, got {price}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_holding() -> NewHolding {
        NewHolding {
            metal: Metal::Gold,
            weight_oz: Decimal::ONE,
            form: FormType::Coin,
            denomination: "1oz Kangaroo".to_string(),
            quantity: 2,
            purchase_price: Some(Decimal::from(2800)),
            purchase_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_new_holding_validation() {
        let now = Utc::now();
        let holding = new_holding().into_holding("alice", now).unwrap();
        assert_eq!(holding.owner, "alice");
        assert_eq!(holding.total_oz(), Decimal::from(2));

        let mut zero_weight = new_holding();
        zero_weight.weight_oz = Decimal::ZERO;
        assert!(zero_weight.into_holding("alice", now).is_err());

        let mut zero_quantity = new_holding();
        zero_quantity.quantity = 0;
        let err = zero_quantity.into_holding("alice", now).unwrap_err();
        assert!(err.to_string().contains("Quantity"));

        let mut negative_price = new_holding();
        negative_price.purchase_price = Some(Decimal::from(-1));
        assert!(negative_price.into_holding("alice", now).is_err());
    }

    #[test]
    fn test_update_keeps_unspecified_fields() {
        let created = Utc::now();
        let holding = new_holding().into_holding("alice", created).unwrap();

        let later = created + chrono::Duration::minutes(5);
        let updated = HoldingUpdate {
            quantity: Some(5),
            notes: Some("safe deposit box".to_string()),
            ..Default::default()
        }
        .apply(&holding, later)
        .unwrap();

        assert_eq!(updated.id, holding.id);
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.denomination, "1oz Kangaroo");
        assert_eq!(updated.notes.as_deref(), Some("safe deposit box"));
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, later);

        let invalid = HoldingUpdate {
            weight_oz: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(invalid.apply(&holding, later).is_err());
    }
}
