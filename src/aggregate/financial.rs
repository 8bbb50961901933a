//! # Financial projection
//!
//! Profitability of the monitored product line:
//! - `monthly_revenue` = sum of revenue categories
//! - `monthly_costs` = sum of recurring cost entries
//! - `monthly_profit` = revenue - recurring costs
//! - `roi_percentage` = annual profit / one-time costs * 100 (signed)
//! - `break_even_months` = ceil(one-time costs / monthly profit), only when
//!   profit is positive; otherwise [`BreakEven::Unreachable`]
//!
//! Sums run on whole cents so break-even is exact. Single amounts above
//! [`MAX_AMOUNT`] and sums that leave `i64` are malformed input.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use super::require;
use super::rounding::{from_cents, percent, to_cents, MAX_AMOUNT};
use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEntryInput {
    pub category: Option<String>,
    pub amount: Option<f64>,
    /// `false` for one-time outlays such as initial development.
    pub recurring: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputs {
    pub costs: Option<Vec<CostEntryInput>>,
    /// Monthly revenue per category.
    pub revenue: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub category: String,
    pub amount: f64,
    pub recurring: bool,
}

/// Months until cumulative profit covers the one-time costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakEven {
    Months(u64),
    /// Monthly profit is zero or negative.
    Unreachable,
}

impl BreakEven {
    pub fn months(&self) -> Option<u64> {
        match self {
            Self::Months(m) => Some(*m),
            Self::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Months(_))
    }
}

/// Serialized as a number, or `null` when unreachable.
impl Serialize for BreakEven {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Months(m) => s.serialize_u64(*m),
            Self::Unreachable => s.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialMetrics {
    pub costs: Vec<CostEntry>,
    pub revenue: BTreeMap<String, f64>,
    pub monthly_revenue: f64,
    pub monthly_costs: f64,
    pub one_time_costs: f64,
    pub monthly_profit: f64,
    pub annual_profit_projection: f64,
    pub roi_percentage: f64,
    pub break_even_months: BreakEven,
    pub payback_date: Option<NaiveDate>,
}

pub fn derive_financial(
    inputs: Option<&FinancialInputs>,
    today: NaiveDate,
) -> Result<FinancialMetrics, ValidationError> {
    let inputs = require(inputs, "financial")?;
    let raw_costs = require(inputs.costs.as_ref(), "financial.costs")?;
    let revenue = require(inputs.revenue.as_ref(), "financial.revenue")?;
    if raw_costs.is_empty() {
        return Err(ValidationError::missing("financial.costs"));
    }
    if revenue.is_empty() {
        return Err(ValidationError::missing("financial.revenue"));
    }

    let mut costs = Vec::with_capacity(raw_costs.len());
    let (mut recurring_cents, mut one_time_cents) = (0i64, 0i64);
    for (i, c) in raw_costs.iter().enumerate() {
        let field = |f: &str| format!("financial.costs[{i}].{f}");
        let category = require(c.category.as_ref(), &field("category"))?;
        let amount = *require(c.amount.as_ref(), &field("amount"))?;
        let recurring = *require(c.recurring.as_ref(), &field("recurring"))?;
        let cents = cents_of(amount, &field("amount"))?;
        let total = if recurring {
            &mut recurring_cents
        } else {
            &mut one_time_cents
        };
        *total = total
            .checked_add(cents)
            .ok_or_else(|| out_of_range("financial.costs"))?;
        costs.push(CostEntry {
            category: category.clone(),
            amount: from_cents(cents),
            recurring,
        });
    }

    let mut revenue_cents = 0i64;
    let mut rounded_revenue = BTreeMap::new();
    for (category, amount) in revenue {
        let cents = cents_of(*amount, &format!("financial.revenue.{category}"))?;
        revenue_cents = revenue_cents
            .checked_add(cents)
            .ok_or_else(|| out_of_range("financial.revenue"))?;
        rounded_revenue.insert(category.clone(), from_cents(cents));
    }

    if one_time_cents <= 0 {
        return Err(ValidationError::malformed(
            "financial.costs",
            "no positive one-time cost to measure return against",
        ));
    }

    let profit_cents = revenue_cents
        .checked_sub(recurring_cents)
        .ok_or_else(|| out_of_range("financial"))?;
    let annual_cents = profit_cents
        .checked_mul(12)
        .ok_or_else(|| out_of_range("financial"))?;
    let roi = annual_cents as f64 / one_time_cents as f64 * 100.0;

    let break_even = if profit_cents > 0 {
        // ceil(a / b) for a, b > 0
        let months = (one_time_cents - 1) / profit_cents + 1;
        BreakEven::Months(months as u64)
    } else {
        BreakEven::Unreachable
    };
    let payback_date = break_even
        .months()
        .and_then(|m| u32::try_from(m).ok())
        .and_then(|m| today.checked_add_months(Months::new(m)));

    Ok(FinancialMetrics {
        costs,
        revenue: rounded_revenue,
        monthly_revenue: from_cents(revenue_cents),
        monthly_costs: from_cents(recurring_cents),
        one_time_costs: from_cents(one_time_cents),
        monthly_profit: from_cents(profit_cents),
        annual_profit_projection: from_cents(annual_cents),
        roi_percentage: percent(roi),
        break_even_months: break_even,
        payback_date,
    })
}

/// Validated, non-negative amount in cents.
fn cents_of(amount: f64, field: &str) -> Result<i64, ValidationError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::malformed(
            field,
            format!("{amount} is negative or not finite"),
        ));
    }
    to_cents(amount).ok_or_else(|| {
        ValidationError::malformed(field, format!("amount out of range (max {MAX_AMOUNT})"))
    })
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::malformed(field, "amount out of range")
}
