// tests/financial_scenarios.rs
use chrono::NaiveDate;
use competitor_monitor::aggregate::financial::{derive_financial, BreakEven, FinancialInputs};
use competitor_monitor::ValidationError;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 6).unwrap()
}

fn inputs(json: &str) -> FinancialInputs {
    serde_json::from_str(json).unwrap()
}

#[test]
fn modest_profit_breaks_even_in_fifty_months() {
    let fin = derive_financial(
        Some(&inputs(
            r#"{
                "costs": [
                    { "category": "development", "amount": 15000, "recurring": false },
                    { "category": "operations", "amount": 900, "recurring": true }
                ],
                "revenue": { "subscriptions": 1200 }
            }"#,
        )),
        today(),
    )
    .unwrap();

    assert_eq!(fin.monthly_profit, 300.0);
    assert_eq!(fin.annual_profit_projection, 3600.0);
    assert_eq!(fin.roi_percentage, 24.0);
    assert_eq!(fin.break_even_months, BreakEven::Months(50));
    assert_eq!(fin.payback_date, NaiveDate::from_ymd_opt(2029, 11, 6));
}

#[test]
fn loss_never_breaks_even() {
    let fin = derive_financial(
        Some(&inputs(
            r#"{
                "costs": [
                    { "category": "development", "amount": 15000, "recurring": false },
                    { "category": "operations", "amount": 2000, "recurring": true }
                ],
                "revenue": { "subscriptions": 1000 }
            }"#,
        )),
        today(),
    )
    .unwrap();

    assert_eq!(fin.monthly_profit, -1000.0);
    assert_eq!(fin.annual_profit_projection, -12000.0);
    assert_eq!(fin.roi_percentage, -80.0);
    assert!(!fin.break_even_months.is_reachable());
    assert!(fin.payback_date.is_none());

    let v = serde_json::to_value(&fin).unwrap();
    assert!(v["break_even_months"].is_null());
    assert!(v["payback_date"].is_null());
}

#[test]
fn cent_amounts_do_not_drift() {
    let fin = derive_financial(
        Some(&inputs(
            r#"{
                "costs": [
                    { "category": "setup", "amount": 100.10, "recurring": false },
                    { "category": "setup", "amount": 0.20, "recurring": false },
                    { "category": "hosting", "amount": 0.10, "recurring": true }
                ],
                "revenue": { "a": 0.20, "b": 0.10 }
            }"#,
        )),
        today(),
    )
    .unwrap();

    assert_eq!(fin.one_time_costs, 100.3);
    assert_eq!(fin.monthly_revenue, 0.3);
    assert_eq!(fin.monthly_profit, 0.2);
    // ceil(10030 / 20) cents
    assert_eq!(fin.break_even_months, BreakEven::Months(502));
}

#[test]
fn recurring_only_costs_are_rejected() {
    let err = derive_financial(
        Some(&inputs(
            r#"{
                "costs": [ { "category": "hosting", "amount": 50, "recurring": true } ],
                "revenue": { "subscriptions": 1000 }
            }"#,
        )),
        today(),
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::Malformed { .. }));
    assert_eq!(err.field(), "financial.costs");
}

#[test]
fn runaway_revenue_is_a_validation_error() {
    let err = derive_financial(
        Some(&inputs(
            r#"{
                "costs": [ { "category": "development", "amount": 15000, "recurring": false } ],
                "revenue": { "r0": 1e16 }
            }"#,
        )),
        today(),
    )
    .unwrap_err();
    assert_eq!(err.field(), "financial.revenue.r0");
    assert!(err.to_string().contains("amount out of range"));
}
