use chrono::NaiveDate;
use serde_json::Value;

use crate::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// Numeric leaves equal within a relative tolerance, everything else exact.
fn assert_json_close(left: &Value, right: &Value) {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap(), b.as_f64().unwrap());
            let scale = a.abs().max(b.abs()).max(1.0);
            assert!((a - b).abs() / scale <= 1e-9, "{a} != {b}");
        }
        (Value::Array(a), Value::Array(b)) => {
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b) {
                assert_json_close(x, y);
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            assert_eq!(a.len(), b.len());
            for (key, x) in a {
                assert_json_close(x, &b[key]);
            }
        }
        _ => assert_eq!(left, right),
    }
}

fn assert_round_trip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let first = serde_json::to_value(value).unwrap();
    let parsed: T = serde_json::from_value(first.clone()).unwrap();
    let second = serde_json::to_value(&parsed).unwrap();
    assert_json_close(&first, &second);
}

fn inheritance(value: f64, relationship: Relationship) -> TransferTaxInput {
    TransferTaxInput {
        gross_value: value,
        relationship,
        other_assets: 0.0,
        prior_gifts_within_window: 0.0,
        owner_occupied_residence: false,
        transferred_share_percent: None,
        usufruct: None,
    }
}

fn capital_gains(purchase: f64, sale: f64, bought: NaiveDate, sold: NaiveDate) -> CapitalGainsInput {
    CapitalGainsInput {
        purchase_price: purchase,
        sale_price: sale,
        purchase_date: bought,
        sale_date: sold,
        deductible_costs: 0.0,
        personal_tax_rate_percent: 42.0,
        church_tax_rate_percent: 8.0,
    }
}

// ---- Scenarios ----

#[test]
fn test_scenario_urban_residential_property_tax() {
    let input = PropertyTaxInput {
        valuation: Valuation::MarketValue {
            market_value: 500_000.0,
        },
        jurisdiction: "urban".to_string(),
        property_type: PropertyType::Residential,
        building_year: None,
        exemptions: 0.0,
        improvements: 0.0,
        local_multiplier: None,
    };
    let result = compute_property_tax(&input).unwrap();

    assert!(close(result.assessed_value, 350_000.0, 1e-6));
    assert!(close(result.taxable_value, 350_000.0, 1e-6));
    assert!(close(result.base_tax, 1_225.0, 1e-6));
    assert!(close(result.final_tax, 1_470.0, 1e-6));
    assert!(close(result.monthly_tax, 122.5, 1e-6));
    assert!(close(result.effective_rate_percent, 0.294, 1e-9));
}

#[test]
fn test_scenario_three_year_sale() {
    // 2021-03-01 .. 2024-03-01 spans one leap day: 1096 days
    let input = capital_gains(300_000.0, 450_000.0, date(2021, 3, 1), date(2024, 3, 1));
    let result = compute_capital_gains(&input).unwrap();

    assert_eq!(result.holding_whole_years, 3);
    assert!(close(result.taxable_gain, 150_000.0, 1e-9));
    assert!(close(result.income_tax, 63_000.0, 1e-6));
    assert!(close(result.church_tax, 5_040.0, 1e-6));
    assert!(close(result.solidarity_surcharge, 3_465.0, 1e-6));
    assert!(close(result.tax_amount, 71_505.0, 1e-6));
    assert!(close(result.net_gain, 78_495.0, 1e-6));
    assert!(close(result.effective_tax_rate_percent, 47.67, 1e-6));
}

#[test]
fn test_scenario_child_inheritance() {
    let result = compute_transfer_tax(
        &inheritance(600_000.0, Relationship::Child),
        TransferMode::Inheritance,
    )
    .unwrap();

    assert!(close(result.taxable_amount, 200_000.0, 1e-9));
    assert_eq!(result.bracket_breakdown.len(), 2);
    assert!(close(result.bracket_breakdown[0].amount, 75_000.0, 1e-9));
    assert!(close(result.bracket_breakdown[0].tax, 5_250.0, 1e-9));
    assert!(close(result.bracket_breakdown[1].amount, 125_000.0, 1e-9));
    assert!(close(result.bracket_breakdown[1].tax, 13_750.0, 1e-9));
    assert!(close(result.tax_amount, 19_000.0, 1e-6));
    assert!(close(result.net_amount, 581_000.0, 1e-6));
}

// ---- Properties ----

#[test]
fn test_long_holding_is_never_taxed() {
    // 2000-06-15 .. 2010-06-15 spans only two leap days: 3652 days, 9.9986 years
    let bought = date(2000, 6, 15);
    for sold in [date(2010, 6, 16), date(2015, 1, 1), date(2030, 12, 31)] {
        for sale in [50_000.0, 200_000.0, 5_000_000.0] {
            let result = compute_capital_gains(&capital_gains(200_000.0, sale, bought, sold)).unwrap();
            assert_eq!(result.tax_amount, 0.0, "sold {sold} for {sale}");
            assert!(!result.is_taxable);
            assert!(sold >= result.tax_free_from);
        }
    }

    let tenth_anniversary = capital_gains(200_000.0, 5_000_000.0, bought, date(2010, 6, 15));
    let result = compute_capital_gains(&tenth_anniversary).unwrap();
    assert!(result.is_taxable);
    assert!(result.holding_period_years < 10.0);
    assert_eq!(result.tax_free_from, date(2010, 6, 16));
}

#[test]
fn test_non_positive_gain_is_never_taxed() {
    let bought = date(2022, 1, 1);
    for sold in [date(2022, 1, 1), date(2023, 7, 1), date(2031, 1, 1)] {
        let mut input = capital_gains(200_000.0, 210_000.0, bought, sold);
        input.deductible_costs = 10_000.0;
        let result = compute_capital_gains(&input).unwrap();
        assert_eq!(result.tax_amount, 0.0);

        let loss = capital_gains(200_000.0, 150_000.0, bought, sold);
        assert_eq!(compute_capital_gains(&loss).unwrap().tax_amount, 0.0);
    }
}

#[test]
fn test_transfer_tax_is_monotonic() {
    for relationship in Relationship::ALL {
        for mode in TransferMode::ALL {
            let mut previous = 0.0;
            let mut value = 1_000.0;
            while value < 40_000_000.0 {
                let tax = compute_transfer_tax(&inheritance(value, relationship), mode)
                    .unwrap()
                    .tax_amount;
                assert!(tax >= previous, "{relationship} {mode} at {value}");
                previous = tax;
                value *= 1.07;
            }
        }
    }
}

#[test]
fn test_band_schedules_are_continuous_at_boundaries() {
    let tables = &RateTables::standard().transfer_tax;
    let epsilon = 0.01;
    for (class, schedule) in &tables.schedules {
        let boundaries = schedule.bands.iter().filter_map(|b| b.upper);
        for boundary in boundaries {
            let below = schedule.apply(boundary - epsilon);
            let above = schedule.apply(boundary + epsilon);
            // Top rate is 50%, so 2 cents can move the tax by at most 1 cent
            assert!(above - below <= epsilon + 1e-6, "class {class} at {boundary}");
            assert!(above >= below);
        }
    }

    let notary = &RateTables::standard().purchase_costs.notary_schedule;
    for boundary in notary.bands.iter().filter_map(|b| b.upper) {
        let gap = notary.apply(boundary + epsilon) - notary.apply(boundary - epsilon);
        assert!(gap <= epsilon);
    }
}

#[test]
fn test_results_round_trip_through_json() {
    let property = compute_property_tax(&PropertyTaxInput {
        valuation: Valuation::Areas {
            land_area: 420.0,
            living_area: 135.0,
        },
        jurisdiction: "he".to_string(),
        property_type: PropertyType::Residential,
        building_year: Some(1972),
        exemptions: 0.0,
        improvements: 5_000.0,
        local_multiplier: Some(520.0),
    })
    .unwrap();
    assert_round_trip(&property);

    let gains = compute_capital_gains(&capital_gains(
        300_000.0,
        450_000.0,
        date(2021, 3, 1),
        date(2024, 3, 1),
    ))
    .unwrap();
    assert_round_trip(&gains);

    let mut gift = inheritance(750_000.0, Relationship::Grandchild);
    gift.usufruct = Some(Usufruct {
        annual_value: 9_000.0,
        grantor_age: 71,
    });
    assert_round_trip(&compute_transfer_tax(&gift, TransferMode::Gift).unwrap());

    assert_round_trip(
        &compute_depreciation(&DepreciationInput {
            acquisition_cost: 250_000.0,
            construction_year: 2024,
            acquisition_year: 2024,
            usage_category: UsageCategory::Residential,
        })
        .unwrap(),
    );

    assert_round_trip(
        &compute_yield(&YieldInput {
            purchase_price: 280_000.0,
            purchase_costs: 28_000.0,
            annual_rent: 14_400.0,
            operating_costs: 1_200.0,
            vacancy_rate_percent: 3.0,
            maintenance_reserve: 900.0,
            rent_growth_rate_percent: 1.5,
            value_growth_rate_percent: 2.0,
            projection_years: 15,
        })
        .unwrap(),
    );

    assert_round_trip(RateTables::standard());
}

#[test]
fn test_inputs_accept_category_codes_from_json() {
    let input: TransferTaxInput = serde_json::from_str(
        r#"{"gross_value": 600000, "relationship": "great_grandchild"}"#,
    )
    .unwrap();
    assert_eq!(input.relationship, Relationship::GreatGrandchild);
    assert_eq!(input.other_assets, 0.0);

    let input: CapitalGainsInput = serde_json::from_str(
        r#"{
            "purchase_price": 1.0,
            "sale_price": 2.0,
            "purchase_date": "2020-02-29",
            "sale_date": "2024-02-29",
            "personal_tax_rate_percent": 35
        }"#,
    )
    .unwrap();
    assert_eq!(input.purchase_date, date(2020, 2, 29));
    assert_eq!(input.church_tax_rate_percent, 0.0);

    let unknown = serde_json::from_str::<TransferTaxInput>(
        r#"{"gross_value": 1, "relationship": "cousin"}"#,
    );
    assert!(unknown.is_err());
}

#[test]
fn test_concurrent_callers_get_identical_results() {
    let input = inheritance(2_500_000.0, Relationship::Sibling);
    let expected = compute_transfer_tax(&input, TransferMode::Gift).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let input = input.clone();
            std::thread::spawn(move || compute_transfer_tax(&input, TransferMode::Gift).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_degenerate_ratios_are_zero() {
    // The exempt family home is the whole estate, so nothing is left to divide by
    let mut home = inheritance(100_000.0, Relationship::Spouse);
    home.owner_occupied_residence = true;
    let result = compute_transfer_tax(&home, TransferMode::Inheritance).unwrap();
    assert!(result.residence_exemption_applied);
    assert_eq!(result.total_estate_value, 0.0);
    assert_eq!(result.tax_amount, 0.0);
    assert_eq!(result.effective_rate_percent, 0.0);

    let gains = compute_capital_gains(&capital_gains(
        100_000.0,
        100_000.0,
        date(2023, 1, 1),
        date(2024, 1, 1),
    ))
    .unwrap();
    assert_eq!(gains.effective_tax_rate_percent, 0.0);
    assert!(gains.effective_tax_rate_percent.is_finite());
}
