// Property-based tests for the calculators and the risk scorer

use bank_analytics::outcome::round2;
use bank_analytics::risk::{
    concentration_contribution, liquidity_contribution, RiskBreakdown, RiskInputs, LDR_CEILING,
    LDR_FLOOR,
};
use bank_analytics::{
    calculate_roa, credit_exposure_by_sector, herfindahl_index, insert_records, setup_database,
    Account, AccountType, FinancialPeriod, Loan, SectorExposure,
};
use proptest::prelude::*;
use rusqlite::Connection;

const SECTORS: [&str; 6] = [
    "Agriculture",
    "Energy",
    "Manufacturing",
    "Retail",
    "Services",
    "Technology",
];

fn empty_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    conn
}

// Loan as (sector index, amount, defaulted)
fn loan_strategy() -> impl Strategy<Value = (usize, f64, bool)> {
    (0..SECTORS.len(), 1.0..10_000_000.0f64, any::<bool>())
}

// Any f64 including NaN and infinities
fn wild_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        prop::num::f64::ANY,
        -1_000.0..1_000.0f64,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn even_book(n: usize) -> Vec<SectorExposure> {
    (0..n)
        .map(|i| SectorExposure {
            sector: format!("S{}", i),
            loan_count: 1,
            total_exposure: 100.0,
            defaulted_exposure: 0.0,
            defaulted_count: 0,
            default_rate: 0.0,
            exposure_pct: 100.0 / n as f64,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Sector shares always add up to the whole portfolio
    #[test]
    fn test_exposure_shares_sum_to_100(loans in prop::collection::vec(loan_strategy(), 1..40)) {
        let conn = empty_db();
        let records: Vec<Loan> = loans
            .iter()
            .enumerate()
            .map(|(i, (sector, amount, defaulted))| Loan {
                loan_id: format!("L{:04}", i),
                customer_id: "C1".to_string(),
                sector: SECTORS[*sector].to_string(),
                loan_amount: *amount,
                interest_rate: 0.1,
                default_flag: *defaulted,
            })
            .collect();
        insert_records(&conn, &records).unwrap();

        let sectors = credit_exposure_by_sector(&conn).unwrap();
        let total: f64 = sectors.iter().map(|s| s.exposure_pct).sum();

        prop_assert!((total - 100.0).abs() < 1e-6);
        prop_assert!(sectors.iter().all(|s| (0.0..=100.0).contains(&s.default_rate)));

        let hhi = herfindahl_index(&sectors).unwrap();
        prop_assert!(hhi > 0.0 && hhi <= 10_000.0 + 1e-6);
    }

    /// The composite never leaves [0, 100], whatever the inputs
    #[test]
    fn test_risk_index_bounded(
        npl in wild_f64(),
        ldr in wild_f64(),
        default in wild_f64(),
        hhi in prop::option::of(wild_f64()),
    ) {
        let index = RiskBreakdown::from_inputs(&RiskInputs {
            npl_ratio: npl,
            loan_to_deposit_ratio: ldr,
            default_rate_by_value: default,
            hhi,
        })
        .index();

        prop_assert!((0.0..=100.0).contains(&index));
    }

    #[test]
    fn test_liquidity_zero_only_inside_band(ldr in -500.0..1_000.0f64) {
        let score = liquidity_contribution(ldr);
        let inside = (LDR_FLOOR..=LDR_CEILING).contains(&ldr);

        prop_assert_eq!(score == 0.0, inside);
        prop_assert!((0.0..=20.0).contains(&score));
    }

    /// More evenly spread sectors score lower; a single sector scores 10
    #[test]
    fn test_concentration_falls_with_diversification(n in 1usize..50) {
        let fewer = concentration_contribution(herfindahl_index(&even_book(n)));
        let more = concentration_contribution(herfindahl_index(&even_book(n + 1)));

        prop_assert!(more < fewer);
        prop_assert!((fewer - 10.0 / n as f64).abs() < 1e-9);
    }

    /// N identical periods over a fixed deposit base
    #[test]
    fn test_roa_for_identical_periods(
        months in 1usize..=24,
        profit in -1_000_000.0..1_000_000.0f64,
        assets in 1_000.0..100_000_000.0f64,
    ) {
        let conn = empty_db();
        let periods: Vec<FinancialPeriod> = (0..months)
            .map(|i| FinancialPeriod {
                month: format!("{}-{:02}", 2023 + i / 12, i % 12 + 1),
                interest_income: 1_000.0,
                interest_expense: 500.0,
                fee_income: 100.0,
                operating_cost: 200.0,
                net_profit: profit,
            })
            .collect();
        insert_records(&conn, &periods).unwrap();
        insert_records(&conn, &[Account {
            account_id: "A1".to_string(),
            customer_id: "C1".to_string(),
            account_type: AccountType::Savings,
            balance: assets,
            interest_rate: 0.01,
        }])
        .unwrap();

        // N·P summed period by period, then round(N·P / A × 100, 2)
        let net_profit: f64 = (0..months.min(12)).map(|_| profit).sum();
        let expected = round2(net_profit / assets * 100.0);
        let roa = calculate_roa(&conn).unwrap();

        prop_assert_eq!(roa, expected);
    }
}

#[test]
fn test_empty_tables_risk_in_range() {
    let conn = empty_db();
    let index = bank_analytics::calculate_bank_risk_index(&conn).unwrap();
    assert!((0.0..=100.0).contains(&index));
}
