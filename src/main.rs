// Bank Analytics - CLI
//
//   bank-analytics init
//   bank-analytics import <table> <csv>
//   bank-analytics report [--json]
//   bank-analytics risk
//   bank-analytics sectors
//   bank-analytics performance [FROM] [TO]
//   bank-analytics breakdown country|segment [--country C] [--segment S]

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;

use bank_analytics::breakdown::{breakdown, GroupBy};
use bank_analytics::{
    assess_risk, credit_exposure_by_sector, herfindahl_index, import_csv, logging,
    monthly_performance, open_database, setup_database, CustomerFilter, DashboardSnapshot,
    ImportTable, PerformanceTotals, PeriodFilter, SectorRiskLevel, Settings,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let settings = Settings::load().context("failed to load settings")?;
    logging::init(&settings);

    let command = args.get(1).map(String::as_str).unwrap_or("report");
    let rest: &[String] = args.get(2..).unwrap_or(&[]);

    match command {
        "init" => run_init(&settings),
        "import" => run_import(&settings, rest),
        "report" => run_report(&settings, rest),
        "risk" => run_risk(&settings),
        "sectors" => run_sectors(&settings),
        "performance" => run_performance(&settings, rest),
        "breakdown" => run_breakdown(&settings, rest),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}

fn print_usage() {
    println!("Usage: bank-analytics <command>");
    println!();
    println!("  init                                   create the schema");
    println!("  import <table> <csv>                   load a CSV into a table");
    println!("  report [--json]                        full dashboard (default)");
    println!("  risk                                   risk index breakdown");
    println!("  sectors                                credit exposure by sector");
    println!("  performance [FROM] [TO]                monthly results (YYYY-MM)");
    println!("  breakdown country|segment [--country C] [--segment S]");
}

/// Open an existing database; analytics never create one
fn open_existing(settings: &Settings) -> Result<Connection> {
    if !settings.db_path.exists() {
        eprintln!("❌ Database not found at {:?}", settings.db_path);
        eprintln!("   Run: bank-analytics init");
        eprintln!("   then import data with: bank-analytics import <table> <csv>");
        bail!("database not found");
    }
    Ok(open_database(&settings.db_path)?)
}

// ============================================================================
// Data management
// ============================================================================

fn run_init(settings: &Settings) -> Result<()> {
    println!("🔧 Setting up database at {:?}...", settings.db_path);
    let conn = open_database(&settings.db_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");
    Ok(())
}

fn run_import(settings: &Settings, args: &[String]) -> Result<()> {
    let (table, csv_path) = match args {
        [table, csv_path, ..] => (table, csv_path),
        _ => bail!("usage: bank-analytics import <table> <csv>"),
    };
    let table: ImportTable = table.parse()?;

    println!("🗄️  Importing {} → {:?}", csv_path, settings.db_path);
    let conn = open_database(&settings.db_path)?;
    setup_database(&conn)?;

    let stats = import_csv(&conn, table, Path::new(csv_path))
        .with_context(|| format!("failed to import {}", csv_path))?;

    println!("✓ Inserted: {}", stats.inserted);
    if stats.duplicates > 0 {
        println!("✓ Duplicates skipped: {}", stats.duplicates);
    }
    Ok(())
}

// ============================================================================
// Reports
// ============================================================================

fn run_report(settings: &Settings, args: &[String]) -> Result<()> {
    let conn = open_existing(settings)?;
    let snap = DashboardSnapshot::compute(&conn, &settings.engine, &settings.risk);

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    println!("🏦 Bank Analytics Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let s = &snap.summary;
    println!("\n💰 Balance sheet");
    println!("   Total assets:    {:>18.2}", s.total_assets);
    println!("   Total deposits:  {:>18.2}", s.total_deposits);
    println!("   Total loans:     {:>18.2}", s.total_loans);

    println!(
        "\n📈 Income statement (last {} months)",
        settings.engine.analysis_months
    );
    println!("   Interest income: {:>18.2}", s.interest_income);
    println!("   Interest expense:{:>18.2}", s.interest_expense);
    println!("   Fee income:      {:>18.2}", s.fee_income);
    println!("   Operating cost:  {:>18.2}", s.operating_cost);
    println!("   Net profit:      {:>18.2}", s.net_profit);

    println!("\n📊 Indicators");
    println!("   NIM:             {}", snap.net_interest_margin);
    println!("   ROA:             {}", snap.return_on_assets);
    println!("   ROE:             {}", snap.return_on_equity);
    println!("   Cost/income:     {}", snap.cost_to_income);
    println!("   Loan/deposit:    {}", snap.loan_to_deposit);
    println!("   Default (count): {}", snap.default_rate.by_count);
    println!("   Default (value): {}", snap.default_rate.by_value);
    println!("   NPL ratio:       {}", snap.npl_ratio);

    println!("\n⚠️  Risk");
    println!(
        "   Index:           {:.2}/100 ({})",
        snap.risk.index,
        snap.risk.band.as_str()
    );
    println!("   Health score:    {:.2}", snap.health_score);

    if !snap.failures.is_empty() {
        println!("\n❌ {} indicator(s) could not be computed:", snap.failures.len());
        for failure in &snap.failures {
            println!("   {}: {}", failure.metric, failure.error);
        }
    }

    Ok(())
}

fn run_risk(settings: &Settings) -> Result<()> {
    let conn = open_existing(settings)?;
    let a = assess_risk(&conn, &settings.engine, &settings.risk)?;

    println!("⚠️  Bank Risk Index");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "   NPL ratio {:>8.2}%  → {:>5.2} / 40",
        a.inputs.npl_ratio, a.breakdown.npl
    );
    println!(
        "   LDR       {:>8.2}%  → {:>5.2} / 20",
        a.inputs.loan_to_deposit_ratio, a.breakdown.liquidity
    );
    println!(
        "   Default   {:>8.2}%  → {:>5.2} / 30",
        a.inputs.default_rate_by_value, a.breakdown.default
    );
    match a.inputs.hhi {
        Some(hhi) => println!(
            "   HHI       {:>9.1}  → {:>5.2} / 10",
            hhi, a.breakdown.concentration
        ),
        None => println!(
            "   HHI             n/a  → {:>5.2} / 10",
            a.breakdown.concentration
        ),
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Index {:.2}/100 ({})", a.index, a.band.as_str());
    println!("   Health score {:.2}", a.health_score());
    Ok(())
}

fn run_sectors(settings: &Settings) -> Result<()> {
    let conn = open_existing(settings)?;
    let sectors = credit_exposure_by_sector(&conn)?;

    if sectors.is_empty() {
        println!("No loans on record.");
        return Ok(());
    }

    println!("🏭 Credit exposure by sector");
    println!(
        "{:<20} {:>6} {:>16} {:>8} {:>9}  risk",
        "sector", "loans", "exposure", "share", "default"
    );
    for s in &sectors {
        let level = match s.risk_level() {
            SectorRiskLevel::Low => "low",
            SectorRiskLevel::Medium => "medium",
            SectorRiskLevel::High => "high",
        };
        println!(
            "{:<20} {:>6} {:>16.2} {:>7.2}% {:>8.2}%  {}",
            s.sector, s.loan_count, s.total_exposure, s.exposure_pct, s.default_rate, level
        );
    }
    if let Some(hhi) = herfindahl_index(&sectors) {
        println!("\nHHI: {:.1}", hhi);
    }
    Ok(())
}

fn run_performance(settings: &Settings, args: &[String]) -> Result<()> {
    let filter = PeriodFilter {
        from: args.first().cloned(),
        to: args.get(1).cloned(),
    };
    filter.validate()?;

    let conn = open_existing(settings)?;
    let rows = monthly_performance(&conn, &filter)?;
    let totals = PerformanceTotals::from_rows(&rows);

    println!("📈 Monthly performance");
    println!(
        "{:<8} {:>16} {:>16} {:>16} {:>10}",
        "month", "income", "op. cost", "net profit", "CIR"
    );
    for row in &rows {
        println!(
            "{:<8} {:>16.2} {:>16.2} {:>16.2} {:>10}",
            row.period.month,
            row.total_income,
            row.period.operating_cost,
            row.period.net_profit,
            row.cost_to_income.to_string()
        );
    }
    println!(
        "\n{} months, income {:.2}, net profit {:.2}, average CIR {:.2}%",
        totals.months, totals.total_income, totals.net_profit, totals.average_cir
    );
    Ok(())
}

fn run_breakdown(settings: &Settings, args: &[String]) -> Result<()> {
    let group_by = match args.first().map(String::as_str) {
        Some("country") => GroupBy::Country,
        Some("segment") => GroupBy::Segment,
        _ => bail!("usage: bank-analytics breakdown country|segment [--country C] [--segment S]"),
    };

    let mut filter = CustomerFilter::default();
    let mut iter = args[1..].iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .cloned()
            .ok_or_else(|| anyhow!("{} needs a value", flag))?;
        match flag.as_str() {
            "--country" => filter.country = Some(value),
            "--segment" => filter.segment = Some(value),
            other => bail!("unknown option: {}", other),
        }
    }

    let conn = open_existing(settings)?;
    let groups = breakdown(&conn, &filter, &settings.engine, group_by)?;

    println!("🌍 Customer breakdown");
    println!(
        "{:<16} {:>9} {:>9} {:>16} {:>16} {:>9}",
        "group", "customers", "accounts", "deposits", "loans", "defaults"
    );
    for g in &groups {
        println!(
            "{:<16} {:>9} {:>9} {:>16.2} {:>16.2} {:>9}",
            g.group, g.customers, g.accounts, g.total_deposits, g.total_loans, g.defaulted_loans
        );
        if let Some(cost) = g.branch_operating_cost {
            println!("{:<16} branch operating cost {:.2}", "", cost);
        }
    }
    Ok(())
}
