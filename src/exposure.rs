// 🏭 Sector Exposure Aggregator - loan book grouped by economic sector
//
// Largest exposure first (ties by sector name). No loans means an empty
// list, not an error.

use crate::error::Result;
use crate::models::SectorExposure;
use crate::query::{Expr, Order, Predicate, Select};
use crate::source::DataSource;
use tracing::{debug, info, warn};

pub fn credit_exposure_by_sector<S>(source: &S) -> Result<Vec<SectorExposure>>
where
    S: DataSource + ?Sized,
{
    debug!("calculating credit exposure by sector");

    let query = Select::from("loans")
        .column("sector")
        .aggregate(Expr::Count, "loan_count")
        .aggregate(Expr::Sum("loan_amount"), "total_exposure")
        .aggregate(
            Expr::SumWhen(Predicate::eq("default_flag", true), "loan_amount"),
            "defaulted_exposure",
        )
        .aggregate(
            Expr::CountWhen(Predicate::eq("default_flag", true)),
            "defaulted_count",
        )
        .group_by("sector")
        .order_by("total_exposure", Order::Desc)
        .order_by("sector", Order::Asc)
        .build();
    let table = source.fetch(&query)?;

    if table.is_empty() {
        warn!("no sector exposure data found");
        return Ok(Vec::new());
    }

    let portfolio = table.sum_f64("total_exposure")?;

    let sectors = table
        .rows()
        .map(|row| -> Result<SectorExposure> {
            let loan_count = row.i64("loan_count")?;
            let defaulted_count = row.i64("defaulted_count")?;
            let total_exposure = row.f64("total_exposure")?;

            Ok(SectorExposure {
                sector: row.text("sector")?,
                loan_count,
                total_exposure,
                defaulted_exposure: row.f64("defaulted_exposure")?,
                defaulted_count,
                default_rate: share(defaulted_count as f64, loan_count as f64),
                exposure_pct: share(total_exposure, portfolio),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!("exposure calculated for {} sectors", sectors.len());
    Ok(sectors)
}

/// part / whole × 100, unrounded; 0.0 when the whole is zero
fn share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Herfindahl–Hirschman Index: Σ exposure_pct² (0–10000 scale)
///
/// `None` when there are no sectors.
pub fn herfindahl_index(sectors: &[SectorExposure]) -> Option<f64> {
    if sectors.is_empty() {
        return None;
    }
    Some(sectors.iter().map(|s| s.exposure_pct * s.exposure_pct).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_records;
    use crate::test_support::{empty_db, loan, reference_db};

    #[test]
    fn test_reference_sectors() {
        let conn = reference_db();
        let sectors = credit_exposure_by_sector(&conn).unwrap();

        assert_eq!(sectors.len(), 2);

        assert_eq!(sectors[0].sector, "Technology");
        assert_eq!(sectors[0].loan_count, 1);
        assert_eq!(sectors[0].total_exposure, 500_000.0);
        assert_eq!(sectors[0].default_rate, 0.0);
        assert_eq!(sectors[0].exposure_pct, 62.5);

        assert_eq!(sectors[1].sector, "Retail");
        assert_eq!(sectors[1].defaulted_count, 1);
        assert_eq!(sectors[1].defaulted_exposure, 300_000.0);
        assert_eq!(sectors[1].default_rate, 100.0);
        assert_eq!(sectors[1].exposure_pct, 37.5);
    }

    #[test]
    fn test_no_loans_gives_empty_list() {
        let conn = empty_db();
        let sectors = credit_exposure_by_sector(&conn).unwrap();

        assert!(sectors.is_empty());
        assert_eq!(herfindahl_index(&sectors), None);
    }

    #[test]
    fn test_shares_sum_to_one_hundred() {
        let conn = empty_db();
        insert_records(
            &conn,
            &[
                loan("L1", "Energy", 123_456.78, false),
                loan("L2", "Agriculture", 98_765.43, true),
                loan("L3", "Retail", 5_000.01, false),
                loan("L4", "Retail", 77_777.77, true),
                loan("L5", "Services", 1.0, false),
            ],
        )
        .unwrap();

        let sectors = credit_exposure_by_sector(&conn).unwrap();
        let total: f64 = sectors.iter().map(|s| s.exposure_pct).sum();

        assert!((total - 100.0).abs() < 1e-6);
        assert!(sectors
            .windows(2)
            .all(|w| w[0].total_exposure >= w[1].total_exposure));
    }

    #[test]
    fn test_ties_are_ordered_by_name() {
        let conn = empty_db();
        insert_records(
            &conn,
            &[loan("L1", "Retail", 100.0, false), loan("L2", "Energy", 100.0, false)],
        )
        .unwrap();

        let sectors = credit_exposure_by_sector(&conn).unwrap();
        assert_eq!(sectors[0].sector, "Energy");
        assert_eq!(sectors[1].sector, "Retail");
    }

    #[test]
    fn test_single_sector_hhi_is_maximal() {
        let conn = empty_db();
        insert_records(
            &conn,
            &[loan("L1", "Mining", 10.0, false), loan("L2", "Mining", 30.0, true)],
        )
        .unwrap();

        let sectors = credit_exposure_by_sector(&conn).unwrap();
        assert_eq!(herfindahl_index(&sectors), Some(10_000.0));
    }

    #[test]
    fn test_even_split_hhi() {
        let conn = empty_db();
        insert_records(
            &conn,
            &[
                loan("L1", "A", 50.0, false),
                loan("L2", "B", 50.0, false),
                loan("L3", "C", 50.0, false),
                loan("L4", "D", 50.0, false),
            ],
        )
        .unwrap();

        let hhi = herfindahl_index(&credit_exposure_by_sector(&conn).unwrap()).unwrap();
        assert!((hhi - 2_500.0).abs() < 1e-9);
    }
}
