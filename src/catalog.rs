// 📋 Report Catalog - the named rental reports
//
// Every report is a pure function of a relation store, composed as
//   get/join → filter → derive → group → aggregate → sort → project
// on top of the aggregation engine. Tunables live in ReportConfig.

use crate::aggregation::{Aggregate, AggregationPlan, GroupKey, GroupingMode};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::sort::{sort_relation, SortKey};
use crate::store::{on_eq, JoinKind, Record, Relation, RelationStore};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// REPORT KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    BikesPerCategory,
    MembershipsPerCustomer,
    DiscountedPricing,
    AvailabilityCounts,
    RentalRevenueRollup,
    MembershipRevenueByType,
    MembershipRevenueCube,
    CustomerSegmentation,
}

impl ReportKind {
    pub const ALL: [ReportKind; 8] = [
        ReportKind::BikesPerCategory,
        ReportKind::MembershipsPerCustomer,
        ReportKind::DiscountedPricing,
        ReportKind::AvailabilityCounts,
        ReportKind::RentalRevenueRollup,
        ReportKind::MembershipRevenueByType,
        ReportKind::MembershipRevenueCube,
        ReportKind::CustomerSegmentation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::BikesPerCategory => "bikes-per-category",
            ReportKind::MembershipsPerCustomer => "memberships-per-customer",
            ReportKind::DiscountedPricing => "discounted-pricing",
            ReportKind::AvailabilityCounts => "availability-counts",
            ReportKind::RentalRevenueRollup => "rental-revenue-rollup",
            ReportKind::MembershipRevenueByType => "membership-revenue-by-type",
            ReportKind::MembershipRevenueCube => "membership-revenue-cube",
            ReportKind::CustomerSegmentation => "customer-segmentation",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::BikesPerCategory => "Bikes per category",
            ReportKind::MembershipsPerCustomer => "Memberships per customer",
            ReportKind::DiscountedPricing => "Discounted pricing",
            ReportKind::AvailabilityCounts => "Availability by category",
            ReportKind::RentalRevenueRollup => "Rental revenue by year and month",
            ReportKind::MembershipRevenueByType => "Membership revenue by year, month and type",
            ReportKind::MembershipRevenueCube => "Membership revenue cube",
            ReportKind::CustomerSegmentation => "Customers by rental count",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ReportError::UnknownReport(s.to_string()))
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportColumn {
    pub name: String,
    /// Rendered with two decimals
    pub currency: bool,
}

/// Computed rows of one report, in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<Vec<Value>>,
}

impl Report {
    fn from_relation(kind: ReportKind, relation: Relation, currency: &[&str]) -> Self {
        let columns = relation
            .columns()
            .iter()
            .map(|name| ReportColumn {
                name: name.clone(),
                currency: currency.contains(&name.as_str()),
            })
            .collect();
        Report {
            kind,
            columns,
            rows: relation.rows().to_vec(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell of `row` in column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ReportCatalog {
    config: ReportConfig,
}

impl ReportCatalog {
    pub fn new(config: ReportConfig) -> Self {
        ReportCatalog { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn run(&self, kind: ReportKind, store: &dyn RelationStore) -> Result<Report> {
        let report = match kind {
            ReportKind::BikesPerCategory => self.bikes_per_category(store),
            ReportKind::MembershipsPerCustomer => self.memberships_per_customer(store),
            ReportKind::DiscountedPricing => self.discounted_pricing(store),
            ReportKind::AvailabilityCounts => self.availability_counts(store),
            ReportKind::RentalRevenueRollup => self.rental_revenue_rollup(store),
            ReportKind::MembershipRevenueByType => self.membership_revenue_by_type(store),
            ReportKind::MembershipRevenueCube => self.membership_revenue_cube(store),
            ReportKind::CustomerSegmentation => self.customer_segmentation(store),
        }?;

        debug!(report = kind.name(), rows = report.len(), "report computed");
        Ok(report)
    }

    pub fn run_all(&self, store: &dyn RelationStore) -> Result<Vec<Report>> {
        ReportKind::ALL.iter().map(|kind| self.run(*kind, store)).collect()
    }

    /// Categories with more than `min_bikes_per_category` bikes.
    pub fn bikes_per_category(&self, store: &dyn RelationStore) -> Result<Report> {
        let bikes = store.get("bike")?;
        let min = self.config.min_bikes_per_category;

        let plan = AggregationPlan::new(
            vec![GroupKey::field("category")],
            GroupingMode::Simple,
            vec![Aggregate::count_rows("number_of_bikes")],
        )?;
        let mut grouped = plan
            .execute(&bikes)?
            .having("number_of_bikes", |n| n.as_int().is_some_and(|n| n > min))?;
        grouped.sort_by(&[SortKey::asc("category")])?;

        Ok(Report::from_relation(
            ReportKind::BikesPerCategory,
            grouped.into_relation("bikes_per_category"),
            &[],
        ))
    }

    /// Every customer with their membership count, zero included.
    pub fn memberships_per_customer(&self, store: &dyn RelationStore) -> Result<Report> {
        let customers = store.get("customer")?;
        let memberships = store.get("membership")?;
        let joined = store.join(
            &customers,
            &memberships,
            JoinKind::LeftOuter,
            &on_eq("customer.id", "membership.customer_id"),
        );

        let plan = AggregationPlan::new(
            vec![
                GroupKey::field("customer.id").named("customer_id"),
                GroupKey::field("customer.name"),
            ],
            GroupingMode::Simple,
            vec![Aggregate::count("membership_count", "membership.id")],
        )?;
        let mut grouped = plan.execute(&joined)?;
        grouped.sort_by(&[
            SortKey::desc("membership_count"),
            SortKey::asc("name"),
            SortKey::asc("customer_id"),
        ])?;

        let relation = grouped
            .into_relation("memberships_per_customer")
            .project(&["name", "membership_count"])?;
        Ok(Report::from_relation(ReportKind::MembershipsPerCustomer, relation, &[]))
    }

    /// Old and new prices of every bike under the category discount table.
    pub fn discounted_pricing(&self, store: &dyn RelationStore) -> Result<Report> {
        let bikes = store.get("bike")?;
        for field in ["id", "category", "price_per_hour", "price_per_day"] {
            bikes.require_column(field)?;
        }

        let discounts = &self.config.discounts;
        let discounted = |record: &Record<'_>, field: &str, daily: bool| {
            let discount = discounts.lookup(record.get("category").as_str().unwrap_or_default());
            match record.get(field).as_f64() {
                Some(price) if daily => Value::Float(discount.daily_price(price)),
                Some(price) => Value::Float(discount.hourly_price(price)),
                None => Value::Null,
            }
        };

        let mut priced = bikes
            .derive("old_price_per_hour", |r| r.get("price_per_hour").clone())
            .derive("new_price_per_hour", |r| discounted(r, "price_per_hour", false))
            .derive("old_price_per_day", |r| r.get("price_per_day").clone())
            .derive("new_price_per_day", |r| discounted(r, "price_per_day", true))
            .project(&[
                "id",
                "category",
                "old_price_per_hour",
                "new_price_per_hour",
                "old_price_per_day",
                "new_price_per_day",
            ])?;
        sort_relation(&mut priced, &[SortKey::asc("id")])?;

        Ok(Report::from_relation(
            ReportKind::DiscountedPricing,
            priced,
            &[
                "old_price_per_hour",
                "new_price_per_hour",
                "old_price_per_day",
                "new_price_per_day",
            ],
        ))
    }

    /// Available and rented bikes per category.
    pub fn availability_counts(&self, store: &dyn RelationStore) -> Result<Report> {
        let bikes = store.get("bike")?;

        let plan = AggregationPlan::new(
            vec![GroupKey::field("category")],
            GroupingMode::Simple,
            vec![
                Aggregate::count_where("available_bikes_count", "status", "available"),
                Aggregate::count_where("rented_bikes_count", "status", "rented"),
            ],
        )?;
        let mut grouped = plan.execute(&bikes)?;
        grouped.sort_by(&[SortKey::asc("category")])?;

        Ok(Report::from_relation(
            ReportKind::AvailabilityCounts,
            grouped.into_relation("availability_counts"),
            &[],
        ))
    }

    /// Rental revenue per month, with yearly subtotals and a grand total.
    pub fn rental_revenue_rollup(&self, store: &dyn RelationStore) -> Result<Report> {
        let rentals = store.get("rental")?;

        let plan = AggregationPlan::new(
            vec![GroupKey::year("start_timestamp"), GroupKey::month("start_timestamp")],
            GroupingMode::grouping_sets(&[&["year", "month"], &["year"], &[]]),
            vec![Aggregate::sum("revenue", "total_paid").currency()],
        )?;
        let mut grouped = plan.execute(&rentals)?;
        grouped.sort_by(&[SortKey::asc("year"), SortKey::asc("month")])?;

        Ok(Report::from_relation(
            ReportKind::RentalRevenueRollup,
            grouped.into_relation("rental_revenue_rollup"),
            &["revenue"],
        ))
    }

    /// Membership revenue per year, month and membership type.
    pub fn membership_revenue_by_type(&self, store: &dyn RelationStore) -> Result<Report> {
        let joined = membership_with_type(store, None)?;

        let plan = AggregationPlan::new(
            vec![
                GroupKey::year("membership.start_date"),
                GroupKey::month("membership.start_date"),
                GroupKey::field("membership_type.name").named("membership_type"),
            ],
            GroupingMode::Simple,
            vec![Aggregate::sum("revenue", "membership.total_paid").currency()],
        )?;
        let mut grouped = plan.execute(&joined)?;
        grouped.sort_by(&[
            SortKey::asc("year"),
            SortKey::asc("month"),
            SortKey::asc("membership_type"),
        ])?;

        Ok(Report::from_relation(
            ReportKind::MembershipRevenueByType,
            grouped.into_relation("membership_revenue_by_type"),
            &["revenue"],
        ))
    }

    /// Every subtotal of one year's membership revenue over (type, month).
    pub fn membership_revenue_cube(&self, store: &dyn RelationStore) -> Result<Report> {
        let joined = membership_with_type(store, Some(self.config.cube_year))?;

        let plan = AggregationPlan::new(
            vec![
                GroupKey::field("membership_type.name").named("membership_type"),
                GroupKey::month("membership.start_date"),
            ],
            GroupingMode::Cube,
            vec![Aggregate::sum("revenue", "membership.total_paid").currency()],
        )?;
        let mut grouped = plan.execute(&joined)?;
        grouped.sort_by(&[SortKey::asc("membership_type"), SortKey::asc("month")])?;

        Ok(Report::from_relation(
            ReportKind::MembershipRevenueCube,
            grouped.into_relation("membership_revenue_cube"),
            &["revenue"],
        ))
    }

    /// Customers bucketed by how many rentals they made.
    pub fn customer_segmentation(&self, store: &dyn RelationStore) -> Result<Report> {
        let customers = store.get("customer")?;
        let rentals = store.get("rental")?;
        let joined = store.join(
            &customers,
            &rentals,
            JoinKind::LeftOuter,
            &on_eq("customer.id", "rental.customer_id"),
        );

        let per_customer = AggregationPlan::new(
            vec![GroupKey::field("customer.id").named("customer_id")],
            GroupingMode::Simple,
            vec![Aggregate::count("rental_count", "rental.id")],
        )?
        .execute(&joined)?
        .into_relation("customer_rentals");

        let segments = self.config.segments;
        let labelled = per_customer
            .derive("rental_count_category", |r| {
                Value::text(segments.classify(r.get("rental_count").as_int().unwrap_or(0)))
            })
            .derive("segment_rank", |r| {
                let label = r.get("rental_count_category").as_str().unwrap_or_default();
                Value::from(segments.rank(label).map(|rank| rank as i64))
            });

        let plan = AggregationPlan::new(
            vec![
                GroupKey::field("segment_rank"),
                GroupKey::field("rental_count_category"),
            ],
            GroupingMode::Simple,
            vec![Aggregate::count_rows("customer_count")],
        )?;
        let mut grouped = plan.execute(&labelled)?;
        grouped.sort_by(&[SortKey::asc("segment_rank")])?;

        let relation = grouped
            .into_relation("customer_segmentation")
            .project(&["rental_count_category", "customer_count"])?;
        Ok(Report::from_relation(ReportKind::CustomerSegmentation, relation, &[]))
    }
}

/// Memberships left-joined to their type, optionally restricted to one
/// start year. Memberships of an unknown type keep a NULL type name.
fn membership_with_type(store: &dyn RelationStore, year: Option<i32>) -> Result<Relation> {
    let mut memberships = store.get("membership")?;
    memberships.require_column("start_date")?;
    if let Some(year) = year {
        memberships = memberships.filter(|r| r.get("start_date").year() == Value::Int(year as i64));
    }

    let types = store.get("membership_type")?;
    Ok(store.join(
        &memberships,
        &types,
        JoinKind::LeftOuter,
        &on_eq("membership.membership_type_id", "membership_type.id"),
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Bike, BikeStatus, Membership};
    use crate::seed::sample_snapshot;
    use crate::store::Snapshot;
    use chrono::NaiveDate;
    use std::collections::{HashMap, HashSet};

    fn catalog() -> ReportCatalog {
        ReportCatalog::default()
    }

    fn text(report: &Report, row: usize, column: &str) -> String {
        report.value(row, column).unwrap().to_string()
    }

    fn money(report: &Report, row: usize, column: &str) -> f64 {
        report.value(row, column).unwrap().as_f64().unwrap()
    }

    #[test]
    fn test_report_names_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.name().parse::<ReportKind>().unwrap(), kind);
        }
        assert_eq!(
            "revenue".parse::<ReportKind>().unwrap_err(),
            ReportError::UnknownReport("revenue".to_string())
        );
    }

    #[test]
    fn test_bikes_per_category_example() {
        let report = catalog().bikes_per_category(&sample_snapshot()).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(text(&report, 0, "category"), "mountain bike");
        assert_eq!(report.value(0, "number_of_bikes"), Some(&Value::Int(3)));
        assert_eq!(text(&report, 1, "category"), "road bike");
        assert_eq!(report.value(1, "number_of_bikes"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_memberships_per_customer_covers_every_customer() {
        let snapshot = sample_snapshot();
        let report = catalog().memberships_per_customer(&snapshot).unwrap();

        assert_eq!(report.len(), snapshot.customers.len());
        let names: HashSet<String> = (0..report.len()).map(|i| text(&report, i, "name")).collect();
        assert_eq!(names.len(), snapshot.customers.len());

        for i in 0..report.len() {
            let name = text(&report, i, "name");
            let customer = snapshot.customers.iter().find(|c| c.name == name).unwrap();
            let expected = snapshot.memberships.iter().filter(|m| m.customer_id == customer.id).count();
            assert_eq!(report.value(i, "membership_count"), Some(&Value::Int(expected as i64)));
        }

        // Descending by count, zero last
        assert_eq!(text(&report, 0, "name"), "John Smith");
        assert_eq!(report.value(0, "membership_count"), Some(&Value::Int(3)));
        assert_eq!(text(&report, report.len() - 1, "name"), "Michael Davis");
        assert_eq!(report.value(report.len() - 1, "membership_count"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_customers_sharing_a_name_stay_separate() {
        let mut snapshot = sample_snapshot();
        snapshot.customers.push(crate::entities::Customer::new(7, "John Smith", "other.john@example.com"));

        let report = catalog().memberships_per_customer(&snapshot).unwrap();
        assert_eq!(report.len(), 7);
    }

    #[test]
    fn test_discounted_pricing() {
        let snapshot = sample_snapshot();
        let catalog = catalog();
        let report = catalog.discounted_pricing(&snapshot).unwrap();

        assert_eq!(report.len(), snapshot.bikes.len());
        assert!(report.columns.iter().skip(2).all(|c| c.currency));

        for i in 0..report.len() {
            assert!(money(&report, i, "new_price_per_hour") <= money(&report, i, "old_price_per_hour"));
            assert!(money(&report, i, "new_price_per_day") <= money(&report, i, "old_price_per_day"));
        }

        // Bike 10: electric, 18.00/h and 90.00/day -> 10% and 20% off
        assert_eq!(report.value(9, "id"), Some(&Value::Int(10)));
        assert_eq!(money(&report, 9, "new_price_per_hour"), 16.2);
        assert_eq!(money(&report, 9, "new_price_per_day"), 72.0);
        // Bike 1: mountain bike, 8.00/h and 40.00/day -> 20% and 50% off
        assert_eq!(money(&report, 0, "new_price_per_hour"), 6.4);
        assert_eq!(money(&report, 0, "new_price_per_day"), 20.0);
        // Bike 7: hybrid falls back to 50%/50%
        assert_eq!(money(&report, 6, "new_price_per_hour"), 3.5);
        assert_eq!(money(&report, 6, "new_price_per_day"), 17.5);

        let again = catalog.discounted_pricing(&snapshot).unwrap();
        assert_eq!(report, again);
    }

    #[test]
    fn test_availability_counts_partition_each_category() {
        let snapshot = sample_snapshot();
        let report = catalog().availability_counts(&snapshot).unwrap();

        let mut totals: HashMap<&str, (i64, i64)> = HashMap::new();
        for bike in &snapshot.bikes {
            let entry = totals.entry(bike.category.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if bike.status == BikeStatus::OutOfService {
                entry.1 += 1;
            }
        }

        assert_eq!(report.len(), totals.len());
        for i in 0..report.len() {
            let category = text(&report, i, "category");
            let available = report.value(i, "available_bikes_count").unwrap().as_int().unwrap();
            let rented = report.value(i, "rented_bikes_count").unwrap().as_int().unwrap();
            let (total, other) = totals[category.as_str()];
            assert_eq!(available + rented + other, total, "category {}", category);
        }
    }

    #[test]
    fn test_availability_reports_zero_for_missing_status() {
        let snapshot = Snapshot {
            bikes: vec![Bike::new(1, "Cube", "road bike", 8.0, 40.0, BikeStatus::Available)],
            ..Snapshot::default()
        };
        let report = catalog().availability_counts(&snapshot).unwrap();

        assert_eq!(report.rows, vec![vec![Value::text("road bike"), Value::Int(1), Value::Int(0)]]);
    }

    #[test]
    fn test_rental_revenue_rollup_laws() {
        let snapshot = sample_snapshot();
        let report = catalog().rental_revenue_rollup(&snapshot).unwrap();
        let cents = |x: f64| (x * 100.0).round() as i64;

        // Grand total is last and matches every rental
        let last = report.len() - 1;
        assert!(report.value(last, "year").unwrap().is_null());
        assert!(report.value(last, "month").unwrap().is_null());
        let all: f64 = snapshot.rentals.iter().map(|r| r.total_paid).sum();
        assert_eq!(cents(money(&report, last, "revenue")), cents(all));

        // Each year's months are followed immediately by that year's subtotal
        let mut month_sum = 0;
        let mut subtotal_sum = 0;
        let mut current_year: Option<String> = None;
        for i in 0..last {
            let year = text(&report, i, "year");
            let revenue = cents(money(&report, i, "revenue"));
            if report.value(i, "month").unwrap().is_null() {
                assert_eq!(current_year.as_deref(), Some(year.as_str()));
                assert_eq!(month_sum, revenue, "subtotal of {}", year);
                subtotal_sum += revenue;
                month_sum = 0;
                current_year = None;
            } else {
                if let Some(current) = &current_year {
                    assert_eq!(current, &year);
                }
                current_year = Some(year);
                month_sum += revenue;
            }
        }
        assert_eq!(subtotal_sum, cents(money(&report, last, "revenue")));
    }

    #[test]
    fn test_membership_revenue_by_type_sorted() {
        let snapshot = sample_snapshot();
        let report = catalog().membership_revenue_by_type(&snapshot).unwrap();

        assert_eq!(
            report.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["year", "month", "membership_type", "revenue"]
        );

        let keys: Vec<(Value, Value, Value)> = report
            .rows
            .iter()
            .map(|r| (r[0].clone(), r[1].clone(), r[2].clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let total: f64 = (0..report.len()).map(|i| money(&report, i, "revenue")).sum();
        let expected: f64 = snapshot.memberships.iter().map(|m| m.total_paid).sum();
        assert!((total - expected).abs() < 0.005);
    }

    #[test]
    fn test_membership_revenue_cube_is_complete() {
        let snapshot = sample_snapshot();
        let report = catalog().membership_revenue_cube(&snapshot).unwrap();

        // 2023: Basic + Premium over January..March
        assert_eq!(report.len(), (2 + 1) * (3 + 1));

        assert_eq!(text(&report, 0, "membership_type"), "Basic Monthly");
        assert_eq!(text(&report, 0, "month"), "1");
        // Basic subtotal (month rolled up) right after Basic's months
        assert_eq!(text(&report, 3, "membership_type"), "Basic Monthly");
        assert!(report.value(3, "month").unwrap().is_null());
        assert_eq!(money(&report, 3, "revenue"), 145.5);

        // Per-month totals across types, then the grand total
        let last = report.len() - 1;
        assert!(report.value(last, "membership_type").unwrap().is_null());
        assert!(report.value(last, "month").unwrap().is_null());
        assert_eq!(money(&report, last, "revenue"), 415.5);
        assert!(report.value(8, "membership_type").unwrap().is_null());
        assert_eq!(money(&report, 8, "revenue"), 140.0);
    }

    #[test]
    fn test_cube_year_is_configurable() {
        let config = ReportConfig {
            cube_year: 2022,
            ..ReportConfig::default()
        };
        let report = ReportCatalog::new(config).membership_revenue_cube(&sample_snapshot()).unwrap();

        // 2022: Basic (Nov), Annual (Jun), Premium (Dec): 3 types × 3 months, sparse
        // (3 detail) + (3 per type) + (3 per month) + (1 total)
        assert_eq!(report.len(), 10);
    }

    #[test]
    fn test_membership_with_unknown_type_is_not_dropped() {
        let mut snapshot = sample_snapshot();
        let date = |m, d| NaiveDate::from_ymd_opt(2023, m, d).unwrap();
        snapshot.memberships.push(Membership::new(99, 42, 1, date(1, 10), date(2, 9), 10.0));

        let report = catalog().membership_revenue_cube(&snapshot).unwrap();
        let last = report.len() - 1;
        assert_eq!(money(&report, last, "revenue"), 425.5);
    }

    #[test]
    fn test_customer_segmentation() {
        let report = catalog().customer_segmentation(&sample_snapshot()).unwrap();

        assert_eq!(
            report.rows,
            vec![
                vec![Value::text("more than 10"), Value::Int(1)],
                vec![Value::text("between 5 and 10"), Value::Int(2)],
                vec![Value::text("fewer than 5"), Value::Int(3)],
            ]
        );
    }

    #[test]
    fn test_customer_without_rentals_counted_as_fewer_than_5() {
        let snapshot = Snapshot {
            customers: vec![crate::entities::Customer::new(1, "Solo", "solo@example.com")],
            ..Snapshot::default()
        };
        let report = catalog().customer_segmentation(&snapshot).unwrap();

        assert_eq!(report.rows, vec![vec![Value::text("fewer than 5"), Value::Int(1)]]);
    }

    #[test]
    fn test_run_all_on_empty_snapshot() {
        let reports = catalog().run_all(&Snapshot::default()).unwrap();

        assert_eq!(reports.len(), ReportKind::ALL.len());
        let rollup = &reports[4];
        assert_eq!(rollup.kind, ReportKind::RentalRevenueRollup);
        // Only the grand total survives, and it is 0, not NULL
        assert_eq!(rollup.rows, vec![vec![Value::Null, Value::Null, Value::Float(0.0)]]);
    }

    struct BikesWithoutCategory;

    impl RelationStore for BikesWithoutCategory {
        fn get(&self, relation: &str) -> Result<Relation> {
            match relation {
                "bike" => Ok(Relation::new("bike", vec!["id".into(), "status".into()])),
                other => Err(ReportError::UnknownRelation(other.to_string())),
            }
        }
    }

    #[test]
    fn test_missing_field_is_invalid_grouping_spec() {
        let err = catalog().bikes_per_category(&BikesWithoutCategory).unwrap_err();
        assert_eq!(err, ReportError::invalid_field("bike", "category"));

        let err = catalog().discounted_pricing(&BikesWithoutCategory).unwrap_err();
        assert_eq!(err, ReportError::invalid_field("bike", "category"));

        let err = catalog().customer_segmentation(&BikesWithoutCategory).unwrap_err();
        assert_eq!(err, ReportError::UnknownRelation("customer".to_string()));
    }
}
