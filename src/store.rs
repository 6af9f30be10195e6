// 🗃️ Relation Store - in-memory tabular snapshot of the rental dataset
//
// The reporting core only ever asks a store for two things:
//   get(relation)                      -> Relation
//   join(left, right, kind, predicate) -> Relation
//
// Joined relations qualify every column with its source relation
// ("customer.name", "membership.id"). Field lookups accept either the
// qualified name or a bare name when that bare name is unambiguous.

use crate::entities::{
    Bike, Customer, Entity, Membership, MembershipType, QualityIssue, Rental,
};
use crate::error::{ReportError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

static NULL: Value = Value::Null;

// ============================================================================
// RELATION
// ============================================================================

/// A named, homogeneous table of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Relation {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Relation {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut relation = Relation::new(name, columns);
        for row in rows {
            relation.push_row(row);
        }
        relation
    }

    pub fn from_entities<E: Entity>(entities: &[E]) -> Self {
        let columns = E::COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = entities.iter().map(Entity::to_row).collect();
        Relation::with_rows(E::RELATION, columns, rows)
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch in '{}'", self.name);
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `field`, by qualified name or unambiguous bare name.
    pub fn column_index(&self, field: &str) -> Option<usize> {
        resolve_column(&self.columns, field)
    }

    /// Like `column_index`, but a missing field is a grouping-spec error.
    pub fn require_column(&self, field: &str) -> Result<usize> {
        self.column_index(field)
            .ok_or_else(|| ReportError::invalid_field(&self.name, field))
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            columns: &self.columns,
            values,
        })
    }

    /// Rows for which `predicate` holds.
    pub fn filter<P>(&self, predicate: P) -> Relation
    where
        P: Fn(&Record<'_>) -> bool,
    {
        let rows = self
            .records()
            .filter(|record| predicate(record))
            .map(|record| record.values.to_vec())
            .collect();
        Relation::with_rows(self.name.clone(), self.columns.clone(), rows)
    }

    /// Append a computed column.
    pub fn derive<F>(&self, column: &str, compute: F) -> Relation
    where
        F: Fn(&Record<'_>) -> Value,
    {
        let mut columns = self.columns.clone();
        columns.push(column.to_string());

        let rows = self
            .records()
            .map(|record| {
                let mut row = record.values.to_vec();
                row.push(compute(&record));
                row
            })
            .collect();
        Relation::with_rows(self.name.clone(), columns, rows)
    }

    /// Keep `fields` (in that order), renamed to their bare names.
    pub fn project(&self, fields: &[&str]) -> Result<Relation> {
        let indices = fields
            .iter()
            .map(|f| self.require_column(f))
            .collect::<Result<Vec<_>>>()?;
        let columns = fields
            .iter()
            .map(|f| f.rsplit('.').next().unwrap_or(*f).to_string())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Relation::with_rows(self.name.clone(), columns, rows))
    }

    /// Copy with every bare column prefixed by the relation name.
    pub fn qualified(&self) -> Relation {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.contains('.') {
                    c.clone()
                } else {
                    format!("{}.{}", self.name, c)
                }
            })
            .collect();
        Relation {
            name: self.name.clone(),
            columns,
            rows: self.rows.clone(),
        }
    }
}

fn resolve_column(columns: &[String], field: &str) -> Option<usize> {
    if let Some(idx) = columns.iter().position(|c| c == field) {
        return Some(idx);
    }
    if field.contains('.') {
        return None;
    }

    let mut matches = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.rsplit('.').next() == Some(field));
    match (matches.next(), matches.next()) {
        (Some((idx, _)), None) => Some(idx),
        _ => None,
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Borrowed view of one row with field-name access.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Value of `field`; NULL when the field does not exist.
    pub fn get(&self, field: &str) -> &'a Value {
        resolve_column(self.columns, field)
            .map(|idx| &self.values[idx])
            .unwrap_or(&NULL)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

// ============================================================================
// JOINS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    /// Keeps every left row; a left row without partner is padded with NULLs.
    LeftOuter,
}

/// Equality predicate on one field of each side. NULL never matches.
pub fn on_eq<'f>(left_field: &'f str, right_field: &'f str) -> impl Fn(&Record<'_>, &Record<'_>) -> bool + 'f {
    move |left: &Record<'_>, right: &Record<'_>| {
        let l = left.get(left_field);
        !l.is_null() && l == right.get(right_field)
    }
}

/// Nested-loop join of two relations; output columns are qualified.
pub fn nested_loop_join(
    left: &Relation,
    right: &Relation,
    kind: JoinKind,
    predicate: &dyn Fn(&Record<'_>, &Record<'_>) -> bool,
) -> Relation {
    let left = left.qualified();
    let right = right.qualified();

    let mut columns = left.columns.clone();
    columns.extend(right.columns.iter().cloned());
    let mut joined = Relation::new(format!("{}_{}", left.name, right.name), columns);

    let mut gaps = 0;
    for l in left.records() {
        let mut matched = false;
        for r in right.records() {
            if predicate(&l, &r) {
                matched = true;
                let mut row = l.values.to_vec();
                row.extend(r.values.iter().cloned());
                joined.push_row(row);
            }
        }

        if !matched && kind == JoinKind::LeftOuter {
            gaps += 1;
            let mut row = l.values.to_vec();
            row.extend(std::iter::repeat(Value::Null).take(right.columns.len()));
            joined.push_row(row);
        }
    }

    if gaps > 0 {
        debug!(
            left = %left.name,
            right = %right.name,
            gaps,
            "left-outer join padded unmatched rows with NULLs"
        );
    }

    joined
}

/// Source of relation snapshots for the report catalog.
pub trait RelationStore {
    /// Full relation by name.
    fn get(&self, relation: &str) -> Result<Relation>;

    fn join(
        &self,
        left: &Relation,
        right: &Relation,
        kind: JoinKind,
        predicate: &dyn Fn(&Record<'_>, &Record<'_>) -> bool,
    ) -> Relation {
        nested_loop_join(left, right, kind, predicate)
    }
}

// ============================================================================
// REFERENTIAL GAPS
// ============================================================================

/// A foreign key with no matching row on the referenced side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferentialGap {
    pub relation: String,
    pub id: i64,
    pub foreign_key: String,
    pub references: String,
    pub missing_id: i64,
}

impl fmt::Display for ReferentialGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} #{}] {} = {} has no row in {}",
            self.relation, self.id, self.foreign_key, self.missing_id, self.references
        )
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable in-memory copy of the five relations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub bikes: Vec<Bike>,
    pub rentals: Vec<Rental>,
    pub membership_types: Vec<MembershipType>,
    pub memberships: Vec<Membership>,
}

impl Snapshot {
    pub const RELATIONS: [&'static str; 5] = [
        Customer::RELATION,
        Bike::RELATION,
        Rental::RELATION,
        MembershipType::RELATION,
        Membership::RELATION,
    ];

    pub fn row_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (Customer::RELATION, self.customers.len()),
            (Bike::RELATION, self.bikes.len()),
            (Rental::RELATION, self.rentals.len()),
            (MembershipType::RELATION, self.membership_types.len()),
            (Membership::RELATION, self.memberships.len()),
        ]
    }

    /// Every broken row-level invariant plus duplicate ids.
    pub fn validate(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        check_entities(&self.customers, &mut issues);
        check_entities(&self.bikes, &mut issues);
        check_entities(&self.rentals, &mut issues);
        check_entities(&self.membership_types, &mut issues);
        check_entities(&self.memberships, &mut issues);
        issues
    }

    /// Foreign keys pointing at rows that do not exist.
    pub fn referential_gaps(&self) -> Vec<ReferentialGap> {
        let customers: HashSet<i64> = self.customers.iter().map(|c| c.id).collect();
        let bikes: HashSet<i64> = self.bikes.iter().map(|b| b.id).collect();
        let types: HashSet<i64> = self.membership_types.iter().map(|t| t.id).collect();

        let mut gaps = Vec::new();
        let mut check = |relation: &str, id: i64, foreign_key: &str, references: &str, known: &HashSet<i64>, key: i64| {
            if !known.contains(&key) {
                gaps.push(ReferentialGap {
                    relation: relation.to_string(),
                    id,
                    foreign_key: foreign_key.to_string(),
                    references: references.to_string(),
                    missing_id: key,
                });
            }
        };

        for rental in &self.rentals {
            check(Rental::RELATION, rental.id, "customer_id", Customer::RELATION, &customers, rental.customer_id);
            check(Rental::RELATION, rental.id, "bike_id", Bike::RELATION, &bikes, rental.bike_id);
        }
        for membership in &self.memberships {
            check(Membership::RELATION, membership.id, "customer_id", Customer::RELATION, &customers, membership.customer_id);
            check(
                Membership::RELATION,
                membership.id,
                "membership_type_id",
                MembershipType::RELATION,
                &types,
                membership.membership_type_id,
            );
        }

        gaps
    }
}

fn check_entities<E: Entity>(entities: &[E], issues: &mut Vec<QualityIssue>) {
    let mut seen: HashMap<i64, usize> = HashMap::new();
    for entity in entities {
        issues.extend(entity.validate());

        let count = seen.entry(entity.id()).or_insert(0);
        *count += 1;
        if *count == 2 {
            issues.push(QualityIssue::new(E::RELATION, entity.id(), "id", "duplicate id"));
        }
    }
}

impl RelationStore for Snapshot {
    fn get(&self, relation: &str) -> Result<Relation> {
        match relation {
            Customer::RELATION => Ok(Relation::from_entities(&self.customers)),
            Bike::RELATION => Ok(Relation::from_entities(&self.bikes)),
            Rental::RELATION => Ok(Relation::from_entities(&self.rentals)),
            MembershipType::RELATION => Ok(Relation::from_entities(&self.membership_types)),
            Membership::RELATION => Ok(Relation::from_entities(&self.memberships)),
            other => Err(ReportError::UnknownRelation(other.to_string())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BikeStatus;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn small_snapshot() -> Snapshot {
        Snapshot {
            customers: vec![
                Customer::new(1, "Ana", "ana@example.com"),
                Customer::new(2, "Ben", "ben@example.com"),
            ],
            bikes: vec![Bike::new(1, "Cube", "road bike", 8.0, 40.0, BikeStatus::Available)],
            rentals: vec![],
            membership_types: vec![MembershipType::new(1, "Basic", "Weekdays", 100.0)],
            memberships: vec![
                Membership::new(1, 1, 1, date(2023, 1, 1), date(2023, 1, 31), 100.0),
                Membership::new(2, 1, 1, date(2023, 2, 1), date(2023, 2, 28), 100.0),
                Membership::new(3, 9, 42, date(2023, 3, 1), date(2023, 3, 31), 100.0),
            ],
        }
    }

    #[test]
    fn test_get_known_and_unknown_relations() {
        let snapshot = small_snapshot();

        let customers = snapshot.get("customer").unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers.columns(), &["id", "name", "email"]);

        let err = snapshot.get("invoice").unwrap_err();
        assert_eq!(err, ReportError::UnknownRelation("invoice".to_string()));
    }

    #[test]
    fn test_left_join_keeps_customers_without_memberships() {
        let snapshot = small_snapshot();
        let customers = snapshot.get("customer").unwrap();
        let memberships = snapshot.get("membership").unwrap();

        let joined = snapshot.join(
            &customers,
            &memberships,
            JoinKind::LeftOuter,
            &on_eq("customer.id", "membership.customer_id"),
        );

        // Ana twice (two memberships), Ben once padded with NULLs
        assert_eq!(joined.len(), 3);
        let ben: Vec<_> = joined
            .records()
            .filter(|r| r.get("customer.name") == &Value::text("Ben"))
            .collect();
        assert_eq!(ben.len(), 1);
        assert!(ben[0].get("membership.id").is_null());
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let snapshot = small_snapshot();
        let customers = snapshot.get("customer").unwrap();
        let memberships = snapshot.get("membership").unwrap();

        let joined = snapshot.join(
            &customers,
            &memberships,
            JoinKind::Inner,
            &on_eq("customer.id", "membership.customer_id"),
        );

        assert_eq!(joined.len(), 2);
        assert_eq!(joined.name(), "customer_membership");
    }

    #[test]
    fn test_bare_names_resolve_only_when_unambiguous() {
        let snapshot = small_snapshot();
        let joined = snapshot.join(
            &snapshot.get("customer").unwrap(),
            &snapshot.get("membership").unwrap(),
            JoinKind::Inner,
            &on_eq("id", "customer_id"),
        );

        assert!(joined.column_index("email").is_some());
        assert!(joined.column_index("start_date").is_some());
        // "id" exists on both sides
        assert!(joined.column_index("id").is_none());
        assert!(matches!(
            joined.require_column("id"),
            Err(ReportError::InvalidGroupingSpec { .. })
        ));
    }

    #[test]
    fn test_null_keys_never_match() {
        let left = Relation::with_rows("l", vec!["k".into()], vec![vec![Value::Null]]);
        let right = Relation::with_rows("r", vec!["k".into()], vec![vec![Value::Null]]);

        let joined = nested_loop_join(&left, &right, JoinKind::Inner, &on_eq("l.k", "r.k"));
        assert!(joined.is_empty());
    }

    #[test]
    fn test_filter_and_derive() {
        let snapshot = small_snapshot();
        let memberships = snapshot.get("membership").unwrap();

        let february = memberships
            .derive("month", |r| r.get("start_date").month())
            .filter(|r| r.get("month") == &Value::Int(2));

        assert_eq!(february.len(), 1);
        assert_eq!(february.columns().last().unwrap(), "month");
    }

    #[test]
    fn test_referential_gaps_reported() {
        let snapshot = small_snapshot();
        let gaps = snapshot.referential_gaps();

        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].foreign_key, "customer_id");
        assert_eq!(gaps[0].missing_id, 42);
        assert_eq!(gaps[1].references, "membership_type");
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let mut snapshot = small_snapshot();
        snapshot.customers.push(Customer::new(1, "Ana again", "a2@example.com"));
        snapshot.customers.push(Customer::new(1, "Ana thrice", "a3@example.com"));

        let issues = snapshot.validate();
        let duplicates: Vec<_> = issues.iter().filter(|i| i.message == "duplicate id").collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].relation, "customer");
    }
}
