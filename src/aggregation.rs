// 📊 Aggregation Engine - GROUP BY, GROUPING SETS and CUBE over a relation
//
// A plan is:   keys × grouping mode × aggregates
//
// Every grouping mode is lowered to a list of grouping sets, each a mask
// over the keys (true = key participates). A key that does not participate
// in a set is ROLLED UP: its value is replaced by an "ALL" marker in that
// partition's rows.
//
//   simple                  -> [ [1,1] ]
//   grouping_sets({(a,b),(a),()}) -> [ [1,1], [1,0], [0,0] ]
//   cube(a,b)               -> [ [1,1], [1,0], [0,1], [0,0] ]
//
// The engine never sorts. Row order inside a partition is first-seen order.

use crate::error::{ReportError, Result};
use crate::sort::{compare_cells, SortKey};
use crate::store::Relation;
use crate::value::{round_currency, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// GROUPING KEYS
// ============================================================================

/// Which part of the source value a key groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    Value,
    Year,
    Month,
}

/// A grouping key extractor: source column + part, exposed under `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    name: String,
    source: String,
    part: KeyPart,
}

impl GroupKey {
    /// Group on the column itself; the key is named after the bare column.
    pub fn field(source: &str) -> Self {
        GroupKey {
            name: source.rsplit('.').next().unwrap_or(source).to_string(),
            source: source.to_string(),
            part: KeyPart::Value,
        }
    }

    /// `EXTRACT(YEAR FROM source)`, named "year".
    pub fn year(source: &str) -> Self {
        GroupKey {
            name: "year".to_string(),
            source: source.to_string(),
            part: KeyPart::Year,
        }
    }

    /// `EXTRACT(MONTH FROM source)`, named "month".
    pub fn month(source: &str) -> Self {
        GroupKey {
            name: "month".to_string(),
            source: source.to_string(),
            part: KeyPart::Month,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, value: &Value) -> Value {
        match self.part {
            KeyPart::Value => value.clone(),
            KeyPart::Year => value.year(),
            KeyPart::Month => value.month(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupingMode {
    /// One group per distinct key combination.
    Simple,
    /// One partition per listed subset of key names.
    GroupingSets(Vec<Vec<String>>),
    /// Every subset of the keys (2^n partitions), full set first, `()` last.
    Cube,
}

impl GroupingMode {
    pub fn grouping_sets(sets: &[&[&str]]) -> Self {
        GroupingMode::GroupingSets(
            sets.iter()
                .map(|set| set.iter().map(|k| k.to_string()).collect())
                .collect(),
        )
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateFn {
    /// `COUNT(*)`
    CountRows,
    /// `COUNT(field)`: non-null values only
    Count(String),
    /// `COUNT(CASE WHEN field = value THEN 1 END)`
    CountWhere { field: String, equals: Value },
    /// `SUM(field)`: 0 when nothing was summed
    Sum(String),
    /// `AVG(field)`: NULL when nothing was averaged
    Avg(String),
}

impl AggregateFn {
    fn input(&self) -> Option<&str> {
        match self {
            AggregateFn::CountRows => None,
            AggregateFn::Count(field)
            | AggregateFn::CountWhere { field, .. }
            | AggregateFn::Sum(field)
            | AggregateFn::Avg(field) => Some(field),
        }
    }
}

/// A named aggregate reducer.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    name: String,
    func: AggregateFn,
    currency: bool,
}

impl Aggregate {
    pub fn new(name: &str, func: AggregateFn) -> Self {
        Aggregate {
            name: name.to_string(),
            func,
            currency: false,
        }
    }

    pub fn count_rows(name: &str) -> Self {
        Aggregate::new(name, AggregateFn::CountRows)
    }

    pub fn count(name: &str, field: &str) -> Self {
        Aggregate::new(name, AggregateFn::Count(field.to_string()))
    }

    pub fn count_where(name: &str, field: &str, equals: impl Into<Value>) -> Self {
        Aggregate::new(
            name,
            AggregateFn::CountWhere {
                field: field.to_string(),
                equals: equals.into(),
            },
        )
    }

    pub fn sum(name: &str, field: &str) -> Self {
        Aggregate::new(name, AggregateFn::Sum(field.to_string()))
    }

    pub fn avg(name: &str, field: &str) -> Self {
        Aggregate::new(name, AggregateFn::Avg(field.to_string()))
    }

    /// Round to cents when the result is presented.
    pub fn currency(mut self) -> Self {
        self.currency = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_currency(&self) -> bool {
        self.currency
    }
}

#[derive(Debug, Clone)]
enum Accumulator {
    Count(i64),
    Sum { ints: i128, floats: f64, saw_float: bool },
    Avg { total: f64, n: i64 },
}

impl Accumulator {
    fn for_fn(func: &AggregateFn) -> Self {
        match func {
            AggregateFn::CountRows | AggregateFn::Count(_) | AggregateFn::CountWhere { .. } => {
                Accumulator::Count(0)
            }
            AggregateFn::Sum(_) => Accumulator::Sum {
                ints: 0,
                floats: 0.0,
                saw_float: false,
            },
            AggregateFn::Avg(_) => Accumulator::Avg { total: 0.0, n: 0 },
        }
    }

    fn update(&mut self, func: &AggregateFn, input: Option<&Value>) {
        match (self, func) {
            (Accumulator::Count(n), AggregateFn::CountRows) => *n += 1,
            (Accumulator::Count(n), AggregateFn::Count(_)) => {
                if input.is_some_and(|v| !v.is_null()) {
                    *n += 1;
                }
            }
            (Accumulator::Count(n), AggregateFn::CountWhere { equals, .. }) => {
                if input.is_some_and(|v| !v.is_null() && v == equals) {
                    *n += 1;
                }
            }
            (Accumulator::Sum { ints, floats, saw_float }, _) => match input {
                Some(Value::Int(i)) => *ints += i128::from(*i),
                Some(Value::Float(f)) => {
                    *floats += f;
                    *saw_float = true;
                }
                // non-numeric and NULL inputs are skipped
                _ => {}
            },
            (Accumulator::Avg { total, n }, _) => {
                if let Some(x) = input.and_then(Value::as_f64) {
                    *total += x;
                    *n += 1;
                }
            }
            _ => {}
        }
    }

    fn finish(&self) -> Value {
        match self {
            Accumulator::Count(n) => Value::Int(*n),
            Accumulator::Sum { ints, floats, saw_float } => {
                if *saw_float {
                    Value::Float(*floats + *ints as f64)
                } else {
                    i64::try_from(*ints).map_or(Value::Float(*ints as f64), Value::Int)
                }
            }
            Accumulator::Avg { total, n } => {
                if *n == 0 {
                    Value::Null
                } else {
                    Value::Float(total / *n as f64)
                }
            }
        }
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// Widest cube accepted: 2^16 grouping sets.
pub const MAX_CUBE_KEYS: usize = 16;

fn cube_set_count(n: usize) -> Result<u64> {
    if n > MAX_CUBE_KEYS {
        return Err(ReportError::CubeTooWide { keys: n, max: MAX_CUBE_KEYS });
    }
    Ok(1u64 << n)
}

/// A validated grouping specification.
#[derive(Debug, Clone)]
pub struct AggregationPlan {
    keys: Vec<GroupKey>,
    aggregates: Vec<Aggregate>,
    /// One mask per grouping set, same length as `keys`
    masks: Vec<Vec<bool>>,
}

impl AggregationPlan {
    /// Fails with `EmptyAggregateSet` without aggregates, and with
    /// `InvalidGroupingSpec` when a grouping set names an unknown key.
    pub fn new(keys: Vec<GroupKey>, mode: GroupingMode, aggregates: Vec<Aggregate>) -> Result<Self> {
        if aggregates.is_empty() {
            return Err(ReportError::EmptyAggregateSet);
        }

        let n = keys.len();
        let masks = match mode {
            GroupingMode::Simple => vec![vec![true; n]],
            GroupingMode::GroupingSets(sets) => sets
                .iter()
                .map(|set| -> Result<Vec<bool>> {
                    let mut mask = vec![false; n];
                    for member in set {
                        let idx = keys
                            .iter()
                            .position(|k| k.name == *member)
                            .ok_or_else(|| ReportError::invalid_field("grouping keys", member))?;
                        mask[idx] = true;
                    }
                    Ok(mask)
                })
                .collect::<Result<Vec<_>>>()?,
            GroupingMode::Cube => (0..cube_set_count(n)?)
                .rev()
                .map(|bits| (0..n).map(|i| bits & (1 << (n - 1 - i)) != 0).collect())
                .collect(),
        };

        Ok(AggregationPlan { keys, aggregates, masks })
    }

    pub fn grouping_set_count(&self) -> usize {
        self.masks.len()
    }

    /// Group `relation` and reduce every group.
    ///
    /// All field references are bound to the schema before any row is read,
    /// so an unknown field fails with `InvalidGroupingSpec` even on an empty
    /// relation.
    pub fn execute(&self, relation: &Relation) -> Result<Grouped> {
        let key_columns = self
            .keys
            .iter()
            .map(|k| relation.require_column(&k.source))
            .collect::<Result<Vec<_>>>()?;
        let input_columns = self
            .aggregates
            .iter()
            .map(|a| a.func.input().map(|f| relation.require_column(f)).transpose())
            .collect::<Result<Vec<_>>>()?;

        let row_keys: Vec<Vec<Value>> = relation
            .rows()
            .iter()
            .map(|row| {
                self.keys
                    .iter()
                    .zip(&key_columns)
                    .map(|(key, &col)| key.extract(&row[col]))
                    .collect()
            })
            .collect();

        let mut rows = Vec::new();
        for (set, mask) in self.masks.iter().enumerate() {
            let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
            let mut groups: Vec<(Vec<Value>, Vec<Accumulator>)> = Vec::new();

            for (row, keys) in relation.rows().iter().zip(&row_keys) {
                let group_key: Vec<Value> = keys
                    .iter()
                    .zip(mask)
                    .map(|(v, &included)| if included { v.clone() } else { Value::Null })
                    .collect();

                let slot = match index.get(&group_key) {
                    Some(&slot) => slot,
                    None => {
                        groups.push((group_key.clone(), self.fresh_accumulators()));
                        index.insert(group_key, groups.len() - 1);
                        groups.len() - 1
                    }
                };

                for ((acc, agg), input) in groups[slot].1.iter_mut().zip(&self.aggregates).zip(&input_columns) {
                    acc.update(&agg.func, input.map(|col| &row[col]));
                }
            }

            // GROUP BY () over no rows still yields its single total row
            if groups.is_empty() && mask.iter().all(|included| !included) {
                groups.push((vec![Value::Null; self.keys.len()], self.fresh_accumulators()));
            }

            let rolled_up: Vec<bool> = mask.iter().map(|included| !included).collect();
            rows.extend(groups.into_iter().map(|(keys, accs)| GroupedRow {
                grouping_set: set,
                rolled_up: rolled_up.clone(),
                keys,
                values: accs.iter().map(Accumulator::finish).collect(),
            }));
        }

        debug!(
            relation = relation.name(),
            input_rows = relation.len(),
            grouping_sets = self.masks.len(),
            output_rows = rows.len(),
            "aggregation executed"
        );

        Ok(Grouped {
            source: relation.name().to_string(),
            key_names: self.keys.iter().map(|k| k.name.clone()).collect(),
            aggregates: self.aggregates.clone(),
            rows,
        })
    }

    fn fresh_accumulators(&self) -> Vec<Accumulator> {
        self.aggregates.iter().map(|a| Accumulator::for_fn(&a.func)).collect()
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// One output row: key values (NULL where rolled up) plus aggregate values.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    /// Index of the grouping set this row belongs to
    pub grouping_set: usize,
    /// Per key: true when the key is rolled up ("ALL") in this row
    pub rolled_up: Vec<bool>,
    pub keys: Vec<Value>,
    pub values: Vec<Value>,
}

impl GroupedRow {
    pub fn is_grand_total(&self) -> bool {
        self.rolled_up.iter().all(|r| *r)
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Key(usize),
    Aggregate(usize),
}

/// Output of an aggregation plan, unsorted and unrounded.
#[derive(Debug, Clone)]
pub struct Grouped {
    source: String,
    key_names: Vec<String>,
    aggregates: Vec<Aggregate>,
    rows: Vec<GroupedRow>,
}

impl Grouped {
    pub fn rows(&self) -> &[GroupedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, name: &str) -> Result<Column> {
        if let Some(idx) = self.key_names.iter().position(|k| k == name) {
            return Ok(Column::Key(idx));
        }
        self.aggregates
            .iter()
            .position(|a| a.name == name)
            .map(Column::Aggregate)
            .ok_or_else(|| ReportError::invalid_field(&self.source, name))
    }

    /// Raw value of a key or aggregate column in `row`.
    pub fn value<'a>(&self, row: &'a GroupedRow, name: &str) -> Result<&'a Value> {
        Ok(match self.column(name)? {
            Column::Key(i) => &row.keys[i],
            Column::Aggregate(i) => &row.values[i],
        })
    }

    /// HAVING: keep rows for which `predicate` holds on column `name`.
    pub fn having<P>(mut self, name: &str, predicate: P) -> Result<Self>
    where
        P: Fn(&Value) -> bool,
    {
        let column = self.column(name)?;
        self.rows.retain(|row| match column {
            Column::Key(i) => predicate(&row.keys[i]),
            Column::Aggregate(i) => predicate(&row.values[i]),
        });
        Ok(self)
    }

    /// Stable sort; rolled-up keys sort after every value of their dimension.
    pub fn sort_by(&mut self, keys: &[SortKey]) -> Result<()> {
        let resolved = keys
            .iter()
            .map(|k| Ok((self.column(&k.column)?, k.order)))
            .collect::<Result<Vec<_>>>()?;

        self.rows.sort_by(|a, b| {
            for (column, order) in &resolved {
                let cmp = match *column {
                    Column::Key(i) => compare_cells(&a.keys[i], a.rolled_up[i], &b.keys[i], b.rolled_up[i], *order),
                    Column::Aggregate(i) => compare_cells(&a.values[i], false, &b.values[i], false, *order),
                };
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        Ok(())
    }

    /// Presentation form: keys then aggregates, rolled-up keys as NULL,
    /// currency aggregates rounded to cents.
    pub fn into_relation(self, name: &str) -> Relation {
        let mut columns = self.key_names.clone();
        columns.extend(self.aggregates.iter().map(|a| a.name.clone()));

        let aggregates = self.aggregates;
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let mut out = row.keys;
                out.extend(row.values.into_iter().zip(&aggregates).map(|(value, agg)| {
                    match (agg.currency, value.as_f64()) {
                        (true, Some(amount)) => Value::Float(round_currency(amount)),
                        _ => value,
                    }
                }));
                out
            })
            .collect();

        Relation::with_rows(name, columns, rows)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortKey;
    use chrono::NaiveDate;

    fn sales() -> Relation {
        let date = |y, m, d| Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        Relation::with_rows(
            "sale",
            vec!["region".into(), "day".into(), "amount".into(), "note".into()],
            vec![
                vec![Value::text("north"), date(2022, 1, 3), Value::Float(10.0), Value::text("a")],
                vec![Value::text("north"), date(2022, 2, 9), Value::Float(5.5), Value::Null],
                vec![Value::text("south"), date(2022, 1, 20), Value::Float(7.25), Value::text("b")],
                vec![Value::text("south"), date(2023, 1, 1), Value::Float(2.0), Value::Null],
            ],
        )
    }

    #[test]
    fn test_empty_aggregate_set_rejected() {
        let err = AggregationPlan::new(vec![GroupKey::field("region")], GroupingMode::Simple, vec![]).unwrap_err();
        assert_eq!(err, ReportError::EmptyAggregateSet);
    }

    #[test]
    fn test_unknown_key_rejected_before_reading_rows() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("colour")],
            GroupingMode::Simple,
            vec![Aggregate::count_rows("n")],
        )
        .unwrap();

        let empty = Relation::new("sale", vec!["region".into()]);
        let err = plan.execute(&empty).unwrap_err();
        assert_eq!(err, ReportError::invalid_field("sale", "colour"));
    }

    #[test]
    fn test_unknown_aggregate_input_rejected() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("region")],
            GroupingMode::Simple,
            vec![Aggregate::sum("total", "price")],
        )
        .unwrap();

        assert!(matches!(
            plan.execute(&sales()),
            Err(ReportError::InvalidGroupingSpec { .. })
        ));
    }

    #[test]
    fn test_grouping_set_member_must_be_a_key() {
        let err = AggregationPlan::new(
            vec![GroupKey::field("region")],
            GroupingMode::grouping_sets(&[&["region"], &["year"]]),
            vec![Aggregate::count_rows("n")],
        )
        .unwrap_err();

        assert_eq!(err, ReportError::invalid_field("grouping keys", "year"));
    }

    #[test]
    fn test_simple_group_by_with_counts_and_sum() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("region")],
            GroupingMode::Simple,
            vec![
                Aggregate::count_rows("rows"),
                Aggregate::count("notes", "note"),
                Aggregate::sum("total", "amount"),
                Aggregate::avg("mean", "amount"),
            ],
        )
        .unwrap();

        let grouped = plan.execute(&sales()).unwrap();
        assert_eq!(grouped.len(), 2);

        let north = &grouped.rows()[0];
        assert_eq!(north.keys, vec![Value::text("north")]);
        assert_eq!(north.values[0], Value::Int(2));
        assert_eq!(north.values[1], Value::Int(1)); // NULL note not counted
        assert_eq!(north.values[2], Value::Float(15.5));
        assert_eq!(north.values[3], Value::Float(7.75));
    }

    #[test]
    fn test_count_where() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("region")],
            GroupingMode::Simple,
            vec![
                Aggregate::count_where("with_a", "note", "a"),
                Aggregate::count_where("with_z", "note", "z"),
            ],
        )
        .unwrap();

        let grouped = plan.execute(&sales()).unwrap();
        assert_eq!(grouped.rows()[0].values, vec![Value::Int(1), Value::Int(0)]);
        assert_eq!(grouped.rows()[1].values, vec![Value::Int(0), Value::Int(0)]);
    }

    #[test]
    fn test_sum_of_nothing_is_zero_and_avg_is_null() {
        let relation = Relation::with_rows(
            "t",
            vec!["k".into(), "x".into()],
            vec![vec![Value::text("a"), Value::Null]],
        );
        let plan = AggregationPlan::new(
            vec![GroupKey::field("k")],
            GroupingMode::Simple,
            vec![Aggregate::sum("s", "x"), Aggregate::avg("a", "x")],
        )
        .unwrap();

        let grouped = plan.execute(&relation).unwrap();
        assert_eq!(grouped.rows()[0].values, vec![Value::Int(0), Value::Null]);
    }

    #[test]
    fn test_grouping_sets_rollup_laws() {
        let plan = AggregationPlan::new(
            vec![GroupKey::year("day"), GroupKey::month("day")],
            GroupingMode::grouping_sets(&[&["year", "month"], &["year"], &[]]),
            vec![Aggregate::sum("total", "amount")],
        )
        .unwrap();
        assert_eq!(plan.grouping_set_count(), 3);

        let grouped = plan.execute(&sales()).unwrap();
        // 2022-01, 2022-02, 2023-01 | 2022, 2023 | ()
        assert_eq!(grouped.len(), 6);

        let total_for = |set: usize| -> f64 {
            grouped
                .rows()
                .iter()
                .filter(|r| r.grouping_set == set)
                .map(|r| r.values[0].as_f64().unwrap())
                .sum()
        };
        assert_eq!(total_for(0), total_for(1));
        assert_eq!(total_for(1), total_for(2));

        let grand: Vec<_> = grouped.rows().iter().filter(|r| r.is_grand_total()).collect();
        assert_eq!(grand.len(), 1);
        assert_eq!(grand[0].values[0], Value::Float(24.75));
    }

    #[test]
    fn test_cube_expands_power_set() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("region"), GroupKey::year("day")],
            GroupingMode::Cube,
            vec![Aggregate::count_rows("n")],
        )
        .unwrap();
        assert_eq!(plan.grouping_set_count(), 4);

        let grouped = plan.execute(&sales()).unwrap();
        // (region,year): north/2022, south/2022, south/2023
        // (region): 2, (year): 2, (): 1
        assert_eq!(grouped.len(), 3 + 2 + 2 + 1);

        let masks: Vec<Vec<bool>> = grouped.rows().iter().map(|r| r.rolled_up.clone()).collect();
        assert_eq!(masks[0], vec![false, false]);
        assert_eq!(masks.last().unwrap(), &vec![true, true]);
    }

    #[test]
    fn test_cube_width_is_bounded() {
        let keys: Vec<GroupKey> = (0..=MAX_CUBE_KEYS).map(|i| GroupKey::field(&format!("k{}", i))).collect();
        let err = AggregationPlan::new(keys, GroupingMode::Cube, vec![Aggregate::count_rows("n")]).unwrap_err();
        assert_eq!(err, ReportError::CubeTooWide { keys: MAX_CUBE_KEYS + 1, max: MAX_CUBE_KEYS });

        let keys: Vec<GroupKey> = (0..64).map(|i| GroupKey::field(&format!("k{}", i))).collect();
        assert!(AggregationPlan::new(keys, GroupingMode::Cube, vec![Aggregate::count_rows("n")]).is_err());
    }

    #[test]
    fn test_integer_sum_does_not_overflow() {
        let relation = Relation::with_rows(
            "big",
            vec!["amount".into()],
            vec![vec![Value::Int(i64::MAX)], vec![Value::Int(i64::MAX)], vec![Value::Int(-5)]],
        );
        let plan = AggregationPlan::new(vec![], GroupingMode::Simple, vec![Aggregate::sum("total", "amount")]).unwrap();
        let grouped = plan.execute(&relation).unwrap();
        assert_eq!(grouped.rows()[0].values[0], Value::Float(i64::MAX as f64 * 2.0));

        let small = Relation::with_rows("small", vec!["amount".into()], vec![vec![Value::Int(i64::MAX)], vec![Value::Int(-1)]]);
        let grouped = plan.execute(&small).unwrap();
        assert_eq!(grouped.rows()[0].values[0], Value::Int(i64::MAX - 1));
    }

    #[test]
    fn test_grand_total_over_empty_input() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("region")],
            GroupingMode::Cube,
            vec![Aggregate::count_rows("n"), Aggregate::sum("total", "amount")],
        )
        .unwrap();

        let empty = Relation::new("sale", vec!["region".into(), "amount".into()]);
        let grouped = plan.execute(&empty).unwrap();

        assert_eq!(grouped.len(), 1);
        assert!(grouped.rows()[0].is_grand_total());
        assert_eq!(grouped.rows()[0].values, vec![Value::Int(0), Value::Int(0)]);
    }

    #[test]
    fn test_sort_puts_rollups_after_details() {
        let plan = AggregationPlan::new(
            vec![GroupKey::year("day"), GroupKey::month("day")],
            GroupingMode::grouping_sets(&[&["year", "month"], &["year"], &[]]),
            vec![Aggregate::sum("total", "amount").currency()],
        )
        .unwrap();

        let mut grouped = plan.execute(&sales()).unwrap();
        grouped.sort_by(&[SortKey::asc("year"), SortKey::asc("month")]).unwrap();
        let relation = grouped.into_relation("revenue");

        let cells: Vec<(String, String)> = relation
            .rows()
            .iter()
            .map(|r| (r[0].to_string(), r[1].to_string()))
            .collect();
        let expected = [
            ("2022", "1"),
            ("2022", "2"),
            ("2022", "NULL"),
            ("2023", "1"),
            ("2023", "NULL"),
            ("NULL", "NULL"),
        ];
        let expected: Vec<(String, String)> =
            expected.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect();
        assert_eq!(cells, expected);
        assert_eq!(relation.columns(), &["year", "month", "total"]);
    }

    #[test]
    fn test_having_filters_groups() {
        let plan = AggregationPlan::new(
            vec![GroupKey::field("region")],
            GroupingMode::Simple,
            vec![Aggregate::sum("total", "amount")],
        )
        .unwrap();

        let grouped = plan
            .execute(&sales())
            .unwrap()
            .having("total", |v| v.as_f64().is_some_and(|t| t > 10.0))
            .unwrap();

        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.value(&grouped.rows()[0], "region").unwrap(), &Value::text("north"));
    }

    #[test]
    fn test_currency_rounded_only_on_presentation() {
        let relation = Relation::with_rows(
            "t",
            vec!["k".into(), "x".into()],
            vec![
                vec![Value::text("a"), Value::Float(0.005)],
                vec![Value::text("a"), Value::Float(0.005)],
                vec![Value::text("a"), Value::Float(1.0)],
            ],
        );
        let plan = AggregationPlan::new(
            vec![GroupKey::field("k")],
            GroupingMode::Simple,
            vec![Aggregate::sum("s", "x").currency()],
        )
        .unwrap();

        let grouped = plan.execute(&relation).unwrap();
        // Accumulation is unrounded: 0.005 + 0.005 + 1.0
        assert!((grouped.rows()[0].values[0].as_f64().unwrap() - 1.01).abs() < 1e-9);

        let presented = grouped.into_relation("t");
        assert_eq!(presented.rows()[0][1], Value::Float(1.01));
    }
}
