// ↕️ Sorting - multi-key ordering of report rows
//
// Placement within one sort key, regardless of direction:
//   real values (ordered asc/desc) < NULL < rolled-up marker
// so detail rows come first, then their subtotal, then the grand total.

use crate::error::Result;
use crate::store::Relation;
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    #[inline]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// One column of an ORDER BY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            order: SortOrder::Descending,
        }
    }
}

/// Compare two cells of the same sort key. `*_rolled` marks a rolled-up
/// dimension, which sorts after everything else.
pub fn compare_cells(a: &Value, a_rolled: bool, b: &Value, b_rolled: bool, order: SortOrder) -> Ordering {
    fn placement(value: &Value, rolled: bool) -> u8 {
        if rolled {
            2
        } else if value.is_null() {
            1
        } else {
            0
        }
    }

    match (placement(a, a_rolled), placement(b, b_rolled)) {
        (0, 0) => order.apply(a.cmp(b)),
        (pa, pb) => pa.cmp(&pb),
    }
}

/// Stable in-place sort of a relation's rows.
pub fn sort_relation(relation: &mut Relation, keys: &[SortKey]) -> Result<()> {
    let resolved = keys
        .iter()
        .map(|key| Ok((relation.require_column(&key.column)?, key.order)))
        .collect::<Result<Vec<_>>>()?;

    relation.rows_mut().sort_by(|a, b| {
        for (idx, order) in &resolved {
            let cmp = compare_cells(&a[*idx], false, &b[*idx], false, *order);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });

    Ok(())
}
