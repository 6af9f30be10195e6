// ⚠️ Report Errors - construction-time failures of the reporting core
//
// Every error here is raised while a report is being composed (a plan is
// bound to a relation schema, a config is validated), before any row is
// read. Bad or missing data never produces an error: it degrades to
// null / 0 instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// A grouping key, grouping-set member, or aggregate input names a
    /// column the relation does not have.
    #[error("invalid grouping spec: relation '{relation}' has no field '{field}'")]
    InvalidGroupingSpec { relation: String, field: String },

    /// A cube over more keys than its grouping sets can be enumerated for.
    #[error("invalid grouping spec: cube over {keys} keys exceeds the limit of {max}")]
    CubeTooWide { keys: usize, max: usize },

    /// An aggregation plan was built without any aggregate.
    #[error("aggregation plan defines no aggregates")]
    EmptyAggregateSet,

    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    #[error("unknown report: {0}")]
    UnknownReport(String),

    #[error("invalid report config: {0}")]
    InvalidConfig(String),
}

impl ReportError {
    pub fn invalid_field(relation: &str, field: &str) -> Self {
        ReportError::InvalidGroupingSpec {
            relation: relation.to_string(),
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ReportError::invalid_field("bike", "colour");
        assert_eq!(
            err.to_string(),
            "invalid grouping spec: relation 'bike' has no field 'colour'"
        );
        assert_eq!(
            ReportError::EmptyAggregateSet.to_string(),
            "aggregation plan defines no aggregates"
        );
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(ReportError::UnknownReport("nope".to_string()))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(err.downcast_ref::<ReportError>().is_some());
    }
}
