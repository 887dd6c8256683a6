//! Positional naming of call results.

use crate::datum::{Datum, DatumMap};
use crate::error::{JournalError, Result};

/// Name for one positional result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultName {
    Named(String),
    /// Leave this result out of the journaled mapping.
    Ignore,
}

/// Skips the result at this position.
pub const IGNORE: ResultName = ResultName::Ignore;

impl From<&str> for ResultName {
    fn from(name: &str) -> Self {
        ResultName::Named(name.to_owned())
    }
}

impl From<String> for ResultName {
    fn from(name: String) -> Self {
        ResultName::Named(name)
    }
}

/// Ordered result names. Empty means results are journaled as returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultNames(Vec<ResultName>);

impl ResultNames {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ResultNames {
    fn from(name: &str) -> Self {
        ResultNames(vec![name.into()])
    }
}

impl From<ResultName> for ResultNames {
    fn from(name: ResultName) -> Self {
        ResultNames(vec![name])
    }
}

impl<const N: usize> From<[ResultName; N]> for ResultNames {
    fn from(names: [ResultName; N]) -> Self {
        ResultNames(names.into())
    }
}

impl<const N: usize> From<[&str; N]> for ResultNames {
    fn from(names: [&str; N]) -> Self {
        ResultNames(names.iter().map(|n| ResultName::from(*n)).collect())
    }
}

impl From<Vec<ResultName>> for ResultNames {
    fn from(names: Vec<ResultName>) -> Self {
        ResultNames(names)
    }
}

/// Maps results onto `names` positionally.
///
/// Without names the results are returned untouched. Otherwise a sequence is
/// split into its elements and any other value counts as a single result; the
/// counts must match exactly. Positions named [`IGNORE`] are left out.
pub fn map_results(results: Datum, names: &ResultNames) -> Result<Datum> {
    if names.is_empty() {
        return Ok(results);
    }
    let values = match results {
        Datum::Seq(values) => values,
        single => vec![single],
    };
    if values.len() != names.len() {
        return Err(JournalError::ResultNameMapping {
            names: names.len(),
            results: values.len(),
        });
    }

    let mut mapped = DatumMap::new();
    for (name, value) in names.0.iter().zip(values) {
        if let ResultName::Named(name) = name {
            mapped.insert(name.as_str(), value);
        }
    }
    Ok(Datum::Map(mapped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::ToDatum;
    use serde_json::json;

    fn pair() -> Datum {
        ("a", "b").to_datum()
    }

    #[test]
    fn single_name() {
        let mapped = map_results(vec!["a"].to_datum(), &"a".into()).unwrap();
        assert_eq!(mapped, Datum::from(json!({"a": "a"})));
    }

    #[test]
    fn single_result() {
        let mapped = map_results("a".to_datum(), &"a".into()).unwrap();
        assert_eq!(mapped, Datum::from(json!({"a": "a"})));
    }

    #[test]
    fn no_names_is_identity() {
        for results in [pair(), "a".to_datum(), Datum::Null, Datum::from(json!({"k": [1]}))] {
            assert_eq!(map_results(results.clone(), &ResultNames::default()).unwrap(), results);
        }
    }

    #[test]
    fn all_mapped() {
        let mapped = map_results(pair(), &["x", "y"].into()).unwrap();
        assert_eq!(mapped, Datum::from(json!({"x": "a", "y": "b"})));
    }

    #[test]
    fn some_mapped() {
        let mapped = map_results(pair(), &["x".into(), IGNORE].into()).unwrap();
        assert_eq!(mapped, Datum::from(json!({"x": "a"})));
    }

    #[test]
    fn order_follows_names() {
        let mapped = map_results((1, 2, 3).to_datum(), &["c", "a", "b"].into()).unwrap();
        let Datum::Map(map) = mapped else {
            panic!("expected a mapping");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), ["c", "a", "b"]);
    }

    #[test]
    fn mismatch() {
        let err = map_results(pair(), &"x".into()).unwrap_err();
        assert!(matches!(
            err,
            JournalError::ResultNameMapping { names: 1, results: 2 }
        ));
    }

    #[test]
    fn ignore_is_not_a_name() {
        let mapped = map_results(pair(), &["Ignore", "IGNORE"].into()).unwrap();
        assert_eq!(mapped, Datum::from(json!({"Ignore": "a", "IGNORE": "b"})));
    }
}
