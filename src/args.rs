//! Positional arguments passed to a data producer.
//!
//! Arguments double as part of the cache identity: two calls with the same
//! logical key but different arguments are memoized separately. Values are
//! held as [`serde_json::Value`] so any serializable type can take part, and
//! positions are kept ordered so the canonical form is stable.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered mapping from argument position to value.
///
/// # Example
///
/// ```
/// use memo_kit::Args;
///
/// let args = Args::new().with(1, "tenant_a").with(2, 42);
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get(2), Some(&serde_json::json!(42)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Args {
    values: BTreeMap<i64, Value>,
}

impl Args {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Args {
            values: BTreeMap::new(),
        }
    }

    /// Set the value at `position`, replacing any previous one.
    pub fn with(mut self, position: i64, value: impl Into<Value>) -> Self {
        self.values.insert(position, value.into());
        self
    }

    /// Set the value at `position` from any serializable type.
    ///
    /// # Errors
    /// Returns `Error::HashDerivationError` if the value has no JSON
    /// representation (e.g. a map with non-string keys).
    pub fn insert_serialized<T: Serialize + ?Sized>(
        &mut self,
        position: i64,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.insert(position, value);
        Ok(())
    }

    pub fn get(&self, position: i64) -> Option<&Value> {
        self.values.get(&position)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate arguments in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Canonical byte form used for digest derivation.
    ///
    /// Compact JSON of the ordered map; equal argument sets always yield
    /// equal bytes regardless of insertion order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.values)?)
    }
}

impl FromIterator<(i64, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (i64, Value)>>(iter: I) -> Self {
        Args {
            values: iter.into_iter().collect(),
        }
    }
}
