/// Tri-state field for partial updates
///
/// Update inputs need to tell apart three cases that `Option<T>` collapses:
///
/// - the argument was not supplied at all (`Unset`, leave the column alone)
/// - the argument was supplied as `null` (`Null`, clear the column if allowed)
/// - the argument carries a value (`Value`)
///
/// When deserializing, mark the field `#[serde(default)]` so a missing key
/// yields `Unset`; a present `null` yields `Null`.
///
/// # Example
///
/// ```
/// use pmtool_shared::models::patch::Patch;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Args {
///     #[serde(default)]
///     title: Patch<String>,
/// }
///
/// let unset: Args = serde_json::from_str("{}").unwrap();
/// assert!(unset.title.is_unset());
///
/// let null: Args = serde_json::from_str(r#"{"title": null}"#).unwrap();
/// assert!(null.title.is_null());
///
/// let value: Args = serde_json::from_str(r#"{"title": "Ship it"}"#).unwrap();
/// assert_eq!(value.title, Patch::Value("Ship it".to_string()));
/// ```

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Not supplied
    Unset,

    /// Supplied as an explicit null
    Null,

    /// Supplied with a value
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Patch::Null)
    }

    /// Collapses into the shape stored by the entity store:
    /// `None` = leave alone, `Some(None)` = clear, `Some(Some(v))` = set.
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Patch::Unset => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}
