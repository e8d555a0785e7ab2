use serde::{Deserialize, Deserializer, Serialize};

use super::person::{FieldErrors, Person, ValidationError};

/// How a single column is touched by a partial update
///
/// On the wire a key that is absent maps to `NoChanges`, an explicit `null` maps to
/// `Unset` and any other value maps to `Set`. The `NoChanges` case only works when the
/// containing field is marked `#[serde(default)]`, serde never calls the deserializer
/// for a missing key.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum UpdateStatement<T> {
    Set(T),
    Unset,
    NoChanges,
}

impl<T> Default for UpdateStatement<T> {
    fn default() -> Self {
        UpdateStatement::NoChanges
    }
}

impl<T> UpdateStatement<T> {
    /// Merges the statement into the currently stored value
    pub fn apply(&self, current: Option<T>) -> Option<T>
    where
        T: Clone,
    {
        match self {
            UpdateStatement::Set(value) => Some(value.clone()),
            UpdateStatement::Unset => None,
            UpdateStatement::NoChanges => current,
        }
    }
}

impl<'de, T> Deserialize<'de> for UpdateStatement<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => UpdateStatement::Set(value),
            None => UpdateStatement::Unset,
        })
    }
}

/// Partial update payload, only the statements that are not `NoChanges` are applied
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UpdatePersonData {
    #[serde(default)]
    pub name: UpdateStatement<String>,
    #[serde(default)]
    pub age: UpdateStatement<i32>,
    #[serde(default)]
    pub address: UpdateStatement<String>,
    #[serde(default)]
    pub work: UpdateStatement<String>,
}

impl UpdatePersonData {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();

        match &self.name {
            UpdateStatement::Set(name) if name.is_empty() => {
                errors.insert("name".to_string(), "must not be empty".to_string());
            }
            UpdateStatement::Unset => {
                errors.insert("name".to_string(), "cannot be set to null".to_string());
            }
            UpdateStatement::Set(_) | UpdateStatement::NoChanges => {}
        }

        ValidationError::from_field_errors(errors)
    }

    /// Applies the update on top of the stored person, the id is never touched
    ///
    /// Callers must validate first, an `Unset` name keeps the stored name rather than
    /// storing an empty one.
    pub fn apply(&self, current: &Person) -> Person {
        let name = match &self.name {
            UpdateStatement::Set(name) => name.clone(),
            UpdateStatement::Unset | UpdateStatement::NoChanges => current.name.clone(),
        };

        Person {
            id: current.id,
            name,
            age: self.age.apply(current.age),
            address: self.address.apply(current.address.clone()),
            work: self.work.apply(current.work.clone()),
        }
    }
}
