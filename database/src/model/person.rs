use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::consts::PersonId;

/// Field name -> human readable message
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Validation failed: {}", describe(.errors))]
pub struct ValidationError {
    pub errors: FieldErrors,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            errors: FieldErrors::from([(field.to_string(), message.into())]),
        }
    }

    /// Ok when nothing was collected
    pub fn from_field_errors(errors: FieldErrors) -> Result<(), ValidationError> {
        if errors.is_empty() {
            return Ok(());
        }

        Err(ValidationError { errors })
    }
}

fn describe(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field} {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub work: Option<String>,
}

/// A person that has not been stored yet, the id is assigned by the storage engine
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewPerson {
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub work: Option<String>,
}

impl NewPerson {
    pub fn new(name: String) -> Self {
        NewPerson {
            name,
            age: None,
            address: None,
            work: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::single("name", "must not be empty"));
        }

        Ok(())
    }

    pub fn into_person(self, id: PersonId) -> Person {
        Person {
            id,
            name: self.name,
            age: self.age,
            address: self.address,
            work: self.work,
        }
    }
}

#[cfg(test)]
impl NewPerson {
    pub fn new_test() -> Self {
        NewPerson {
            name: "John Doe".to_string(),
            age: Some(30),
            address: Some("123 Main St".to_string()),
            work: Some("Engineer".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_default_to_none() {
        let person: NewPerson = serde_json::from_str(r#"{"name": "Jane"}"#).unwrap();

        assert_eq!(person, NewPerson::new("Jane".to_string()));
    }

    #[test]
    fn missing_name_is_rejected() {
        let result = serde_json::from_str::<NewPerson>(r#"{"age": 30}"#);

        assert!(result.is_err());
    }

    #[test]
    fn empty_name_fails_validation() {
        let person = NewPerson::new(String::new());

        let err = person.validate().expect_err("should fail validation");

        assert_eq!(err.errors.get("name").map(String::as_str), Some("must not be empty"));
        assert_eq!(err.to_string(), "Validation failed: name must not be empty");
    }

    #[test]
    fn person_serializes_nulls() {
        let person = NewPerson::new("Jane".to_string()).into_person(PersonId(3));

        let json = serde_json::to_value(person).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 3, "name": "Jane", "age": null, "address": null, "work": null})
        );
    }
}
