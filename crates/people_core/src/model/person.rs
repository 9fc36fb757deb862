//! Person document model.
//!
//! # Responsibility
//! - Define the stored `Person` document and its `NewPerson` creation input.
//! - Enforce creation-time invariants shared by every write path.
//!
//! # Invariants
//! - `name` is present and not blank.
//! - `id` is assigned by the store and never nil.
//! - `favorite_foods` keeps insertion order and may contain duplicates.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier assigned by the store on insert.
pub type PersonId = Uuid;

/// Validation errors for person documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// `name` is empty or whitespace only.
    EmptyName,
    /// Nil UUID is reserved and cannot identify a stored document.
    NilId,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required and cannot be empty"),
            Self::NilId => write!(f, "person id cannot be nil"),
        }
    }
}

impl Error for PersonValidationError {}

/// Field values accepted by create operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(rename = "favoriteFoods", default)]
    pub favorite_foods: Vec<String>,
}

impl NewPerson {
    /// Creates input with only the required `name` set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            favorite_foods: Vec::new(),
        }
    }

    /// Sets `age`.
    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    /// Replaces `favorite_foods`.
    pub fn with_foods<I, S>(mut self, foods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorite_foods = foods.into_iter().map(Into::into).collect();
        self
    }

    /// Checks creation-time invariants.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    /// Binds this input to a freshly generated store identifier.
    pub(crate) fn into_person(self) -> Person {
        Person {
            id: Uuid::new_v4(),
            name: self.name,
            age: self.age,
            favorite_foods: self.favorite_foods,
        }
    }
}

/// Stored person document.
///
/// Serialized with document-store field names (`_id`, `favoriteFoods`).
/// `age` is omitted from serialized output when absent, which is also how
/// projections that exclude it are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonDocument")]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: PersonId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(rename = "favoriteFoods")]
    pub favorite_foods: Vec<String>,
}

impl Person {
    /// Creates a person with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    ///
    /// # Errors
    /// - Returns `NilId` for the nil UUID.
    /// - Returns `EmptyName` for blank names.
    pub fn with_id(id: PersonId, name: impl Into<String>) -> Result<Self, PersonValidationError> {
        let person = Self {
            id,
            name: name.into(),
            age: None,
            favorite_foods: Vec::new(),
        };
        person.validate()?;
        Ok(person)
    }

    /// Checks stored-document invariants.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.id.is_nil() {
            return Err(PersonValidationError::NilId);
        }
        validate_name(&self.name)
    }

    /// Returns whether `food` is one of this person's favorites.
    pub fn likes(&self, food: &str) -> bool {
        self.favorite_foods.iter().any(|item| item == food)
    }
}

#[derive(Deserialize)]
struct PersonDocument {
    #[serde(rename = "_id")]
    id: PersonId,
    name: String,
    #[serde(default)]
    age: Option<i64>,
    #[serde(rename = "favoriteFoods", default)]
    favorite_foods: Vec<String>,
}

impl TryFrom<PersonDocument> for Person {
    type Error = PersonValidationError;

    fn try_from(value: PersonDocument) -> Result<Self, Self::Error> {
        let person = Self {
            id: value.id,
            name: value.name,
            age: value.age,
            favorite_foods: value.favorite_foods,
        };
        person.validate()?;
        Ok(person)
    }
}

fn validate_name(name: &str) -> Result<(), PersonValidationError> {
    if name.trim().is_empty() {
        return Err(PersonValidationError::EmptyName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{NewPerson, PersonValidationError};

    #[test]
    fn into_person_assigns_non_nil_id() {
        let person = NewPerson::new("Ada").into_person();
        assert!(!person.id.is_nil());
        assert_eq!(person.name, "Ada");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            NewPerson::new("  ").validate(),
            Err(PersonValidationError::EmptyName)
        );
    }
}
