//! Person record access façade.
//!
//! # Responsibility
//! - Provide the fixed person operations as single store requests.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Every operation returns the store outcome unchanged: `Err` for failures,
//!   `Ok(None)` or an empty vector for "not found".
//! - No operation retries or coordinates with another.
//! - `find_edit_then_save` is read-modify-write; concurrent calls on the same
//!   id can lose an append. `find_and_push_food` is the atomic alternative.

use crate::model::person::{NewPerson, Person, PersonId};
use crate::repo::person_repo::{
    DeleteSummary, PersonQuery, PersonRepository, RepoError, RepoResult, SortOrder,
};
use log::{debug, warn};

/// Food appended by `find_edit_then_save`.
pub const EDIT_FOOD: &str = "Hamburger";
/// Age written by `find_and_update`.
pub const UPDATED_AGE: i64 = 20;
/// Name removed by `delete_many_people`.
pub const DELETE_MANY_NAME: &str = "Mary";
/// Food filter used by `query_chain`.
pub const QUERY_CHAIN_FOOD: &str = "Burrito";
/// Result cap used by `query_chain`.
pub const QUERY_CHAIN_LIMIT: u32 = 2;

/// Façade over one person repository.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts one person and returns it with its assigned id.
    pub fn create_and_save_person(&self, person: &NewPerson) -> RepoResult<Person> {
        traced("create_and_save_person", self.repo.insert_person(person))
    }

    /// Inserts all people in one request.
    ///
    /// Either every document is created or none is.
    pub fn create_many_people(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        traced("create_many_people", self.repo.insert_people(people))
    }

    /// Returns every person with exactly this name.
    pub fn find_people_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        traced(
            "find_people_by_name",
            self.repo.find_people(&PersonQuery::by_name(name)),
        )
    }

    /// Returns the first person whose favorite foods contain `food`.
    pub fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        let result = self
            .repo
            .find_people(&PersonQuery::by_food(food).limit(1))
            .map(|people| people.into_iter().next());
        traced("find_one_by_food", result)
    }

    pub fn find_person_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        traced("find_person_by_id", self.repo.find_person(id))
    }

    /// Reads a person, appends `EDIT_FOOD` and writes the whole document back.
    ///
    /// Returns `Ok(None)` when the id does not exist, including when the
    /// document disappears between the read and the write.
    pub fn find_edit_then_save(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let result = match self.repo.find_person(id) {
            Ok(Some(mut person)) => {
                person.favorite_foods.push(EDIT_FOOD.to_string());
                match self.repo.save_person(&person) {
                    Ok(()) => Ok(Some(person)),
                    Err(RepoError::NotFound(_)) => Ok(None),
                    Err(err) => Err(err),
                }
            }
            other => other,
        };
        traced("find_edit_then_save", result)
    }

    /// Appends `food` atomically, without the read-modify-write window.
    pub fn find_and_push_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>> {
        traced("find_and_push_food", self.repo.push_favorite_food(id, food))
    }

    /// Sets `age` to `UPDATED_AGE` on the first person with this name.
    ///
    /// Returns the post-update document.
    pub fn find_and_update(&self, name: &str) -> RepoResult<Option<Person>> {
        traced(
            "find_and_update",
            self.repo.update_age_by_name(name, UPDATED_AGE),
        )
    }

    /// Removes one person and returns the removed document.
    pub fn delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        traced("delete_by_id", self.repo.delete_person(id))
    }

    /// Removes every person named `DELETE_MANY_NAME`.
    pub fn delete_many_people(&self) -> RepoResult<DeleteSummary> {
        traced(
            "delete_many_people",
            self.repo.delete_people_by_name(DELETE_MANY_NAME),
        )
    }

    /// People who like `QUERY_CHAIN_FOOD`, sorted by name, capped at
    /// `QUERY_CHAIN_LIMIT`, with `age` projected out.
    pub fn query_chain(&self) -> RepoResult<Vec<Person>> {
        let query = PersonQuery::by_food(QUERY_CHAIN_FOOD)
            .sort_by_name(SortOrder::Ascending)
            .limit(QUERY_CHAIN_LIMIT)
            .exclude_age();
        traced("query_chain", self.repo.find_people(&query))
    }

    pub fn count_people(&self) -> RepoResult<u64> {
        traced("count_people", self.repo.count_people())
    }
}

/// Emits one metadata-only event per façade call and passes the result through.
fn traced<T: Outcome>(op: &'static str, result: RepoResult<T>) -> RepoResult<T> {
    match &result {
        Ok(value) => debug!(
            "event=person_op module=service op={} status=ok {}",
            op,
            value.summary()
        ),
        Err(err) => warn!(
            "event=person_op module=service op={} status=error error={}",
            op, err
        ),
    }
    result
}

trait Outcome {
    fn summary(&self) -> String;
}

impl Outcome for Person {
    fn summary(&self) -> String {
        format!("person_id={}", self.id)
    }
}

impl Outcome for Option<Person> {
    fn summary(&self) -> String {
        match self {
            Some(person) => person.summary(),
            None => "found=false".to_string(),
        }
    }
}

impl Outcome for Vec<Person> {
    fn summary(&self) -> String {
        format!("count={}", self.len())
    }
}

impl Outcome for DeleteSummary {
    fn summary(&self) -> String {
        format!("deleted_count={}", self.deleted_count)
    }
}

impl Outcome for u64 {
    fn summary(&self) -> String {
        format!("count={self}")
    }
}
