//! Person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Translate person store requests into single SQL statements.
//! - Keep SQL and `favoriteFoods` encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate documents before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Each trait method is one store request; bulk insert runs in one transaction.
//! - Unsorted reads return documents in insertion order.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::person::{NewPerson, Person, PersonId, PersonValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PEOPLE_TABLE: &str = "people";
const PEOPLE_COLUMNS: [&str; 4] = ["uuid", "name", "age", "favorite_foods"];
const PERSON_RETURNING_SQL: &str = "RETURNING uuid, name, age, favorite_foods";
const PERSON_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    age,
    favorite_foods
FROM people";
const FOOD_MATCH_SQL: &str = "EXISTS (
    SELECT 1 FROM json_each(people.favorite_foods) WHERE json_each.value = ?
)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from person store requests.
#[derive(Debug)]
pub enum RepoError {
    /// Document failed model invariants before reaching the store.
    Validation(PersonValidationError),
    /// Store-reported failure, surfaced unchanged.
    Db(DbError),
    /// Target document does not exist.
    NotFound(PersonId),
    /// Caller-supplied identifier text is not a valid id.
    InvalidId(String),
    /// Persisted data cannot be converted into a valid `Person`.
    InvalidData(String),
    /// Connection schema is not at the expected bootstrapped version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::InvalidId(value) => write!(f, "invalid person id `{value}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "person repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "person repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "person repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidId(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Parses caller-supplied id text.
///
/// Malformed ids are an error, not a "not found" result.
pub fn parse_person_id(value: &str) -> RepoResult<PersonId> {
    let id = Uuid::parse_str(value.trim()).map_err(|_| RepoError::InvalidId(value.to_string()))?;
    if id.is_nil() {
        return Err(RepoError::InvalidId(value.to_string()));
    }
    Ok(id)
}

/// Sort direction for the `name` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Filter, ordering and projection options for `find_people`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonQuery {
    /// Exact `name` match.
    pub name: Option<String>,
    /// Documents whose `favoriteFoods` contains this value.
    pub favorite_food: Option<String>,
    /// Sort by `name`; `None` keeps insertion order.
    pub sort_by_name: Option<SortOrder>,
    pub limit: Option<u32>,
    /// Projects `age` out of returned documents.
    pub exclude_age: bool,
}

impl PersonQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_food(food: impl Into<String>) -> Self {
        Self {
            favorite_food: Some(food.into()),
            ..Self::default()
        }
    }

    pub fn sort_by_name(mut self, order: SortOrder) -> Self {
        self.sort_by_name = Some(order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn exclude_age(mut self) -> Self {
        self.exclude_age = true;
        self
    }
}

/// Opaque summary of a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted_count: usize,
}

/// Repository interface for person store requests.
pub trait PersonRepository {
    fn insert_person(&self, person: &NewPerson) -> RepoResult<Person>;
    /// Inserts all documents or none.
    fn insert_people(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>>;
    fn find_people(&self, query: &PersonQuery) -> RepoResult<Vec<Person>>;
    fn find_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Replaces the stored document with `person`. Missing ids are `NotFound`.
    fn save_person(&self, person: &Person) -> RepoResult<()>;
    /// Sets `age` on the first document named `name` and returns the post-update value.
    fn update_age_by_name(&self, name: &str, age: i64) -> RepoResult<Option<Person>>;
    /// Appends `food` to `favoriteFoods` in a single atomic statement.
    fn push_favorite_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>>;
    /// Removes one document and returns it.
    fn delete_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn delete_people_by_name(&self, name: &str) -> RepoResult<DeleteSummary>;
    fn count_people(&self) -> RepoResult<u64>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when bootstrap has not run.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the `people`
    ///   collection does not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn insert_person(&self, person: &NewPerson) -> RepoResult<Person> {
        person.validate()?;
        let stored = person.clone().into_person();
        insert_row(self.conn, &stored)?;
        Ok(stored)
    }

    fn insert_people(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        for person in people {
            person.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut stored = Vec::with_capacity(people.len());
        for person in people {
            let created = person.clone().into_person();
            insert_row(&tx, &created)?;
            stored.push(created);
        }
        tx.commit()?;

        Ok(stored)
    }

    fn find_people(&self, query: &PersonQuery) -> RepoResult<Vec<Person>> {
        let mut sql = format!("{PERSON_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = &query.name {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }

        if let Some(food) = &query.favorite_food {
            sql.push_str(" AND ");
            sql.push_str(FOOD_MATCH_SQL);
            bind_values.push(Value::Text(food.clone()));
        }

        match query.sort_by_name {
            Some(SortOrder::Ascending) => sql.push_str(" ORDER BY name ASC, rowid ASC"),
            Some(SortOrder::Descending) => sql.push_str(" ORDER BY name DESC, rowid ASC"),
            None => sql.push_str(" ORDER BY rowid ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            let mut person = parse_person_row(row)?;
            if query.exclude_age {
                person.age = None;
            }
            people.push(person);
        }

        Ok(people)
    }

    fn find_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        first_person(&mut rows)
    }

    fn save_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        let changed = self.conn.execute(
            "UPDATE people
             SET
                name = ?1,
                age = ?2,
                favorite_foods = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                person.name.as_str(),
                person.age,
                encode_foods(&person.favorite_foods)?,
                person.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(person.id));
        }

        Ok(())
    }

    fn update_age_by_name(&self, name: &str, age: i64) -> RepoResult<Option<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "UPDATE people
             SET
                age = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE rowid = (
                SELECT rowid FROM people WHERE name = ?1 ORDER BY rowid ASC LIMIT 1
             )
             {PERSON_RETURNING_SQL};"
        ))?;
        let mut rows = stmt.query(params![name, age])?;
        first_person(&mut rows)
    }

    fn push_favorite_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "UPDATE people
             SET
                favorite_foods = json_insert(favorite_foods, '$[#]', ?2),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
             {PERSON_RETURNING_SQL};"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), food])?;
        first_person(&mut rows)
    }

    fn delete_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "DELETE FROM people WHERE uuid = ?1 {PERSON_RETURNING_SQL};"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        first_person(&mut rows)
    }

    fn delete_people_by_name(&self, name: &str) -> RepoResult<DeleteSummary> {
        let deleted_count = self
            .conn
            .execute("DELETE FROM people WHERE name = ?1;", [name])?;
        Ok(DeleteSummary { deleted_count })
    }

    fn count_people(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM people;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative document count `{count}`")))
    }
}

fn insert_row(conn: &Connection, person: &Person) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO people (uuid, name, age, favorite_foods) VALUES (?1, ?2, ?3, ?4);",
        params![
            person.id.to_string(),
            person.name.as_str(),
            person.age,
            encode_foods(&person.favorite_foods)?,
        ],
    )?;
    Ok(())
}

fn first_person(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Option<Person>> {
    match rows.next()? {
        Some(row) => Ok(Some(parse_person_row(row)?)),
        None => Ok(None),
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in people.uuid"))
    })?;

    let foods_text: String = row.get("favorite_foods")?;
    let favorite_foods = serde_json::from_str::<Vec<String>>(&foods_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid favorite_foods value for person {id}: {err}"
        ))
    })?;

    let person = Person {
        id,
        name: row.get("name")?,
        age: row.get("age")?,
        favorite_foods,
    };
    person.validate()?;
    Ok(person)
}

fn encode_foods(foods: &[String]) -> RepoResult<String> {
    serde_json::to_string(foods)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode favorite_foods: {err}")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, PEOPLE_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PEOPLE_TABLE));
    }

    for column in PEOPLE_COLUMNS {
        if !table_has_column(conn, PEOPLE_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: PEOPLE_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
