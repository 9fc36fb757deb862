use people_core::db::open_db_in_memory;
use people_core::{
    parse_person_id, NewPerson, PersonQuery, PersonRepository, PersonService,
    PersonValidationError, RepoError, SortOrder, SqlitePersonRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

fn service(conn: &Connection) -> PersonService<SqlitePersonRepository<'_>> {
    PersonService::new(SqlitePersonRepository::try_new(conn).unwrap())
}

fn john_doe() -> NewPerson {
    NewPerson::new("John Doe")
        .with_age(30)
        .with_foods(["Pizza", "Burger"])
}

#[test]
fn create_then_find_by_id_returns_identical_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create_and_save_person(&john_doe()).unwrap();
    assert!(!created.id.is_nil());

    let loaded = service.find_person_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.name, "John Doe");
    assert_eq!(loaded.age, Some(30));
    assert_eq!(loaded.favorite_foods, vec!["Pizza", "Burger"]);
}

#[test]
fn create_keeps_optional_fields_absent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create_and_save_person(&NewPerson::new("Solo"))
        .unwrap();
    let loaded = service.find_person_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded.age, None);
    assert!(loaded.favorite_foods.is_empty());
}

#[test]
fn create_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create_and_save_person(&NewPerson::new("   ").with_age(4))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(PersonValidationError::EmptyName)
    ));
    assert_eq!(service.count_people().unwrap(), 0);
}

#[test]
fn create_many_returns_each_created_record_with_distinct_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let input = vec![
        NewPerson::new("Mary").with_age(41).with_foods(["Salad"]),
        NewPerson::new("Ann").with_foods(["Burrito"]),
        NewPerson::new("Bob").with_age(17),
    ];
    let created = service.create_many_people(&input).unwrap();

    assert_eq!(created.len(), 3);
    let ids: HashSet<_> = created.iter().map(|person| person.id).collect();
    assert_eq!(ids.len(), 3);
    for (person, source) in created.iter().zip(&input) {
        assert_eq!(person.name, source.name);
        assert_eq!(person.age, source.age);
        assert_eq!(person.favorite_foods, source.favorite_foods);
    }
    assert_eq!(service.count_people().unwrap(), 3);
}

#[test]
fn create_many_with_invalid_entry_inserts_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let input = vec![NewPerson::new("Valid"), NewPerson::new("")];
    let err = service.create_many_people(&input).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(service.count_people().unwrap(), 0);
}

#[test]
fn create_many_rolls_back_when_store_rejects_one_insert() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_boom BEFORE INSERT ON people
         WHEN NEW.name = 'Boom'
         BEGIN
            SELECT RAISE(ABORT, 'boom rejected');
         END;",
    )
    .unwrap();
    let service = service(&conn);

    let input = vec![NewPerson::new("First"), NewPerson::new("Boom")];
    let err = service.create_many_people(&input).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(err.to_string().contains("boom rejected"));
    assert_eq!(service.count_people().unwrap(), 0);
}

#[test]
fn find_by_name_returns_matches_or_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create_and_save_person(&NewPerson::new("Unique Name"))
        .unwrap();
    service
        .create_and_save_person(&NewPerson::new("Someone Else"))
        .unwrap();

    let found = service.find_people_by_name("Unique Name").unwrap();
    assert_eq!(found, vec![created]);

    assert!(service.find_people_by_name("Nobody").unwrap().is_empty());
}

#[test]
fn find_one_by_food_returns_first_match_or_none() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create_and_save_person(&NewPerson::new("Zed").with_foods(["Soup"]))
        .unwrap();
    let first = service
        .create_and_save_person(&NewPerson::new("Yan").with_foods(["Tacos", "Sushi"]))
        .unwrap();
    service
        .create_and_save_person(&NewPerson::new("Abe").with_foods(["Sushi"]))
        .unwrap();

    let found = service.find_one_by_food("Sushi").unwrap().unwrap();
    assert_eq!(found.id, first.id);

    assert!(service.find_one_by_food("Sush").unwrap().is_none());
}

#[test]
fn find_by_missing_id_is_not_found_and_malformed_id_is_error() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(service.find_person_by_id(Uuid::new_v4()).unwrap().is_none());

    let err = parse_person_id("not-an-id").unwrap_err();
    assert!(matches!(err, RepoError::InvalidId(ref value) if value == "not-an-id"));
}

#[test]
fn edit_then_save_appends_hamburger() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create_and_save_person(&john_doe()).unwrap();
    let updated = service.find_edit_then_save(created.id).unwrap().unwrap();
    assert_eq!(updated.favorite_foods, vec!["Pizza", "Burger", "Hamburger"]);

    let reloaded = service.find_person_by_id(created.id).unwrap().unwrap();
    assert_eq!(reloaded.favorite_foods, vec!["Pizza", "Burger", "Hamburger"]);
    assert_eq!(reloaded.age, Some(30));
}

#[test]
fn edit_then_save_on_missing_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(service.find_edit_then_save(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn edit_then_save_can_lose_an_interleaved_append() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let created = repo.insert_person(&john_doe()).unwrap();

    // Two readers see the same snapshot; the second write wins.
    let mut first = repo.find_person(created.id).unwrap().unwrap();
    let mut second = repo.find_person(created.id).unwrap().unwrap();
    first.favorite_foods.push("Hamburger".to_string());
    second.favorite_foods.push("Fries".to_string());
    repo.save_person(&first).unwrap();
    repo.save_person(&second).unwrap();

    let reloaded = repo.find_person(created.id).unwrap().unwrap();
    assert_eq!(reloaded.favorite_foods, vec!["Pizza", "Burger", "Fries"]);
}

#[test]
fn atomic_push_keeps_every_append() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create_and_save_person(&john_doe()).unwrap();
    service.find_and_push_food(created.id, "Hamburger").unwrap();
    let updated = service
        .find_and_push_food(created.id, "Fries")
        .unwrap()
        .unwrap();

    assert_eq!(
        updated.favorite_foods,
        vec!["Pizza", "Burger", "Hamburger", "Fries"]
    );
    assert!(service
        .find_and_push_food(Uuid::new_v4(), "Fries")
        .unwrap()
        .is_none());
}

#[test]
fn find_and_update_sets_age_to_twenty_and_returns_new_value() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create_and_save_person(&NewPerson::new("Example Person").with_age(67))
        .unwrap();

    let updated = service.find_and_update("Example Person").unwrap().unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.age, Some(20));

    let reloaded = service.find_person_by_id(created.id).unwrap().unwrap();
    assert_eq!(reloaded.age, Some(20));

    assert!(service.find_and_update("Missing Person").unwrap().is_none());
}

#[test]
fn find_and_update_touches_only_first_match() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let people = service
        .create_many_people(&[
            NewPerson::new("Twin").with_age(1),
            NewPerson::new("Twin").with_age(2),
        ])
        .unwrap();

    let updated = service.find_and_update("Twin").unwrap().unwrap();
    assert_eq!(updated.id, people[0].id);

    let second = service.find_person_by_id(people[1].id).unwrap().unwrap();
    assert_eq!(second.age, Some(2));
}

#[test]
fn delete_by_id_removes_exactly_that_record() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let doomed = service.create_and_save_person(&john_doe()).unwrap();
    let kept = service
        .create_and_save_person(&NewPerson::new("Keeper"))
        .unwrap();

    let deleted = service.delete_by_id(doomed.id).unwrap().unwrap();
    assert_eq!(deleted, doomed);

    assert!(service.find_person_by_id(doomed.id).unwrap().is_none());
    assert!(service.find_person_by_id(kept.id).unwrap().is_some());
    assert!(service.delete_by_id(doomed.id).unwrap().is_none());
}

#[test]
fn delete_many_removes_every_mary_only() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create_many_people(&[
            NewPerson::new("Mary").with_age(21),
            NewPerson::new("Mary").with_foods(["Tea"]),
            NewPerson::new("Marya"),
            NewPerson::new("John"),
        ])
        .unwrap();

    let summary = service.delete_many_people().unwrap();
    assert_eq!(summary.deleted_count, 2);

    assert!(service.find_people_by_name("Mary").unwrap().is_empty());
    assert_eq!(service.find_people_by_name("Marya").unwrap().len(), 1);
    assert_eq!(service.find_people_by_name("John").unwrap().len(), 1);

    assert_eq!(service.delete_many_people().unwrap().deleted_count, 0);
}

#[test]
fn query_chain_returns_two_burrito_lovers_sorted_without_age() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service
        .create_many_people(&[
            NewPerson::new("Pablo").with_age(29).with_foods(["Burrito"]),
            NewPerson::new("Ana").with_age(33).with_foods(["Pizza", "Burrito"]),
            NewPerson::new("Carla").with_age(25).with_foods(["Burrito"]),
            NewPerson::new("Aaron").with_age(50).with_foods(["Burritos"]),
        ])
        .unwrap();

    let result = service.query_chain().unwrap();
    let names: Vec<_> = result.iter().map(|person| person.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Carla"]);

    for person in &result {
        assert_eq!(person.age, None);
        let json = serde_json::to_value(person).unwrap();
        assert!(json.get("age").is_none(), "age should be projected out");
        assert!(json.get("_id").is_some());
    }

    // Projection does not modify stored documents.
    let stored = service.find_people_by_name("Ana").unwrap();
    assert_eq!(stored[0].age, Some(33));
}

#[test]
fn query_chain_on_empty_store_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(service.query_chain().unwrap().is_empty());
}

#[test]
fn repository_query_supports_descending_sort_and_combined_filters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    repo.insert_people(&[
        NewPerson::new("Bea").with_foods(["Kale"]),
        NewPerson::new("Cal").with_foods(["Kale"]),
        NewPerson::new("Abe").with_foods(["Rice"]),
    ])
    .unwrap();

    let query = PersonQuery::by_food("Kale").sort_by_name(SortOrder::Descending);
    let names: Vec<_> = repo
        .find_people(&query)
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect();
    assert_eq!(names, vec!["Cal", "Bea"]);

    let combined = PersonQuery {
        name: Some("Bea".to_string()),
        favorite_food: Some("Rice".to_string()),
        ..PersonQuery::default()
    };
    assert!(repo.find_people(&combined).unwrap().is_empty());
}

#[test]
fn save_person_on_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let ghost = people_core::Person::with_id(Uuid::new_v4(), "Ghost").unwrap();
    let err = repo.save_person(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost.id));
}

#[test]
fn corrupted_food_column_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    let created = repo.insert_person(&NewPerson::new("Broken")).unwrap();

    conn.execute(
        "UPDATE people SET favorite_foods = '{\"not\": \"an array\"}' WHERE uuid = ?1;",
        [created.id.to_string()],
    )
    .unwrap();

    let err = repo.find_person(created.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
