use serde_json::json;
use sideload::core::Result;
use sideload::{
    EntityPayload, MemoryStore, Relationship, ResourceDef, ResourceStore, WriteError,
    WriteExecutor,
};
use std::sync::Arc;

fn store(name: &str) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(name))
}

#[tokio::test]
async fn root_create_persists_attributes() -> Result<()> {
    let authors = store("authors");
    let executor = WriteExecutor::new(Arc::new(ResourceDef::new("authors", authors.clone())));

    let payload = EntityPayload::root("authors")
        .attr("first_name", "Stephen")
        .attr("last_name", "King");
    let outcome = executor.process(&payload).await?;

    assert!(outcome.success());
    let author = outcome.record().expect("persisted root");
    let reloaded = authors.fetch(&author.id).await?;
    assert_eq!(reloaded.attr("first_name"), Some(&json!("Stephen")));
    assert_eq!(reloaded.attr("last_name"), Some(&json!("King")));
    Ok(())
}

#[tokio::test]
async fn root_with_durable_id_updates_in_place() -> Result<()> {
    let authors = store("authors");
    let existing = authors
        .create([("first_name".to_string(), json!("Richard"))].into_iter().collect())
        .await?;

    let executor = WriteExecutor::new(Arc::new(ResourceDef::new("authors", authors.clone())));
    let payload = EntityPayload::root("authors")
        .id(&existing.id)
        .attr("first_name", "Stephen");
    let outcome = executor.process(&payload).await?;

    assert!(outcome.success());
    assert_eq!(outcome.record().map(|r| r.id.as_str()), Some(existing.id.as_str()));
    let reloaded = authors.fetch(&existing.id).await?;
    assert_eq!(reloaded.attr("first_name"), Some(&json!("Stephen")));
    assert_eq!(authors.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn belongs_to_child_created_by_temp_id_wires_the_parent_key() -> Result<()> {
    let authors = store("authors");
    let states = store("states");
    let author_def = Arc::new(
        ResourceDef::new("authors", authors.clone()).relationship(Relationship::belongs_to(
            "state",
            "state_id",
            Arc::new(ResourceDef::new("states", states.clone())),
        )),
    );

    let payload = EntityPayload::root("authors")
        .attr("first_name", "Stephen")
        .to_one(
            "state",
            EntityPayload::create("states").temp_id("abc123").attr("name", "New York"),
        );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;

    let author = outcome.record().expect("persisted root");
    let state_id = author.attr_str("state_id").expect("foreign key set").to_string();

    let state = states.fetch(&state_id).await?;
    assert_eq!(state.attr_str("name"), Some("New York"));

    // The stored row carries the key too, not just the returned snapshot.
    let reloaded = authors.fetch(&author.id).await?;
    assert_eq!(reloaded.attr_str("state_id"), Some(state_id.as_str()));
    Ok(())
}

#[tokio::test]
async fn has_many_children_point_back_at_the_parent() -> Result<()> {
    let books = store("books");
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_many(
            "books",
            "author_id",
            Arc::new(ResourceDef::new("books", books.clone())),
        )),
    );

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![
            EntityPayload::create("books").attr("title", "one"),
            EntityPayload::create("books").attr("title", "two"),
        ],
    );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;
    let author = outcome.record().expect("persisted root");

    let stored = books.all().await;
    assert_eq!(stored.len(), 2);
    for book in &stored {
        assert_eq!(book.attr_str("author_id"), Some(author.id.as_str()));
    }
    let mut titles: Vec<&str> = stored.iter().filter_map(|b| b.attr_str("title")).collect();
    titles.sort_unstable();
    assert_eq!(titles, ["one", "two"]);
    Ok(())
}

#[tokio::test]
async fn update_child_under_has_many_links_the_foreign_key() -> Result<()> {
    let books = store("books");
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_many(
            "books",
            "author_id",
            Arc::new(ResourceDef::new("books", books.clone())),
        )),
    );

    let orphan = books
        .create([("title".to_string(), json!("stray"))].into_iter().collect())
        .await?;

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![EntityPayload::update("books").id(&orphan.id).attr("title", "adopted")],
    );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;
    let author = outcome.record().expect("persisted root");

    let reloaded = books.fetch(&orphan.id).await?;
    assert_eq!(reloaded.attr_str("title"), Some("adopted"));
    assert_eq!(reloaded.attr_str("author_id"), Some(author.id.as_str()));
    Ok(())
}

#[tokio::test]
async fn has_one_child_points_back_at_the_parent() -> Result<()> {
    let bios = store("bios");
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_one(
            "bio",
            "author_id",
            Arc::new(ResourceDef::new("bios", bios.clone())),
        )),
    );

    let payload = EntityPayload::root("authors").to_one(
        "bio",
        EntityPayload::create("bios").attr("body", "born 1947"),
    );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;
    let author = outcome.record().expect("persisted root");

    let stored = bios.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].attr_str("body"), Some("born 1947"));
    assert_eq!(stored[0].attr_str("author_id"), Some(author.id.as_str()));
    Ok(())
}

#[tokio::test]
async fn nested_child_relationships_persist_depth_first() -> Result<()> {
    let books = store("books");
    let genres = store("genres");

    let genre_def = Arc::new(ResourceDef::new("genres", genres.clone()));
    let book_def = Arc::new(
        ResourceDef::new("books", books.clone())
            .relationship(Relationship::belongs_to("genre", "genre_id", genre_def)),
    );
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors"))
            .relationship(Relationship::has_many("books", "author_id", book_def)),
    );

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![
            EntityPayload::create("books").temp_id("b1").attr("title", "one").to_one(
                "genre",
                EntityPayload::create("genres").temp_id("g1").attr("name", "horror"),
            ),
        ],
    );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;
    let author = outcome.record().expect("persisted root");

    let stored_genres = genres.all().await;
    assert_eq!(stored_genres.len(), 1);
    assert_eq!(stored_genres[0].attr_str("name"), Some("horror"));

    // The book points up at the author and sideways at its genre.
    let stored_books = books.all().await;
    assert_eq!(stored_books.len(), 1);
    assert_eq!(stored_books[0].attr_str("author_id"), Some(author.id.as_str()));
    assert_eq!(
        stored_books[0].attr_str("genre_id"),
        Some(stored_genres[0].id.as_str())
    );
    Ok(())
}

#[tokio::test]
async fn root_validation_failure_reports_without_hooks() -> Result<()> {
    let authors = Arc::new(MemoryStore::new("authors").with_validator(|attributes| {
        if attributes.contains_key("first_name") {
            Ok(())
        } else {
            Err(vec!["first_name can't be blank".to_string()])
        }
    }));
    let books = store("books");
    let fired = Arc::new(std::sync::Mutex::new(0usize));
    let counter = fired.clone();

    let author_def = Arc::new(
        ResourceDef::new("authors", authors.clone()).relationship(
            Relationship::has_many(
                "books",
                "author_id",
                Arc::new(ResourceDef::new("books", books.clone())),
            )
            .after_save(move |_, _| *counter.lock().unwrap() += 1),
        ),
    );

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![EntityPayload::create("books").attr("title", "one")],
    );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;

    assert!(!outcome.success());
    assert!(outcome.record().is_none());
    assert_eq!(outcome.violations(), ["first_name can't be blank"]);

    // Nothing downstream of the failed root ran.
    assert_eq!(*fired.lock().unwrap(), 0);
    assert!(books.is_empty().await);
    assert!(authors.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn nested_validation_failure_is_a_hard_error() {
    let books = Arc::new(MemoryStore::new("books").with_validator(|attributes| {
        if attributes.contains_key("title") {
            Ok(())
        } else {
            Err(vec!["title can't be blank".to_string()])
        }
    }));
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_many(
            "books",
            "author_id",
            Arc::new(ResourceDef::new("books", books)),
        )),
    );

    let payload = EntityPayload::root("authors")
        .attr("first_name", "Stephen")
        .to_many("books", vec![EntityPayload::create("books")]);
    let res = WriteExecutor::new(author_def).process(&payload).await;

    match res {
        Err(WriteError::Validation { entity_type, messages }) => {
            assert_eq!(entity_type, "books");
            assert_eq!(messages, ["title can't be blank"]);
        }
        other => panic!("Expected nested Validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn destroying_a_missing_child_aborts() {
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_many(
            "books",
            "author_id",
            Arc::new(ResourceDef::new("books", store("books"))),
        )),
    );

    let payload = EntityPayload::root("authors")
        .to_many("books", vec![EntityPayload::destroy("books").id("missing")]);
    let res = WriteExecutor::new(author_def).process(&payload).await;

    match res {
        Err(WriteError::NotFound { entity_type, id }) => {
            assert_eq!(entity_type, "books");
            assert_eq!(id, "missing");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_relationship_is_rejected_before_any_write() {
    let authors = store("authors");
    let executor = WriteExecutor::new(Arc::new(ResourceDef::new("authors", authors.clone())));

    let payload = EntityPayload::root("authors")
        .attr("first_name", "Stephen")
        .to_many("books", vec![EntityPayload::create("books").attr("title", "one")]);
    let res = executor.process(&payload).await;

    assert!(matches!(res, Err(WriteError::MalformedPayload(_))));
    assert!(authors.is_empty().await);
}

#[tokio::test]
async fn cardinality_mismatch_is_rejected() {
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_many(
            "books",
            "author_id",
            Arc::new(ResourceDef::new("books", store("books"))),
        )),
    );

    let payload = EntityPayload::root("authors")
        .to_one("books", EntityPayload::create("books").attr("title", "one"));
    let res = WriteExecutor::new(author_def).process(&payload).await;

    assert!(matches!(res, Err(WriteError::MalformedPayload(_))));
}

#[tokio::test]
async fn child_of_the_wrong_type_is_rejected() {
    let author_def = Arc::new(
        ResourceDef::new("authors", store("authors")).relationship(Relationship::has_many(
            "books",
            "author_id",
            Arc::new(ResourceDef::new("books", store("books"))),
        )),
    );

    let payload = EntityPayload::root("authors")
        .to_many("books", vec![EntityPayload::create("states").attr("name", "NY")]);
    let res = WriteExecutor::new(author_def).process(&payload).await;

    assert!(matches!(res, Err(WriteError::MalformedPayload(_))));
}

#[tokio::test]
async fn mismatched_root_type_is_rejected() {
    let executor = WriteExecutor::new(Arc::new(ResourceDef::new("authors", store("authors"))));
    let res = executor.process(&EntityPayload::root("books")).await;
    assert!(matches!(res, Err(WriteError::MalformedPayload(_))));
}
