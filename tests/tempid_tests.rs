use serde_json::json;
use sideload::core::Result;
use sideload::{EntityPayload, MemoryStore, Relationship, ResourceDef, WriteError, WriteExecutor};
use std::sync::Arc;

fn author_with_books(books: &Arc<MemoryStore>) -> WriteExecutor {
    let book_def = Arc::new(ResourceDef::new("books", books.clone()));
    let author_def = Arc::new(
        ResourceDef::new("authors", Arc::new(MemoryStore::new("authors")))
            .relationship(Relationship::has_many("books", "author_id", book_def)),
    );
    WriteExecutor::new(author_def)
}

#[tokio::test]
async fn temp_id_created_then_updated_in_the_same_request() -> Result<()> {
    let books = Arc::new(MemoryStore::new("books"));
    let executor = author_with_books(&books);

    // The second entry names the first by its temp id; the resolver supplies
    // the durable id assigned moments earlier.
    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![
            EntityPayload::create("books").temp_id("abc123").attr("title", "draft"),
            EntityPayload::update("books").temp_id("abc123").attr("title", "final"),
        ],
    );

    let outcome = executor.process(&payload).await?;
    assert!(outcome.success());

    let stored = books.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].attr_str("title"), Some("final"));
    Ok(())
}

#[tokio::test]
async fn temp_id_created_then_destroyed_in_the_same_request() -> Result<()> {
    let books = Arc::new(MemoryStore::new("books"));
    let executor = author_with_books(&books);

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![
            EntityPayload::create("books").temp_id("abc123").attr("title", "fleeting"),
            EntityPayload::destroy("books").temp_id("abc123"),
        ],
    );

    let outcome = executor.process(&payload).await?;
    assert!(outcome.success());
    assert!(books.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn referencing_an_unregistered_temp_id_aborts() {
    let books = Arc::new(MemoryStore::new("books"));
    let executor = author_with_books(&books);

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![EntityPayload::update("books").temp_id("never-declared").attr("title", "x")],
    );

    match executor.process(&payload).await {
        Err(WriteError::UnresolvedTempId(token)) => assert_eq!(token, "never-declared"),
        other => panic!("Expected UnresolvedTempId, got {:?}", other),
    }
}

#[tokio::test]
async fn registering_the_same_temp_id_twice_aborts() {
    let books = Arc::new(MemoryStore::new("books"));
    let executor = author_with_books(&books);

    let payload = EntityPayload::root("authors").to_many(
        "books",
        vec![
            EntityPayload::create("books").temp_id("abc123").attr("title", "one"),
            EntityPayload::create("books").temp_id("abc123").attr("title", "two"),
        ],
    );

    match executor.process(&payload).await {
        Err(WriteError::DuplicateTempId { temp_id, .. }) => assert_eq!(temp_id, "abc123"),
        other => panic!("Expected DuplicateTempId, got {:?}", other),
    }
}

#[tokio::test]
async fn belongs_to_key_comes_from_the_resolver_not_the_payload() -> Result<()> {
    let states = Arc::new(MemoryStore::new("states"));
    let state_def = Arc::new(ResourceDef::new("states", states.clone()));
    let author_def = Arc::new(
        ResourceDef::new("authors", Arc::new(MemoryStore::new("authors")))
            .relationship(Relationship::belongs_to("state", "state_id", state_def)),
    );

    let payload = EntityPayload::root("authors").to_one(
        "state",
        EntityPayload::create("states").temp_id("abc123").attr("name", "Maine"),
    );
    let outcome = WriteExecutor::new(author_def).process(&payload).await?;

    let author = outcome.record().expect("persisted root");
    let stored = states.all().await;
    let state = &stored[0];
    assert_eq!(author.attr_str("state_id"), Some(state.id.as_str()));
    assert_eq!(author.attr("state_id"), Some(&json!(state.id)));
    Ok(())
}
