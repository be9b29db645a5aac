//! Row identifier generation and the collision-tolerant insert loop.

use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Attempts made before an insert gives up on finding a free identifier.
pub const DEFAULT_INSERT_ATTEMPTS: u32 = 5;

/// SQLite extended result codes for PRIMARY KEY / UNIQUE violations.
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Source of fresh row identifiers.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Uuid;
}

/// UUIDv4 from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// True when `err` is a uniqueness violation on `<table>.id` and nothing else.
pub fn is_id_collision(err: &sqlx::Error, table: &str) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };
    let unique = db.is_unique_violation()
        || matches!(
            db.code().as_deref(),
            Some(SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE)
        );
    if !unique {
        return false;
    }
    names_id_column(db.message(), table)
}

// "UNIQUE constraint failed: vendors.id" lists every column of the violated
// index; a composite index that merely includes `id` is not a collision.
fn names_id_column(message: &str, table: &str) -> bool {
    let Some((_, columns)) = message.split_once("failed:") else {
        return false;
    };
    let expected = format!("{table}.id");
    let mut cols = columns.split(',').map(str::trim);
    matches!((cols.next(), cols.next()), (Some(c), None) if c == expected)
}

/// Executes the statement produced by `build` with a fresh id, drawing a new id
/// and trying again when the previous one already exists in `table`.
///
/// At most `limit` ids are drawn. Any other failure is returned unchanged.
pub async fn insert_with_retry<'q, F>(
    conn: &mut SqliteConnection,
    ids: &dyn IdGenerator,
    limit: u32,
    table: &'static str,
    build: F,
) -> StoreResult<Uuid>
where
    F: Fn(Uuid) -> Query<'q, Sqlite, SqliteArguments<'q>>,
{
    for attempt in 1..=limit {
        let id = ids.new_id();
        match build(id).execute(&mut *conn).await {
            Ok(_) => return Ok(id),
            Err(err) if is_id_collision(&err, table) => {
                debug!(table, attempt, %id, "identifier collision, drawing a new id");
            }
            Err(err) => return Err(StoreError::from(err)),
        }
    }

    warn!(table, attempts = limit, "identifier space exhausted for insert");
    Err(StoreError::IdExhausted {
        table,
        attempts: limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, SqliteConnection};
    use std::sync::Mutex;

    struct Scripted(Mutex<Vec<Uuid>>);

    impl Scripted {
        fn new(ids: &[Uuid]) -> Self {
            let mut ids = ids.to_vec();
            ids.reverse();
            Scripted(Mutex::new(ids))
        }

        fn remaining(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl IdGenerator for Scripted {
        fn new_id(&self) -> Uuid {
            self.0.lock().unwrap().pop().expect("script exhausted")
        }
    }

    async fn conn() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE things (id BLOB PRIMARY KEY NOT NULL, name TEXT NOT NULL UNIQUE)")
            .execute(&mut conn)
            .await
            .unwrap();
        conn
    }

    fn insert_thing<'a>(name: &'a str) -> impl Fn(Uuid) -> Query<'a, Sqlite, SqliteArguments<'a>> + 'a {
        move |id| {
            sqlx::query("INSERT INTO things (id, name) VALUES (?, ?)")
                .bind(id)
                .bind(name)
        }
    }

    #[test]
    fn only_the_id_column_counts_as_collision() {
        assert!(names_id_column("UNIQUE constraint failed: things.id", "things"));
        assert!(!names_id_column("UNIQUE constraint failed: things.name", "things"));
        assert!(!names_id_column("UNIQUE constraint failed: other.id", "things"));
        assert!(!names_id_column(
            "UNIQUE constraint failed: things.id, things.name",
            "things"
        ));
    }

    #[tokio::test]
    async fn collision_draws_another_id() {
        let mut conn = conn().await;
        let taken = Uuid::from_u128(1);
        let fresh = Uuid::from_u128(2);
        let seed = Scripted::new(&[taken]);
        insert_with_retry(&mut conn, &seed, 5, "things", insert_thing("a"))
            .await
            .unwrap();

        let ids = Scripted::new(&[taken, fresh, Uuid::from_u128(3)]);
        let id = insert_with_retry(&mut conn, &ids, 5, "things", insert_thing("b"))
            .await
            .unwrap();
        assert_eq!(id, fresh);
        assert_eq!(ids.remaining(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_limit() {
        let mut conn = conn().await;
        let taken = Uuid::from_u128(7);
        insert_with_retry(&mut conn, &Scripted::new(&[taken]), 5, "things", insert_thing("a"))
            .await
            .unwrap();

        let ids = Scripted::new(&[taken, taken, taken]);
        let err = insert_with_retry(&mut conn, &ids, 3, "things", insert_thing("b"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::IdExhausted {
                table: "things",
                attempts: 3
            }
        ));
    }

    #[tokio::test]
    async fn other_violations_are_not_retried() {
        let mut conn = conn().await;
        let ids = Scripted::new(&[Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]);
        insert_with_retry(&mut conn, &ids, 5, "things", insert_thing("dup"))
            .await
            .unwrap();
        let err = insert_with_retry(&mut conn, &ids, 5, "things", insert_thing("dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Sql(_)));
        assert_eq!(ids.remaining(), 1);
    }
}
