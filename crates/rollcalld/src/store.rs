//! SQLite persistence for the people list.
//!
//! One `people` row per person; grid order is insertion order (`rowid`).
//! Lock state is never stored.

use std::path::Path;

use rollcall_core::Person;
use rusqlite::params;
use thiserror::Error;
use tokio_rusqlite::Connection;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("person {0} not found in store")]
    NotFound(String),
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS people (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        image TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

pub struct PeopleStore {
    conn: Connection,
}

impl PeopleStore {
    /// Open (or create) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).await?;
        tracing::info!(path = %path.display(), "people store opened");
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// All people in grid order.
    pub async fn load_all(&self) -> Result<Vec<Person>, StoreError> {
        let people = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, image, created_at FROM people ORDER BY rowid ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(Person {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        image: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await?;
        Ok(people)
    }

    pub async fn insert(&self, person: &Person) -> Result<(), StoreError> {
        let person = person.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO people (id, name, image, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![person.id, person.name, person.image, person.created_at],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn rename(&self, id: &str, name: &str) -> Result<(), StoreError> {
        let (id, name) = (id.to_string(), name.to_string());
        let id_for_err = id.clone();
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE people SET name = ?1 WHERE id = ?2",
                    params![name, id],
                )?)
            })
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound(id_for_err));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let id_for_err = id.clone();
        let changed = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM people WHERE id = ?1", params![id])?))
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound(id_for_err));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Person {
        let mut p = Person::new(format!("{name}.jpg"));
        p.name = name.to_string();
        p
    }

    #[tokio::test]
    async fn test_insert_and_load_in_order() {
        let store = PeopleStore::open_in_memory().await.unwrap();
        for name in ["ann", "bob", "cy"] {
            store.insert(&named(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["ann", "bob", "cy"]);
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let store = PeopleStore::open_in_memory().await.unwrap();
        let ann = named("ann");
        let bob = named("bob");
        store.insert(&ann).await.unwrap();
        store.insert(&bob).await.unwrap();

        store.rename(&bob.id, "robert").await.unwrap();
        store.delete(&ann.id).await.unwrap();

        let people = store.load_all().await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "robert");
        assert_eq!(people[0].image, "bob.jpg");
    }

    #[tokio::test]
    async fn test_missing_id() {
        let store = PeopleStore::open_in_memory().await.unwrap();
        assert!(matches!(
            store.delete("nope").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.rename("nope", "x").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reopen_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("db/people.db");
        {
            let store = PeopleStore::open(&path).await.unwrap();
            store.insert(&named("ann")).await.unwrap();
        }
        let store = PeopleStore::open(&path).await.unwrap();
        assert_eq!(store.load_all().await.unwrap()[0].name, "ann");
    }
}
