//! Person lookup and registration
//!
//! Persons are addressed either by guid or by identity card number.

use chrono::Utc;
use dactyl_common::db::Person;
use dactyl_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use std::fmt;
use uuid::Uuid;

use super::{parse_guid, parse_timestamp};

/// How a caller identifies a person
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonKey {
    Id(Uuid),
    IdentityCard(String),
}

impl PersonKey {
    /// A segment that parses as a UUID is an id, anything else an identity card
    pub fn parse(segment: &str) -> Self {
        match Uuid::parse_str(segment) {
            Ok(id) => PersonKey::Id(id),
            Err(_) => PersonKey::IdentityCard(segment.to_string()),
        }
    }
}

impl fmt::Display for PersonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonKey::Id(id) => write!(f, "{}", id),
            PersonKey::IdentityCard(card) => write!(f, "identity card {}", card),
        }
    }
}

/// POST /persons body
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
    pub identity_card: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Person> {
    let guid: String = row.get("guid");
    let created_at: String = row.get("created_at");

    Ok(Person {
        guid: parse_guid(&guid)?,
        identity_card: row.get("identity_card"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Find a person by id or identity card
pub async fn find_person(pool: &SqlitePool, key: &PersonKey) -> Result<Option<Person>> {
    let query = match key {
        PersonKey::Id(id) => sqlx::query(
            "SELECT guid, identity_card, first_name, last_name, created_at FROM persons WHERE guid = ?",
        )
        .bind(id.to_string()),
        PersonKey::IdentityCard(card) => sqlx::query(
            "SELECT guid, identity_card, first_name, last_name, created_at FROM persons WHERE identity_card = ?",
        )
        .bind(card.clone()),
    };

    match query.fetch_optional(pool).await? {
        Some(row) => Ok(Some(from_row(&row)?)),
        None => Ok(None),
    }
}

/// Register a new person
///
/// A duplicate identity card surfaces as the database's unique violation.
pub async fn create_person(pool: &SqlitePool, new_person: NewPerson) -> Result<Person> {
    let identity_card = new_person.identity_card.trim().to_string();
    if identity_card.is_empty() {
        return Err(Error::InvalidInput("identity_card must not be empty".to_string()));
    }

    let person = Person {
        guid: Uuid::new_v4(),
        identity_card,
        first_name: new_person.first_name,
        last_name: new_person.last_name,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO persons (guid, identity_card, first_name, last_name, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(person.guid.to_string())
    .bind(&person.identity_card)
    .bind(&person.first_name)
    .bind(&person.last_name)
    .bind(person.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    tracing::info!(person_id = %person.guid, "Registered person");

    Ok(person)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dactyl_common::db::init_memory_database;

    fn new_person(card: &str) -> NewPerson {
        NewPerson {
            identity_card: card.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
        }
    }

    #[test]
    fn test_person_key_parse() {
        let id = Uuid::new_v4();
        assert_eq!(PersonKey::parse(&id.to_string()), PersonKey::Id(id));
        assert_eq!(
            PersonKey::parse("1712345678"),
            PersonKey::IdentityCard("1712345678".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_then_find_by_both_keys() {
        let pool = init_memory_database().await.unwrap();
        let created = create_person(&pool, new_person("1712345678")).await.unwrap();

        let by_id = find_person(&pool, &PersonKey::Id(created.guid)).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&created));

        let by_card = find_person(&pool, &PersonKey::IdentityCard("1712345678".to_string()))
            .await
            .unwrap();
        assert_eq!(by_card, Some(created));
    }

    #[tokio::test]
    async fn test_find_missing_person() {
        let pool = init_memory_database().await.unwrap();
        let found = find_person(&pool, &PersonKey::Id(Uuid::new_v4())).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identity_card_is_unique_violation() {
        let pool = init_memory_database().await.unwrap();
        create_person(&pool, new_person("0102030405")).await.unwrap();

        let err = create_person(&pool, new_person("0102030405")).await.unwrap_err();
        assert!(err.is_unique_violation(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_empty_identity_card_rejected() {
        let pool = init_memory_database().await.unwrap();
        let err = create_person(&pool, new_person("  ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
