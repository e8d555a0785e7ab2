use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls, Row};

use crate::{
    consts::consts::PersonId,
    model::{
        person::{NewPerson, Person},
        statement::{UpdatePersonData, UpdateStatement},
    },
};

use super::{Storage, StorageError, StorageResult};

const CREATE_PERSONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS "public"."persons" (
        "id" bigserial NOT NULL,
        "name" text NOT NULL,
        "age" int4,
        "address" text,
        "work" text,
        PRIMARY KEY ("id")
    );
"#;

const LIST_PERSONS: &str = r#"
    SELECT "id", "name", "age", "address", "work" FROM "public"."persons" ORDER BY "id";
"#;

const GET_PERSON: &str = r#"
    SELECT "id", "name", "age", "address", "work" FROM "public"."persons" WHERE "id" = $1;
"#;

const INSERT_PERSON: &str = r#"
    INSERT INTO "public"."persons" ("name", "age", "address", "work") VALUES ($1, $2, $3, $4)
    RETURNING "id", "name", "age", "address", "work";
"#;

// Each column comes with a "touch" flag, NoChanges keeps the stored value. Doing the
//  existence check and the write in one statement means a concurrent delete can not
//  sneak in between them.
const UPDATE_PERSON: &str = r#"
    UPDATE "public"."persons" SET
        "name" = CASE WHEN $2 THEN $3 ELSE "name" END,
        "age" = CASE WHEN $4 THEN $5 ELSE "age" END,
        "address" = CASE WHEN $6 THEN $7 ELSE "address" END,
        "work" = CASE WHEN $8 THEN $9 ELSE "work" END
    WHERE "id" = $1
    RETURNING "id", "name", "age", "address", "work";
"#;

const DELETE_PERSON: &str = r#"
    DELETE FROM "public"."persons" WHERE "id" = $1;
"#;

/// Production storage engine backed by the `persons` table
///
/// A single `tokio_postgres::Client` is shared between every request, the client pipelines
/// statements from concurrent callers over its connection so a request only ever holds
/// the statement it is waiting on. When the connection drops (server restart, idle
/// timeout) the next request replaces the client with a fresh connection.
pub struct PgStorage {
    database_url: String,
    client: RwLock<Arc<Client>>,
    create_schema: bool,
}

/// Connects and spawns the connection driver on the current tokio runtime
async fn open(database_url: &str) -> StorageResult<Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("Postgres connection error: {}", e);
        }
    });

    Ok(client)
}

impl PgStorage {
    pub async fn connect(database_url: &str, create_schema: bool) -> StorageResult<Self> {
        let client = open(database_url).await?;

        Ok(Self {
            database_url: database_url.to_string(),
            client: RwLock::new(Arc::new(client)),
            create_schema,
        })
    }

    /// Hands out the shared client, reconnecting first when its connection has closed
    async fn client(&self) -> StorageResult<Arc<Client>> {
        {
            let client = self.client.read().await;

            if !client.is_closed() {
                return Ok(Arc::clone(&client));
            }
        }

        let mut client = self.client.write().await;

        // Another request may have reconnected while we waited for the write lock
        if client.is_closed() {
            log::warn!("Postgres connection closed, reconnecting");
            *client = Arc::new(open(&self.database_url).await?);
        }

        Ok(Arc::clone(&client))
    }
}

/// Splits a statement into the flag / value pair the update query expects
fn touch<T: Clone>(statement: &UpdateStatement<T>) -> (bool, Option<T>) {
    match statement {
        UpdateStatement::Set(value) => (true, Some(value.clone())),
        UpdateStatement::Unset => (true, None),
        UpdateStatement::NoChanges => (false, None),
    }
}

fn row_to_person(row: &Row) -> StorageResult<Person> {
    let name: String = row.try_get("name")?;

    // The column is NOT NULL, but an empty name would still break the model invariant
    if name.is_empty() {
        return Err(StorageError::InvalidRow(
            "person row has an empty name".to_string(),
        ));
    }

    Ok(Person {
        id: PersonId(row.try_get("id")?),
        name,
        age: row.try_get("age")?,
        address: row.try_get("address")?,
        work: row.try_get("work")?,
    })
}

impl Storage for PgStorage {
    #[tracing::instrument(skip(self))]
    async fn init(&self) -> StorageResult<()> {
        if !self.create_schema {
            log::info!("Skipping schema creation");
            return Ok(());
        }

        // DO baseline creates
        self.client().await?.execute(CREATE_PERSONS_TABLE, &[]).await?;

        log::info!("Ensured table [persons] exists");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> StorageResult<Vec<Person>> {
        let rows = self.client().await?.query(LIST_PERSONS, &[]).await?;

        rows.iter().map(row_to_person).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: PersonId) -> StorageResult<Option<Person>> {
        let row = self.client().await?.query_opt(GET_PERSON, &[&id.to_number()]).await?;

        row.as_ref().map(row_to_person).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, person: NewPerson) -> StorageResult<Person> {
        let row = self
            .client()
            .await?
            .query_one(
                INSERT_PERSON,
                &[&person.name, &person.age, &person.address, &person.work],
            )
            .await?;

        row_to_person(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: PersonId,
        update: UpdatePersonData,
    ) -> StorageResult<Option<Person>> {
        let (set_name, name) = touch(&update.name);
        let (set_age, age) = touch(&update.age);
        let (set_address, address) = touch(&update.address);
        let (set_work, work) = touch(&update.work);

        // A NULL name with the flag set would trip the NOT NULL constraint, validation
        //  rejects it before we get here
        let row = self
            .client()
            .await?
            .query_opt(
                UPDATE_PERSON,
                &[
                    &id.to_number(),
                    &set_name,
                    &name,
                    &set_age,
                    &age,
                    &set_address,
                    &address,
                    &set_work,
                    &work,
                ],
            )
            .await?;

        row.as_ref().map(row_to_person).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: PersonId) -> StorageResult<bool> {
        let deleted = self
            .client()
            .await?
            .execute(DELETE_PERSON, &[&id.to_number()])
            .await?;

        Ok(deleted > 0)
    }
}
