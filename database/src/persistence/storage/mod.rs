use thiserror::Error;

use crate::{
    consts::consts::PersonId,
    model::{
        person::{NewPerson, Person},
        statement::UpdatePersonData,
    },
};

use self::{memory::MemoryStorage, postgres::PgStorage};

pub mod memory;
pub mod postgres;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Storage lock was poisoned by a panicking request")]
    Poisoned,

    #[error("Stored row could not be read: {0}")]
    InvalidRow(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Row level access to the `persons` table
///
/// Every method is a single round trip to the backing store, update and delete are
/// conditional statements so there is no window between the existence check and the
/// write.
#[allow(async_fn_in_trait)]
pub trait Storage {
    /// Prepares the backing store, e.g. creating the table when it is missing
    async fn init(&self) -> StorageResult<()>;

    /// All persons in creation order
    async fn list(&self) -> StorageResult<Vec<Person>>;

    async fn get(&self, id: PersonId) -> StorageResult<Option<Person>>;

    async fn create(&self, person: NewPerson) -> StorageResult<Person>;

    /// `None` when no person has the id
    async fn update(
        &self,
        id: PersonId,
        update: UpdatePersonData,
    ) -> StorageResult<Option<Person>>;

    /// `true` when a row was removed
    async fn delete(&self, id: PersonId) -> StorageResult<bool>;
}

pub enum PersonStorage {
    Postgres(PgStorage),
    Memory(MemoryStorage),
}

impl PersonStorage {
    pub fn name(&self) -> &'static str {
        match self {
            PersonStorage::Postgres(_) => "postgres",
            PersonStorage::Memory(_) => "memory",
        }
    }
}

// Is there a way to avoid this duplication?
impl Storage for PersonStorage {
    async fn init(&self) -> StorageResult<()> {
        match self {
            PersonStorage::Postgres(s) => s.init().await,
            PersonStorage::Memory(s) => s.init().await,
        }
    }

    async fn list(&self) -> StorageResult<Vec<Person>> {
        match self {
            PersonStorage::Postgres(s) => s.list().await,
            PersonStorage::Memory(s) => s.list().await,
        }
    }

    async fn get(&self, id: PersonId) -> StorageResult<Option<Person>> {
        match self {
            PersonStorage::Postgres(s) => s.get(id).await,
            PersonStorage::Memory(s) => s.get(id).await,
        }
    }

    async fn create(&self, person: NewPerson) -> StorageResult<Person> {
        match self {
            PersonStorage::Postgres(s) => s.create(person).await,
            PersonStorage::Memory(s) => s.create(person).await,
        }
    }

    async fn update(
        &self,
        id: PersonId,
        update: UpdatePersonData,
    ) -> StorageResult<Option<Person>> {
        match self {
            PersonStorage::Postgres(s) => s.update(id, update).await,
            PersonStorage::Memory(s) => s.update(id, update).await,
        }
    }

    async fn delete(&self, id: PersonId) -> StorageResult<bool> {
        match self {
            PersonStorage::Postgres(s) => s.delete(id).await,
            PersonStorage::Memory(s) => s.delete(id).await,
        }
    }
}
