use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    consts::consts::{PersonId, START_AT_ID},
    model::{
        person::{NewPerson, Person},
        statement::UpdatePersonData,
    },
};

use super::{Storage, StorageError, StorageResult};

struct PersonTable {
    /// Keyed by id, iteration order is creation order because ids only grow
    person_rows: BTreeMap<PersonId, Person>,
    next_id: PersonId,
}

/// In process storage engine, used for local development and tests
pub struct MemoryStorage {
    table: Mutex<PersonTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(PersonTable {
                person_rows: BTreeMap::new(),
                next_id: START_AT_ID,
            }),
        }
    }

    // The guard is always dropped before the calling future yields
    fn lock(&self) -> StorageResult<MutexGuard<'_, PersonTable>> {
        self.table.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    async fn init(&self) -> StorageResult<()> {
        // Nothing to create
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> StorageResult<Vec<Person>> {
        let table = self.lock()?;

        Ok(table.person_rows.values().cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: PersonId) -> StorageResult<Option<Person>> {
        let table = self.lock()?;

        Ok(table.person_rows.get(&id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, person: NewPerson) -> StorageResult<Person> {
        let mut table = self.lock()?;

        // Ids are never handed out twice, even after the row is deleted
        let id = table.next_id;
        table.next_id = id.increment();

        let person = person.into_person(id);
        table.person_rows.insert(id, person.clone());

        Ok(person)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: PersonId,
        update: UpdatePersonData,
    ) -> StorageResult<Option<Person>> {
        let mut table = self.lock()?;

        let Some(row) = table.person_rows.get_mut(&id) else {
            return Ok(None);
        };

        *row = update.apply(row);

        Ok(Some(row.clone()))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: PersonId) -> StorageResult<bool> {
        let mut table = self.lock()?;

        Ok(table.person_rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::statement::UpdateStatement;

    mod create {
        use super::*;

        #[test_log::test(tokio::test)]
        async fn assigns_increasing_ids_from_one() {
            let storage = MemoryStorage::new();

            let first = storage.create(NewPerson::new_test()).await.unwrap();
            let second = storage
                .create(NewPerson::new("Jane".to_string()))
                .await
                .unwrap();

            assert_eq!(first.id, PersonId(1));
            assert_eq!(second.id, PersonId(2));
        }

        #[test_log::test(tokio::test)]
        async fn ids_are_not_reused_after_delete() {
            // Given a table with a single person
            let storage = MemoryStorage::new();
            let person = storage.create(NewPerson::new_test()).await.unwrap();

            // When we delete that person and create another
            assert!(storage.delete(person.id).await.unwrap());
            let next = storage.create(NewPerson::new_test()).await.unwrap();

            // Then the old id is skipped
            assert_eq!(next.id, person.id.increment());
        }
    }

    mod list {
        use super::*;

        #[test_log::test(tokio::test)]
        async fn empty_table_lists_nothing() {
            let storage = MemoryStorage::new();

            assert!(storage.list().await.unwrap().is_empty());
        }

        #[test_log::test(tokio::test)]
        async fn lists_in_creation_order() {
            let storage = MemoryStorage::new();

            let names = ["One", "Two", "Three"];

            for name in names {
                storage
                    .create(NewPerson::new(name.to_string()))
                    .await
                    .unwrap();
            }

            let listed: Vec<String> = storage
                .list()
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.name)
                .collect();

            assert_eq!(listed, names);
        }
    }

    mod update {
        use super::*;

        #[test_log::test(tokio::test)]
        async fn update_merges_into_stored_row() {
            let storage = MemoryStorage::new();
            let person = storage.create(NewPerson::new_test()).await.unwrap();

            let update = UpdatePersonData {
                age: UpdateStatement::Set(31),
                ..Default::default()
            };

            let updated = storage
                .update(person.id, update)
                .await
                .unwrap()
                .expect("person should exist");

            assert_eq!(
                updated,
                Person {
                    age: Some(31),
                    ..person.clone()
                }
            );

            // And the change is persisted
            assert_eq!(storage.get(person.id).await.unwrap(), Some(updated));
        }

        #[test_log::test(tokio::test)]
        async fn update_missing_row_returns_none() {
            let storage = MemoryStorage::new();

            let result = storage
                .update(PersonId(999), UpdatePersonData::default())
                .await
                .unwrap();

            assert!(result.is_none());
        }
    }

    mod delete {
        use super::*;

        #[test_log::test(tokio::test)]
        async fn delete_missing_row_reports_false() {
            let storage = MemoryStorage::new();

            assert!(!storage.delete(PersonId(999)).await.unwrap());
        }

        #[test_log::test(tokio::test)]
        async fn deleted_row_is_gone() {
            let storage = MemoryStorage::new();
            let person = storage.create(NewPerson::new_test()).await.unwrap();

            storage.delete(person.id).await.unwrap();

            assert_eq!(storage.get(person.id).await.unwrap(), None);
        }
    }
}
