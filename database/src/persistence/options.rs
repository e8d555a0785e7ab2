use super::storage::{
    memory::MemoryStorage, postgres::PgStorage, PersonStorage, Storage, StorageResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageEngine {
    /// tokio-postgres connection string, e.g. `host=localhost user=postgres`
    Postgres(String),
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub storage_engine: StorageEngine,
    pub create_schema: bool,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl StorageOptions {
    pub fn set_storage_engine(mut self, storage_engine: StorageEngine) -> Self {
        self.storage_engine = storage_engine;
        self
    }

    /// Defines whether the `persons` table is created on startup when it is missing. Handy
    /// for development, production databases should be migrated externally
    pub fn set_create_schema(mut self, create_schema: bool) -> Self {
        self.create_schema = create_schema;
        self
    }

    /// Builds and initialises the configured engine
    pub async fn connect(self) -> StorageResult<PersonStorage> {
        let storage = match self.storage_engine {
            StorageEngine::Postgres(database_url) => PersonStorage::Postgres(
                PgStorage::connect(&database_url, self.create_schema).await?,
            ),
            StorageEngine::Memory => PersonStorage::Memory(MemoryStorage::new()),
        };

        storage.init().await?;

        log::info!("📀 Storage ready [Engine: {}]", storage.name());

        Ok(storage)
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            storage_engine: StorageEngine::Postgres("host=localhost user=postgres".to_string()),
            create_schema: true,
        }
    }
}

impl StorageOptions {
    pub fn new_test() -> Self {
        StorageOptions::default().set_storage_engine(StorageEngine::Memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_engine_connects_without_a_database() {
        let storage = StorageOptions::new_test().connect().await.unwrap();

        assert_eq!(storage.name(), "memory");
        assert!(storage.list().await.unwrap().is_empty());
    }
}
