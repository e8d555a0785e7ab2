use actix_cors::Cors;
use actix_web::{
    middleware::{self, Condition},
    web, App, HttpServer,
};
use clap::{Parser, ValueEnum};
use database::persistence::options::{StorageEngine, StorageOptions};
use std::io;

mod error;
mod routes;

#[derive(ValueEnum, Clone, Debug)]
enum Storage {
    /// Reads / writes the `persons` table of a postgres database
    Postgres,
    /// Keeps persons in process, everything is lost on shutdown
    Memory,
}

/// 📇 Persons HTTP Server, provides a REST interface for creating, reading, updating and deleting persons
#[derive(Parser, Debug)]
struct Cli {
    /// Port the http server will run on
    #[clap(short, long, env = "PERSONS_PORT", default_value = "8080")]
    port: u16,

    /// Address the http server will run on
    #[clap(short, long, env = "PERSONS_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// tokio-postgres connection string, only used with the postgres storage
    #[clap(
        long,
        env = "DATABASE_URL",
        default_value = "host=localhost user=postgres",
        hide_env_values = true
    )]
    database_url: String,

    #[clap(long, env = "PERSONS_STORAGE", value_enum, default_value_t = Storage::Postgres)]
    storage: Storage,

    /// Do not create the persons table on startup, use when the schema is migrated externally
    #[clap(long)]
    skip_schema_creation: bool,

    /// Logs every http request
    #[clap(long)]
    log_http: bool,

    #[clap(long, default_value_t = 2)]
    http_workers: usize,
}

impl Cli {
    fn storage_options(&self) -> StorageOptions {
        let storage_engine = match self.storage {
            Storage::Postgres => StorageEngine::Postgres(self.database_url.clone()),
            Storage::Memory => StorageEngine::Memory,
        };

        StorageOptions::default()
            .set_storage_engine(storage_engine)
            .set_create_schema(!self.skip_schema_creation)
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Cli::parse();

    // Shared by every worker, handlers receive it through `web::Data`
    let storage = args
        .storage_options()
        .connect()
        .await
        .map(web::Data::new)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    log::info!("starting HTTP server on {}:{}", args.address, args.port);

    HttpServer::new(move || {
        App::new()
            .app_data(storage.clone())
            .configure(routes::configure)
            .wrap(Cors::permissive())
            .wrap(Condition::new(args.log_http, middleware::Logger::default()))
    })
    .workers(args.http_workers)
    .bind((args.address, args.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_postgres_with_schema_creation() {
        let args = Cli::parse_from(["persons"]);

        let options = args.storage_options();

        assert!(matches!(options.storage_engine, StorageEngine::Postgres(_)));
        assert!(options.create_schema);
    }

    #[test]
    fn memory_storage_without_schema_creation() {
        let args = Cli::parse_from(["persons", "--storage", "memory", "--skip-schema-creation"]);

        let options = args.storage_options();

        assert_eq!(options.storage_engine, StorageEngine::Memory);
        assert!(!options.create_schema);
    }
}
