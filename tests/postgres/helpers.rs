//! Shared test helpers for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, PostgresStore, TestStore, postgres_store};
use super::cluster::TemporaryDatabase;
pub use crate::test_helpers::ensure_dense;
use diesel::prelude::*;
use kanban::config::DatabaseSettings;
use kanban::task::{
    adapters::postgres::{PostgresTaskRepository, apply_migrations},
    services::TaskBoardService,
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

static EXTERNAL_MIGRATED: Mutex<bool> = Mutex::new(false);

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "kanban_test_template";

/// Service type used against real storage.
pub type PgBoardService = TaskBoardService<PostgresTaskRepository, DefaultClock>;

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub async fn ensure_template(cluster: PostgresCluster) -> Result<(), BoxError> {
    cluster.ensure_template_exists(TEMPLATE_DB, migrate).await
}

/// Applies the schema to an external server once per test binary.
///
/// Tests share the database there and stay apart through fresh project IDs.
///
/// # Errors
///
/// Returns an error if the server is unreachable or migration fails.
pub async fn ensure_external_schema(url: &str) -> Result<(), BoxError> {
    let url = url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut migrated = EXTERNAL_MIGRATED
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*migrated {
            migrate(&url)?;
            *migrated = true;
        }
        Ok::<(), BoxError>(())
    })
    .await
    .map_err(|err| Box::new(err) as BoxError)?
}

fn migrate(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    apply_migrations(&mut conn).map_err(|err| Box::new(err) as BoxError)
}

/// Service, repository, and the database backing them.
pub struct BoardContext {
    pub service: PgBoardService,
    pub repository: Arc<PostgresTaskRepository>,
    pub database_url: String,
    _temp_db: Option<TemporaryDatabase>,
}

/// Wires a service to a migrated database.
///
/// On the embedded cluster each context gets its own database cloned from
/// the template. On an external server contexts share the configured one.
///
/// # Errors
///
/// Returns an error if template setup, database creation, migration, or pool
/// construction fails.
#[fixture]
pub async fn board_context(postgres_store: PostgresStore) -> Result<BoardContext, BoxError> {
    let (database_url, temp_db) = match postgres_store {
        TestStore::Embedded(cluster) => {
            ensure_template(cluster).await?;
            let temp_db = cluster
                .temporary_database_from_template(&format!("board_{}", Uuid::new_v4()), TEMPLATE_DB)
                .await?;
            (temp_db.url().to_owned(), Some(temp_db))
        }
        TestStore::External(url) => {
            ensure_external_schema(url).await?;
            (url.clone(), None)
        }
    };

    let pool = DatabaseSettings::new(&database_url)
        .with_max_pool_size(4)
        .build_pool()
        .map_err(|err| Box::new(err) as BoxError)?;
    let repository = Arc::new(PostgresTaskRepository::new(pool));
    let service = TaskBoardService::new(Arc::clone(&repository), Arc::new(DefaultClock));
    Ok(BoardContext {
        service,
        repository,
        database_url,
        _temp_db: temp_db,
    })
}
