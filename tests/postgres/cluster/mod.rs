//! Cluster lifecycle helpers for `PostgreSQL` integration tests.
//!
//! A non-empty `DATABASE_URL` points the suites at an existing server.
//! Otherwise an embedded cluster is started: unprivileged runs start it
//! in-process, privileged runs need a worker binary supplied through
//! `PG_EMBEDDED_WORKER`. A cluster that cannot start fails the suite.

mod fs_utils;

use self::env_utils::{ScopedEnv, env_vars_to_os, port_override};
use self::fs_utils::{sync_password_from_file, sync_port_from_pid};
use diesel::prelude::*;
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use rstest::fixture;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

static SHARED_STORE: OnceLock<TestStore> = OnceLock::new();
static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Shared `PostgreSQL` cluster handle for integration tests.
pub type PostgresCluster = &'static ManagedCluster;

/// Shared store handle for integration tests.
pub type PostgresStore = &'static TestStore;

/// `PostgreSQL` server the integration tests run against.
pub enum TestStore {
    /// Embedded cluster owned by this test binary.
    Embedded(ManagedCluster),
    /// Existing server named by `DATABASE_URL`.
    External(String),
}

/// Managed embedded `PostgreSQL` cluster for test lifecycles.
pub struct ManagedCluster {
    bootstrap: TestBootstrapSettings,
    env_vars: Vec<(String, Option<String>)>,
    runtime: Option<Runtime>,
    postgres: Option<PostgreSQL>,
}

impl ManagedCluster {
    fn new() -> Result<Self, BoxError> {
        let port_guard = ScopedEnv::apply(&port_override()?);
        let mut bootstrap = bootstrap_for_tests().map_err(|err| Box::new(err) as BoxError)?;
        drop(port_guard);
        sync_password_from_file(&mut bootstrap.settings)?;
        let env_vars = bootstrap.environment.to_env();
        let mut cluster = Self {
            bootstrap,
            env_vars,
            runtime: None,
            postgres: None,
        };
        cluster.start()?;
        Ok(cluster)
    }

    fn settings(&self) -> &Settings {
        &self.bootstrap.settings
    }

    /// Returns the connection URL for a database on this cluster.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.settings().url(database)
    }

    /// Creates `template` and runs `migrate` against it unless it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be created or migrated.
    pub async fn ensure_template_exists<F>(
        &'static self,
        template: &'static str,
        migrate: F,
    ) -> Result<(), BoxError>
    where
        F: FnOnce(&str) -> Result<(), BoxError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let lock = TEMPLATE_LOCK.get_or_init(|| Mutex::new(()));
            let _guard = lock
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);

            if self.database_exists(template)? {
                return Ok(());
            }

            self.execute_admin_sql(&format!("CREATE DATABASE {}", quote_identifier(template)))?;
            if let Err(err) = migrate(&self.database_url(template)) {
                self.drop_database(template)?;
                return Err(err);
            }
            Ok(())
        })
        .await
        .map_err(|err| Box::new(err) as BoxError)?
    }

    /// Clones `template` into a fresh database dropped with the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub async fn temporary_database_from_template(
        &'static self,
        name: &str,
        template: &'static str,
    ) -> Result<TemporaryDatabase, BoxError> {
        let db_name = name.to_owned();
        let sql = format!(
            "CREATE DATABASE {} TEMPLATE {}",
            quote_identifier(&db_name),
            quote_identifier(template),
        );
        tokio::task::spawn_blocking(move || self.execute_admin_sql(&sql))
            .await
            .map_err(|err| Box::new(err) as BoxError)??;

        Ok(TemporaryDatabase {
            url: self.database_url(&db_name),
            name: db_name,
            cluster: self,
        })
    }

    fn drop_database(&self, db_name: &str) -> Result<(), BoxError> {
        let sql = format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_identifier(db_name)
        );
        self.execute_admin_sql(&sql)
    }

    fn start(&mut self) -> Result<(), BoxError> {
        match self.bootstrap.privileges {
            ExecutionPrivileges::Root => self.start_via_worker(),
            ExecutionPrivileges::Unprivileged => self.start_in_process(),
        }
    }

    fn start_in_process(&mut self) -> Result<(), BoxError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Box::new(err) as BoxError)?;
        let env_guard = ScopedEnv::apply(&env_vars_to_os(&self.env_vars));
        let mut postgres = PostgreSQL::new(self.bootstrap.settings.clone());
        runtime.block_on(async {
            postgres
                .setup()
                .await
                .map_err(|err| Box::new(err) as BoxError)?;
            if !matches!(postgres.status(), Status::Started) {
                postgres
                    .start()
                    .await
                    .map_err(|err| Box::new(err) as BoxError)?;
            }
            Ok::<(), BoxError>(())
        })?;
        drop(env_guard);
        self.bootstrap.settings = postgres.settings().clone();
        sync_port_from_pid(&mut self.bootstrap.settings)?;
        self.runtime = Some(runtime);
        self.postgres = Some(postgres);
        Ok(())
    }

    fn start_via_worker(&mut self) -> Result<(), BoxError> {
        self.run_worker_operation(WorkerOperation::Setup, self.bootstrap.setup_timeout)?;
        self.run_worker_operation(WorkerOperation::Start, self.bootstrap.start_timeout)?;
        sync_port_from_pid(&mut self.bootstrap.settings)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        let Some(postgres) = self.postgres.take() else {
            if matches!(self.bootstrap.privileges, ExecutionPrivileges::Root) {
                self.run_worker_operation(WorkerOperation::Stop, self.bootstrap.shutdown_timeout)?;
            }
            return Ok(());
        };
        let Some(runtime) = &self.runtime else {
            return Ok(());
        };
        runtime
            .block_on(postgres.stop())
            .map_err(|err| Box::new(err) as BoxError)
    }

    fn run_worker_operation(
        &self,
        operation: WorkerOperation,
        timeout: Duration,
    ) -> Result<(), BoxError> {
        let worker = self.bootstrap.worker_binary.as_ref().ok_or_else(|| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "running as root requires PG_EMBEDDED_WORKER to name a worker binary",
            )) as BoxError
        })?;
        let args = WorkerRequestArgs {
            worker: worker.as_path(),
            settings: &self.bootstrap.settings,
            env_vars: &self.env_vars,
            operation,
            timeout,
        };
        run_worker(&WorkerRequest::new(args)).map_err(|err| Box::new(err) as BoxError)
    }

    fn execute_admin_sql(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = PgConnection::establish(&self.database_url("postgres"))
            .map_err(|err| Box::new(err) as BoxError)?;
        diesel::sql_query(sql)
            .execute(&mut conn)
            .map_err(|err| Box::new(err) as BoxError)?;
        Ok(())
    }

    fn database_exists(&self, db_name: &str) -> Result<bool, BoxError> {
        #[derive(diesel::QueryableByName)]
        struct ExistsRow {
            #[diesel(sql_type = diesel::sql_types::Bool)]
            exists: bool,
        }

        let mut conn = PgConnection::establish(&self.database_url("postgres"))
            .map_err(|err| Box::new(err) as BoxError)?;
        let row = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS exists",
        )
        .bind::<diesel::sql_types::Text, _>(db_name)
        .get_result::<ExistsRow>(&mut conn)
        .map_err(|err| Box::new(err) as BoxError)?;
        Ok(row.exists)
    }
}

impl Drop for ManagedCluster {
    fn drop(&mut self) {
        drop(self.stop());
    }
}

/// Database cloned from a template; dropped from the cluster on drop.
pub struct TemporaryDatabase {
    cluster: PostgresCluster,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Connection URL of the database.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(&self.name));
    }
}

/// Provides the shared store: `DATABASE_URL` when set, else an embedded
/// cluster started on first use.
///
/// # Panics
///
/// Panics when the embedded cluster cannot start.
#[fixture]
pub fn postgres_store() -> PostgresStore {
    SHARED_STORE.get_or_init(|| {
        if let Some(url) = external_database_url() {
            return TestStore::External(url);
        }
        // Startup blocks on its own runtime, so keep it off the test's.
        match std::thread::spawn(ManagedCluster::new).join() {
            Ok(Ok(cluster)) => TestStore::Embedded(cluster),
            Ok(Err(err)) => panic!("SKIP-TEST-CLUSTER: failed to start PostgreSQL: {err}"),
            Err(_) => panic!("SKIP-TEST-CLUSTER: PostgreSQL startup thread panicked"),
        }
    })
}

fn external_database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
