//! MS SQL Server connection implementation using tiberius

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use stageload_core::{BulkConnection, LoadError, Result, SchemaSource};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// Issued by `commit()`: tiberius autocommits each batch, so there is only
/// something to commit when an explicit transaction is open.
pub(crate) const COMMIT_GUARD: &str = "IF @@TRANCOUNT > 0 COMMIT TRANSACTION";

/// MS SQL Server connection errors
#[derive(Debug, thiserror::Error)]
pub enum MssqlConnectionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Statement execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MssqlConnectionError> for LoadError {
    fn from(err: MssqlConnectionError) -> Self {
        LoadError::Driver(err.to_string())
    }
}

/// MS SQL Server connection using tiberius
pub struct MssqlConnection {
    client: Mutex<Client<Compat<TcpStream>>>,
    closed: AtomicBool,
    database: Option<String>,
}

impl MssqlConnection {
    /// Create a new MS SQL Server connection
    ///
    /// # Arguments
    /// * `host` - Server hostname
    /// * `port` - Server port (default 1433)
    /// * `database` - Database name (optional)
    /// * `username` - Username (None for Windows auth)
    /// * `password` - Password
    /// * `trust_cert` - Whether to trust the server certificate
    #[tracing::instrument(skip(password))]
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        trust_cert: bool,
    ) -> std::result::Result<Self, MssqlConnectionError> {
        tracing::debug!("connecting to MS SQL Server at {}:{}", host, port);

        let mut config = Config::new();
        config.host(host);
        config.port(port);

        if let Some(db) = database {
            config.database(db);
        }

        if trust_cert {
            config.trust_cert();
        }

        config.encryption(EncryptionLevel::Required);

        match (username, password) {
            (Some(user), Some(pass)) => {
                config.authentication(AuthMethod::sql_server(user, pass));
            }
            (Some(user), None) => {
                config.authentication(AuthMethod::sql_server(user, ""));
            }
            (None, _) => {
                #[cfg(windows)]
                {
                    config.authentication(AuthMethod::Integrated);
                }
                #[cfg(not(windows))]
                {
                    return Err(MssqlConnectionError::AuthenticationFailed(
                        "Windows authentication is only supported on Windows".to_string(),
                    ));
                }
            }
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?;

        tcp.set_nodelay(true)?;
        let compat_stream = tcp.compat_write();

        let client = Client::connect(config, compat_stream)
            .await
            .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?;

        tracing::debug!("successfully connected to MS SQL Server");

        Ok(Self {
            client: Mutex::new(client),
            closed: AtomicBool::new(false),
            database: database.map(String::from),
        })
    }

    fn ensure_not_closed(&self) -> std::result::Result<(), MssqlConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MssqlConnectionError::ConnectionClosed);
        }
        Ok(())
    }

    /// Run a query and collect its first result set. Used by schema
    /// description; the bulk-load path itself only executes statements.
    pub(crate) async fn query_rows(
        &self,
        sql: &str,
        params: &[&dyn tiberius::ToSql],
    ) -> std::result::Result<Vec<tiberius::Row>, MssqlConnectionError> {
        self.ensure_not_closed()?;
        let mut client = self.client.lock().await;
        let stream = client
            .query(sql, params)
            .await
            .map_err(|e| MssqlConnectionError::ExecutionFailed(e.to_string()))?;
        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| MssqlConnectionError::ExecutionFailed(e.to_string()))?;
        Ok(rows)
    }
}

#[async_trait]
impl BulkConnection for MssqlConnection {
    fn driver_name(&self) -> &str {
        "mssql"
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.ensure_not_closed()?;
        let start = std::time::Instant::now();

        let mut client = self.client.lock().await;
        match client.execute(sql, &[]).await {
            Ok(exec_result) => {
                let affected_rows = exec_result.rows_affected().iter().sum::<u64>();
                tracing::debug!(
                    affected_rows = affected_rows,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "execute completed"
                );
                Ok(affected_rows)
            }
            Err(e) => {
                tracing::error!(error = %e, "execute failed");
                Err(LoadError::Driver(e.to_string()))
            }
        }
    }

    async fn commit(&self) -> Result<()> {
        self.ensure_not_closed()?;
        let mut client = self.client.lock().await;
        client
            .execute(COMMIT_GUARD, &[])
            .await
            .map_err(|e| LoadError::Driver(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!("MS SQL Server connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn as_schema_source(&self) -> Option<&dyn SchemaSource> {
        Some(self)
    }
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("database", &self.database)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
