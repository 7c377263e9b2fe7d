//! MS SQL Server driver implementation

use crate::connection::{MssqlConnection, MssqlConnectionError};
use async_trait::async_trait;
use stageload_core::{BulkConnection, BulkDriver, Result};
use std::sync::Arc;

/// Parsed ADO-style connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub trust_cert: bool,
}

impl ConnectionSettings {
    /// Parse an ADO-style connection string
    /// (`Server=host,port;Database=db;User Id=u;Password=p;...`).
    /// Unknown keys are ignored.
    pub fn parse(connection_string: &str) -> std::result::Result<Self, MssqlConnectionError> {
        let mut host = None;
        let mut port = 1433u16;
        let mut database = None;
        let mut username = None;
        let mut password = None;
        let mut trust_cert = false;

        for pair in connection_string.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(MssqlConnectionError::InvalidConnectionString(format!(
                    "expected key=value, got '{}'",
                    pair
                )));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "server" | "data source" | "address" => {
                    let server = value.strip_prefix("tcp:").unwrap_or(value);
                    match server.split_once(',') {
                        Some((name, port_text)) => {
                            host = Some(name.trim().to_string());
                            port = port_text.trim().parse().map_err(|_| {
                                MssqlConnectionError::InvalidConnectionString(format!(
                                    "invalid port '{}'",
                                    port_text
                                ))
                            })?;
                        }
                        None => host = Some(server.to_string()),
                    }
                }
                "database" | "initial catalog" => database = Some(value.to_string()),
                "user id" | "uid" | "user" => username = Some(value.to_string()),
                "password" | "pwd" => password = Some(value.to_string()),
                "trustservercertificate" | "trust server certificate" => {
                    trust_cert = matches!(
                        value.to_ascii_lowercase().as_str(),
                        "true" | "yes" | "1"
                    );
                }
                _ => {}
            }
        }

        let host = host.ok_or_else(|| {
            MssqlConnectionError::InvalidConnectionString(
                "missing Server= entry".to_string(),
            )
        })?;

        Ok(Self {
            host,
            port,
            database,
            username,
            password,
            trust_cert,
        })
    }

    /// Render the settings back to a connection string
    pub fn to_connection_string(&self) -> String {
        let mut parts = vec![format!("Server={},{}", self.host, self.port)];
        if let Some(database) = &self.database {
            parts.push(format!("Database={}", database));
        }
        match &self.username {
            Some(username) => {
                parts.push(format!("User Id={}", username));
                if let Some(password) = &self.password {
                    parts.push(format!("Password={}", password));
                }
            }
            None => parts.push("Trusted_Connection=True".to_string()),
        }
        if self.trust_cert {
            parts.push("TrustServerCertificate=True".to_string());
        }
        parts.join(";")
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

/// MS SQL Server driver
#[derive(Debug, Default)]
pub struct MssqlDriver;

impl MssqlDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BulkDriver for MssqlDriver {
    fn name(&self) -> &'static str {
        "mssql"
    }

    async fn connect(&self, connection_string: &str) -> Result<Arc<dyn BulkConnection>> {
        let settings = ConnectionSettings::parse(connection_string)?;
        let connection = MssqlConnection::connect(
            &settings.host,
            settings.port,
            settings.database.as_deref(),
            settings.username.as_deref(),
            settings.password.as_deref(),
            settings.trust_cert,
        )
        .await?;
        Ok(Arc::new(connection))
    }
}
