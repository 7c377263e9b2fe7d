//! Unit tests for the MS SQL Server driver

use crate::connection::MssqlConnectionError;
use crate::driver::{ConnectionSettings, MssqlDriver};
use stageload_core::BulkDriver;

#[test]
fn test_mssql_driver_name() {
    let driver = MssqlDriver::new();
    assert_eq!(driver.name(), "mssql");
}

#[test]
fn test_parse_full_connection_string() {
    let settings = ConnectionSettings::parse(
        "Server=localhost,1433;Database=warehouse;User Id=sa;Password=secret;TrustServerCertificate=True",
    )
    .unwrap();

    assert_eq!(settings.host, "localhost");
    assert_eq!(settings.port, 1433);
    assert_eq!(settings.database.as_deref(), Some("warehouse"));
    assert_eq!(settings.username.as_deref(), Some("sa"));
    assert_eq!(settings.password.as_deref(), Some("secret"));
    assert!(settings.trust_cert);
}

#[test]
fn test_parse_defaults_port_to_1433() {
    let settings = ConnectionSettings::parse("Server=db.internal;Database=x").unwrap();
    assert_eq!(settings.host, "db.internal");
    assert_eq!(settings.port, 1433);
    assert!(!settings.trust_cert);
}

#[test]
fn test_parse_strips_tcp_prefix() {
    let settings = ConnectionSettings::parse("Server=tcp:db.internal,1500").unwrap();
    assert_eq!(settings.host, "db.internal");
    assert_eq!(settings.port, 1500);
}

#[test]
fn test_parse_uid_pwd_aliases() {
    let settings =
        ConnectionSettings::parse("Server=h;Initial Catalog=db;UID=user;PWD=pass").unwrap();
    assert_eq!(settings.database.as_deref(), Some("db"));
    assert_eq!(settings.username.as_deref(), Some("user"));
    assert_eq!(settings.password.as_deref(), Some("pass"));
}

#[test]
fn test_parse_ignores_unknown_keys() {
    let settings =
        ConnectionSettings::parse("Server=h;Application Name=loader;Connect Timeout=30").unwrap();
    assert_eq!(settings.host, "h");
}

#[test]
fn test_parse_missing_server_is_rejected() {
    let err = ConnectionSettings::parse("Database=x;User Id=sa").unwrap_err();
    assert!(matches!(
        err,
        MssqlConnectionError::InvalidConnectionString(_)
    ));
}

#[test]
fn test_parse_bad_port_is_rejected() {
    let err = ConnectionSettings::parse("Server=h,notaport").unwrap_err();
    assert!(matches!(
        err,
        MssqlConnectionError::InvalidConnectionString(_)
    ));
}

#[test]
fn test_connection_string_round_trip() {
    let original = ConnectionSettings {
        host: "localhost".to_string(),
        port: 1433,
        database: Some("warehouse".to_string()),
        username: Some("sa".to_string()),
        password: Some("secret".to_string()),
        trust_cert: true,
    };
    let parsed = ConnectionSettings::parse(&original.to_connection_string()).unwrap();
    assert_eq!(parsed, original);
}

#[test]
fn test_trusted_connection_string_has_no_credentials() {
    let settings = ConnectionSettings {
        host: "localhost".to_string(),
        port: 1433,
        database: Some("warehouse".to_string()),
        username: None,
        password: None,
        trust_cert: false,
    };
    let conn_str = settings.to_connection_string();
    assert!(conn_str.contains("Trusted_Connection=True"));
    assert!(!conn_str.contains("Password"));
}

#[test]
fn test_settings_debug_redacts_password() {
    let settings = ConnectionSettings {
        host: "localhost".to_string(),
        port: 1433,
        database: None,
        username: Some("sa".to_string()),
        password: Some("secret".to_string()),
        trust_cert: false,
    };
    let debug = format!("{:?}", settings);
    assert!(!debug.contains("secret"));
    assert!(debug.contains("<redacted>"));
}
