//! Connection boundary
//!
//! The wire protocol lives behind these traits. This module only adds
//! argument validation, query logging and typed hydration of results on
//! top of whatever implementation is plugged in.

use crate::config::ConnectionOptions;
use crate::document::{materialize, Document, Entity};
use crate::error::{OrientError, Result};
use crate::serializer::RecordSerializer;
use crate::transaction::UnitOfWork;
use crate::types::{DatabaseType, StorageType};
use std::sync::Arc;
use tracing::debug;

/// Outcome of a non-query command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    pub records_affected: usize,
    pub updated_records: Vec<Document>,
}

/// Operations on an open database
pub trait DatabaseConnection: Send + Sync {
    fn execute_query(&self, sql: &str) -> Result<Vec<Document>>;

    fn execute_prepared_query(&self, sql: &str, parameters: &[String]) -> Result<Vec<Document>>;

    fn execute_command(&self, sql: &str) -> Result<CommandResult>;

    fn create_transaction(&self) -> Result<UnitOfWork>;
}

/// Server-level session: database lifecycle and configuration
pub trait ServerConnection: Send + Sync {
    fn create_database(
        &self,
        database: &str,
        database_type: DatabaseType,
        storage_type: StorageType,
    ) -> Result<Arc<dyn DatabaseConnection>>;

    fn database_connect(
        &self,
        database: &str,
        database_type: DatabaseType,
        pool_size: usize,
    ) -> Result<Arc<dyn DatabaseConnection>>;

    fn delete_database(&self, database: &str, storage_type: StorageType) -> Result<()>;

    fn database_exists(&self, database: &str, storage_type: StorageType) -> Result<bool>;

    fn shutdown(&self, username: &str, password: &str) -> Result<()>;

    fn list_databases(&self) -> Result<Vec<String>>;

    fn get_config_value(&self, name: &str) -> Result<String>;

    fn set_config_value(&self, name: &str, value: &str) -> Result<()>;
}

/// Wire protocol able to open server sessions
pub trait ConnectionProtocol: Send + Sync {
    type Data;

    fn create_server_connection(
        &self,
        serializer: Arc<dyn RecordSerializer<Data = Self::Data>>,
    ) -> Result<Arc<dyn ServerConnection>>;
}

fn require_sql(sql: &str) -> Result<()> {
    if sql.trim().is_empty() {
        return Err(OrientError::invalid_argument(
            "sql",
            "cannot be zero length or whitespace",
        ));
    }
    Ok(())
}

/// Validating, logging front of a [`DatabaseConnection`]
#[derive(Clone)]
pub struct OrientConnection {
    database: String,
    inner: Arc<dyn DatabaseConnection>,
}

impl OrientConnection {
    pub fn new(database: impl Into<String>, inner: Arc<dyn DatabaseConnection>) -> Result<Self> {
        let database = database.into();
        if database.trim().is_empty() {
            return Err(OrientError::invalid_argument("database", "cannot be empty"));
        }
        Ok(OrientConnection { database, inner })
    }

    /// Connect through `server` using validated `options`
    pub fn open(server: &dyn ServerConnection, options: &ConnectionOptions) -> Result<Self> {
        options.validate()?;
        debug!(database = %options.database, pool_size = options.pool_size, "Connecting to database");
        let inner = server.database_connect(&options.database, options.database_type, options.pool_size)?;
        Self::new(options.database.clone(), inner)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Run a query and return the raw records
    pub fn execute_query(&self, sql: &str) -> Result<Vec<Document>> {
        require_sql(sql)?;
        debug!(database = %self.database, sql, "Executing SQL query");
        self.inner.execute_query(sql)
    }

    /// Run a query and hydrate every record into `T`
    pub fn query<T: Entity + Default>(&self, sql: &str) -> Result<Vec<T>> {
        self.execute_query(sql)?
            .iter()
            .map(|record| materialize::<T>(record))
            .collect()
    }

    pub fn execute_prepared_query(&self, sql: &str, parameters: &[String]) -> Result<Vec<Document>> {
        require_sql(sql)?;
        debug!(
            database = %self.database,
            sql,
            parameters = parameters.len(),
            "Executing prepared SQL query"
        );
        self.inner.execute_prepared_query(sql, parameters)
    }

    pub fn prepared_query<T: Entity + Default>(&self, sql: &str, parameters: &[String]) -> Result<Vec<T>> {
        self.execute_prepared_query(sql, parameters)?
            .iter()
            .map(|record| materialize::<T>(record))
            .collect()
    }

    pub fn execute_command(&self, sql: &str) -> Result<CommandResult> {
        require_sql(sql)?;
        debug!(database = %self.database, sql, "Executing SQL command");
        self.inner.execute_command(sql)
    }

    pub fn create_transaction(&self) -> Result<UnitOfWork> {
        self.inner.create_transaction()
    }
}

impl std::fmt::Debug for OrientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrientConnection")
            .field("database", &self.database)
            .finish()
    }
}

/// Opens server sessions with a fixed protocol and serializer
pub struct ConnectionFactory<D> {
    protocol: Arc<dyn ConnectionProtocol<Data = D>>,
    serializer: Arc<dyn RecordSerializer<Data = D>>,
}

impl<D> ConnectionFactory<D> {
    pub fn new(
        protocol: Arc<dyn ConnectionProtocol<Data = D>>,
        serializer: Arc<dyn RecordSerializer<Data = D>>,
    ) -> Self {
        ConnectionFactory { protocol, serializer }
    }

    pub fn serializer(&self) -> &Arc<dyn RecordSerializer<Data = D>> {
        &self.serializer
    }

    pub fn create_connection(&self) -> Result<Arc<dyn ServerConnection>> {
        debug!(format = ?self.serializer.record_format(), "Creating server connection");
        self.protocol.create_server_connection(self.serializer.clone())
    }

    /// Open a server session and connect to the database in `options`
    pub fn open(&self, options: &ConnectionOptions) -> Result<OrientConnection> {
        options.validate()?;
        let server = self.create_connection()?;
        OrientConnection::open(server.as_ref(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transaction::{StagedOperation, TransactionSink};

    struct EchoConnection;

    impl TransactionSink for EchoConnection {
        fn flush(&self, _operations: &[StagedOperation]) -> Result<()> {
            Ok(())
        }
    }

    impl DatabaseConnection for EchoConnection {
        fn execute_query(&self, sql: &str) -> Result<Vec<Document>> {
            let mut doc = Document::new();
            doc.set("sql", sql);
            Ok(vec![doc])
        }

        fn execute_prepared_query(&self, _sql: &str, parameters: &[String]) -> Result<Vec<Document>> {
            Ok(parameters
                .iter()
                .map(|p| {
                    let mut doc = Document::new();
                    doc.set("param", p.clone());
                    doc
                })
                .collect())
        }

        fn execute_command(&self, _sql: &str) -> Result<CommandResult> {
            Ok(CommandResult {
                records_affected: 2,
                updated_records: Vec::new(),
            })
        }

        fn create_transaction(&self) -> Result<UnitOfWork> {
            Ok(UnitOfWork::new(Arc::new(EchoConnection)))
        }
    }

    fn connection() -> OrientConnection {
        OrientConnection::new("demo", Arc::new(EchoConnection)).unwrap()
    }

    #[test]
    fn test_rejects_blank_sql() {
        let conn = connection();
        for sql in ["", "   "] {
            assert_eq!(conn.execute_query(sql).unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(conn.execute_command(sql).unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(
                conn.execute_prepared_query(sql, &[]).unwrap_err().kind(),
                ErrorKind::InvalidArgument
            );
        }
    }

    #[test]
    fn test_rejects_blank_database() {
        let err = OrientConnection::new(" ", Arc::new(EchoConnection)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_delegates_to_inner() {
        let conn = connection();
        let docs = conn.execute_query("SELECT FROM V").unwrap();
        assert_eq!(docs[0].get::<String>("sql"), "SELECT FROM V");

        let docs = conn
            .execute_prepared_query("SELECT FROM V WHERE a = ?", &["x".to_string()])
            .unwrap();
        assert_eq!(docs.len(), 1);

        assert_eq!(conn.execute_command("DELETE VERTEX V").unwrap().records_affected, 2);
        assert!(conn.create_transaction().unwrap().is_open());
    }
}
