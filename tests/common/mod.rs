//! In-memory connection double shared by the integration tests

#![allow(dead_code)]

use orient_core::*;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Records every committed batch
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<Vec<StagedOperation>>>,
}

impl TransactionSink for RecordingSink {
    fn flush(&self, operations: &[StagedOperation]) -> Result<()> {
        self.batches.lock().push(operations.to_vec());
        Ok(())
    }
}

/// Database that answers queries from a fixed record set
pub struct MemoryDatabase {
    pub records: RwLock<Vec<Document>>,
    pub issued: Mutex<Vec<String>>,
    pub sink: Arc<RecordingSink>,
}

impl MemoryDatabase {
    pub fn new(records: Vec<Document>) -> Self {
        MemoryDatabase {
            records: RwLock::new(records),
            issued: Mutex::new(Vec::new()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    /// `SELECT FROM <class>` returns records of that class
    fn select(&self, sql: &str) -> Vec<Document> {
        let class = sql.split_whitespace().last().unwrap_or_default();
        self.records
            .read()
            .iter()
            .filter(|r| r.class_name().eq_ignore_ascii_case(class))
            .cloned()
            .collect()
    }
}

impl DatabaseConnection for MemoryDatabase {
    fn execute_query(&self, sql: &str) -> Result<Vec<Document>> {
        self.issued.lock().push(sql.to_string());
        Ok(self.select(sql))
    }

    fn execute_prepared_query(&self, sql: &str, parameters: &[String]) -> Result<Vec<Document>> {
        self.issued.lock().push(format!("{} {:?}", sql, parameters));
        Ok(self.select(sql))
    }

    fn execute_command(&self, sql: &str) -> Result<CommandResult> {
        self.issued.lock().push(sql.to_string());
        if sql.starts_with("FAIL") {
            return Err(OrientError::connection("server rejected command"));
        }
        Ok(CommandResult {
            records_affected: self.records.read().len(),
            updated_records: Vec::new(),
        })
    }

    fn create_transaction(&self) -> Result<UnitOfWork> {
        Ok(UnitOfWork::new(self.sink.clone()))
    }
}

/// Server holding named in-memory databases
#[derive(Default)]
pub struct MemoryServer {
    pub databases: RwLock<HashMap<String, Arc<MemoryDatabase>>>,
    pub config: RwLock<HashMap<String, String>>,
}

impl MemoryServer {
    pub fn with_database(name: &str, records: Vec<Document>) -> Self {
        let server = MemoryServer::default();
        server
            .databases
            .write()
            .insert(name.to_string(), Arc::new(MemoryDatabase::new(records)));
        server
    }
}

impl ServerConnection for MemoryServer {
    fn create_database(
        &self,
        database: &str,
        _database_type: DatabaseType,
        _storage_type: StorageType,
    ) -> Result<Arc<dyn DatabaseConnection>> {
        let db = Arc::new(MemoryDatabase::new(Vec::new()));
        self.databases.write().insert(database.to_string(), db.clone());
        Ok(db)
    }

    fn database_connect(
        &self,
        database: &str,
        _database_type: DatabaseType,
        _pool_size: usize,
    ) -> Result<Arc<dyn DatabaseConnection>> {
        match self.databases.read().get(database) {
            Some(db) => Ok(db.clone()),
            None => Err(OrientError::connection(format!("database '{}' does not exist", database))),
        }
    }

    fn delete_database(&self, database: &str, _storage_type: StorageType) -> Result<()> {
        self.databases.write().remove(database);
        Ok(())
    }

    fn database_exists(&self, database: &str, _storage_type: StorageType) -> Result<bool> {
        Ok(self.databases.read().contains_key(database))
    }

    fn shutdown(&self, _username: &str, _password: &str) -> Result<()> {
        Ok(())
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn get_config_value(&self, name: &str) -> Result<String> {
        Ok(self.config.read().get(name).cloned().unwrap_or_default())
    }

    fn set_config_value(&self, name: &str, value: &str) -> Result<()> {
        self.config.write().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Protocol handing out a shared in-memory server
pub struct MemoryProtocol {
    pub server: Arc<MemoryServer>,
}

impl ConnectionProtocol for MemoryProtocol {
    type Data = serde_json::Value;

    fn create_server_connection(
        &self,
        _serializer: Arc<dyn RecordSerializer<Data = serde_json::Value>>,
    ) -> Result<Arc<dyn ServerConnection>> {
        Ok(self.server.clone())
    }
}

/// Record with header fields set
pub fn record(class_name: &str, rid: RecordId, fields: Vec<(&str, Value)>) -> Document {
    let mut doc = Document::with_class(class_name);
    doc.header_mut().record_id = rid;
    doc.header_mut().version = 1;
    for (key, value) in fields {
        doc.set(key, value);
    }
    doc
}
