//! Connection configuration
//!
//! [`ConnectionOptions`] says which database to open; [`FactoryConfig`]
//! collects the protocol and serializer a [`ConnectionFactory`] needs and
//! refuses to build without them.

use crate::connection::{ConnectionFactory, ConnectionProtocol};
use crate::error::{OrientError, Result};
use crate::serializer::RecordSerializer;
use crate::types::DatabaseType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Database to connect to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Database name
    pub database: String,
    /// Document or graph database
    pub database_type: DatabaseType,
    /// Physical connections the protocol may pool
    pub pool_size: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            database: String::new(),
            database_type: DatabaseType::Graph,
            pool_size: 10,
        }
    }
}

impl ConnectionOptions {
    pub fn new(database: impl Into<String>) -> Self {
        ConnectionOptions {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_database_type(mut self, database_type: DatabaseType) -> Self {
        self.database_type = database_type;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Load from a JSON document; missing keys take their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let options: ConnectionOptions = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(OrientError::invalid_argument("database", "cannot be empty"));
        }
        if self.pool_size == 0 {
            return Err(OrientError::invalid_argument("pool_size", "must be at least 1"));
        }
        Ok(())
    }
}

/// Collaborators required to open connections
pub struct FactoryConfig<D> {
    protocol: Option<Arc<dyn ConnectionProtocol<Data = D>>>,
    serializer: Option<Arc<dyn RecordSerializer<Data = D>>>,
}

impl<D> FactoryConfig<D> {
    pub fn new() -> Self {
        FactoryConfig {
            protocol: None,
            serializer: None,
        }
    }

    pub fn protocol(mut self, protocol: Arc<dyn ConnectionProtocol<Data = D>>) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn RecordSerializer<Data = D>>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn build(self) -> Result<ConnectionFactory<D>> {
        let protocol = self
            .protocol
            .ok_or_else(|| OrientError::invalid_argument("protocol", "cannot be null"))?;
        let serializer = self
            .serializer
            .ok_or_else(|| OrientError::invalid_argument("serializer", "cannot be null"))?;
        Ok(ConnectionFactory::new(protocol, serializer))
    }
}

impl<D> Default for FactoryConfig<D> {
    fn default() -> Self {
        Self::new()
    }
}
