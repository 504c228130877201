//! OrientDB client core
//!
//! Record identity, typed entities and staged graph mutations for clients
//! of an OrientDB server. The wire protocol is not implemented here; it is
//! plugged in behind the traits in [`connection`] and [`serializer`].
//!
//! # Architecture
//!
//! - Types: record ids (`#cluster:position`), temporary ids, clusters
//! - Values: tagged field values and the ordered property bag
//! - Documents: entity header plus schemaless property-bag entity
//! - Hydration: descriptor tables that turn wire bags into typed entities
//! - Graph: vertex and edge views over reserved bag keys
//! - Transactions: unit of work that stages and commits mutations
//! - Connection: boundary traits, validation and query logging

pub mod error;
pub mod types;
pub mod value;
pub mod document;
pub mod hydration;
pub mod graph;

// Unit of work
pub mod transaction;

// Boundary modules
pub mod connection;
pub mod serializer;
pub mod config;
pub mod logging;

pub use error::{ErrorKind, OrientError, Result};
pub use types::{Cluster, ClusterType, DatabaseType, OrientContext, RecordFormat, RecordId, StorageType, TempIdAllocator};
pub use value::{FromValue, PrimitiveKind, PropertyBag, Value};
pub use document::{materialize, Document, Entity, EntityHeader};
pub use hydration::{hydrate_model, model_to_wire, EntityModel, FieldDescriptor, FieldShape, Modeled};
pub use graph::{Edge, GraphElement, ReservedKey, Vertex, CLASS_NAME_KEY};

// Transaction exports
pub use transaction::{OperationKind, StagedOperation, TransactionSink, TransactionState, UnitOfWork};

// Boundary exports
pub use connection::{CommandResult, ConnectionFactory, ConnectionProtocol, DatabaseConnection, OrientConnection, ServerConnection};
pub use serializer::{JsonRecordSerializer, RecordSerializer};
pub use config::{ConnectionOptions, FactoryConfig};
pub use logging::{init_logging, LogLevel};
