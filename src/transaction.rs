//! Unit of work
//!
//! Stages entity creations, updates, removals and edge creations, then
//! hands them to the connection boundary as one ordered batch on commit.
//! Whether the batch is applied atomically is up to the boundary; the unit
//! of work only guarantees that nothing is dropped or reordered.

use crate::document::{Document, Entity};
use crate::error::{OrientError, Result};
use crate::graph::{Edge, Vertex};
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Unit of work state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    /// Accepting staged operations
    Open,
    /// Flushed to the connection; no further use
    Committed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Open => write!(f, "OPEN"),
            TransactionState::Committed => write!(f, "COMMITTED"),
        }
    }
}

/// What a staged operation does
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    CreateEdge { from: RecordId, to: RecordId },
}

/// One staged mutation, holding the entity as it was when staged
#[derive(Debug, Clone, PartialEq)]
pub struct StagedOperation {
    pub kind: OperationKind,
    pub record_id: RecordId,
    pub record: Document,
}

impl StagedOperation {
    fn new(kind: OperationKind, record: Document) -> Self {
        StagedOperation {
            kind,
            record_id: record.record_id(),
            record,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self.kind, OperationKind::Create | OperationKind::CreateEdge { .. })
    }
}

/// Receiver of committed batches; implemented by the connection boundary
pub trait TransactionSink: Send + Sync {
    /// Apply `operations` in the given order
    fn flush(&self, operations: &[StagedOperation]) -> Result<()>;
}

/// Staged batch of graph mutations.
///
/// Owned by a single caller while open; not meant for concurrent staging.
pub struct UnitOfWork {
    state: TransactionState,
    operations: Vec<StagedOperation>,
    sink: Arc<dyn TransactionSink>,
}

impl UnitOfWork {
    pub fn new(sink: Arc<dyn TransactionSink>) -> Self {
        UnitOfWork {
            state: TransactionState::Open,
            operations: Vec::new(),
            sink,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    /// Staged operations, in flush order
    pub fn operations(&self) -> &[StagedOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(OrientError::invalid_state(self.state, operation))
        }
    }

    fn staged_create(&self, record_id: RecordId) -> Option<usize> {
        self.operations
            .iter()
            .position(|op| op.kind == OperationKind::Create && op.record_id == record_id)
    }

    fn stage_create(&mut self, record: Document) {
        let record_id = record.record_id();
        match self.staged_create(record_id) {
            Some(index) => {
                trace!(%record_id, "Refreshing staged creation");
                self.operations[index].record = record;
            }
            None => {
                trace!(%record_id, "Staging creation");
                self.operations.push(StagedOperation::new(OperationKind::Create, record));
            }
        }
    }

    /// Stage `entity` as new. An entity without an id gets a temporary
    /// one, which is returned so later operations can refer to it.
    pub fn add_entity<E: Entity + ?Sized>(&mut self, entity: &mut E) -> Result<RecordId> {
        self.ensure_open("add an entity to")?;
        let record_id = entity.ensure_record_id();
        self.stage_create(entity.snapshot());
        Ok(record_id)
    }

    pub fn update<E: Entity + ?Sized>(&mut self, entity: &E) -> Result<()> {
        self.ensure_open("update an entity in")?;
        let record = Self::identified(entity, "update")?;
        trace!(record_id = %record.record_id(), "Staging update");
        self.operations.push(StagedOperation::new(OperationKind::Update, record));
        Ok(())
    }

    pub fn remove<E: Entity + ?Sized>(&mut self, entity: &E) -> Result<()> {
        self.ensure_open("remove an entity from")?;
        let record = Self::identified(entity, "remove")?;
        trace!(record_id = %record.record_id(), "Staging removal");
        self.operations.push(StagedOperation::new(OperationKind::Delete, record));
        Ok(())
    }

    fn identified<E: Entity + ?Sized>(entity: &E, operation: &str) -> Result<Document> {
        if entity.record_id().is_unset() {
            return Err(OrientError::invalid_argument(
                "entity",
                format!("cannot {} an entity without a record id", operation),
            ));
        }
        Ok(entity.snapshot())
    }

    /// Stage an edge from `from` to `to`.
    ///
    /// Endpoints without a server id are staged as new before the edge
    /// unless they already are, so they are flushed no later than the
    /// edge that references them. Use [`UnitOfWork::add_loop`] when both
    /// ends are the same vertex.
    pub fn add_edge(&mut self, edge: &mut Edge, from: &mut Vertex, to: &mut Vertex) -> Result<RecordId> {
        self.ensure_open("add an edge to")?;

        let from_id = from.ensure_record_id();
        let to_id = to.ensure_record_id();
        self.stage_endpoint(from_id, from);
        self.stage_endpoint(to_id, to);

        Ok(self.stage_edge(edge, from_id, to_id))
    }

    /// Stage an edge whose ends are both `vertex`
    pub fn add_loop(&mut self, edge: &mut Edge, vertex: &mut Vertex) -> Result<RecordId> {
        self.ensure_open("add an edge to")?;

        let vertex_id = vertex.ensure_record_id();
        self.stage_endpoint(vertex_id, vertex);

        Ok(self.stage_edge(edge, vertex_id, vertex_id))
    }

    fn stage_endpoint(&mut self, record_id: RecordId, vertex: &Vertex) {
        if !record_id.is_persistent() && self.staged_create(record_id).is_none() {
            self.stage_create(vertex.snapshot());
        }
    }

    fn stage_edge(&mut self, edge: &mut Edge, from: RecordId, to: RecordId) -> RecordId {
        edge.bind(from, to);
        let edge_id = edge.ensure_record_id();

        trace!(%edge_id, %from, %to, "Staging edge");
        self.operations.push(StagedOperation::new(
            OperationKind::CreateEdge { from, to },
            edge.snapshot(),
        ));
        edge_id
    }

    /// Flush all staged operations and close the unit of work.
    ///
    /// If the sink fails the unit of work stays open with its operations.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_open("commit")?;

        debug!(operations = self.operations.len(), "Committing unit of work");
        self.sink.flush(&self.operations)?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Discard staged operations without contacting the connection
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open("reset")?;

        debug!(discarded = self.operations.len(), "Resetting unit of work");
        self.operations.clear();
        Ok(())
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("state", &self.state)
            .field("operations", &self.operations.len())
            .finish()
    }
}
