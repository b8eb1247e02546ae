//! Reconciliation engine.
//!
//! An integration fills a [`ResourceInventory`] from the current state and
//! the desired state, then either reports or applies the difference. Both
//! paths go through [`diff`], so a dry run always reports exactly what a real
//! cycle would do.

pub mod keys;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::Result;
use crate::inventory::{ResourceInventory, ResourceState};

/// A payload that can be compared for reconciliation.
pub trait Resource {
    /// Identity of the resource, also its storage name.
    fn name(&self) -> &str;

    /// Whether `self` and `other` hold the same content. Names are not compared.
    fn same_content(&self, other: &Self) -> bool;
}

/// What to do with one inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a, P> {
    NoOp,
    /// Create or overwrite from the desired payload.
    Upsert(&'a P),
    /// Remove the resource named by the current payload.
    Delete(&'a P),
}

/// Classify a single entry. First match wins:
/// current without desired deletes, missing or differing current upserts,
/// anything else is a no-op.
pub fn classify<P: Resource, C>(state: &ResourceState<P, C>) -> Action<'_, P> {
    match (&state.current, &state.desired) {
        (Some(current), None) => Action::Delete(current),
        (None, Some(desired)) => Action::Upsert(desired),
        (Some(current), Some(desired)) if !current.same_content(desired) => {
            Action::Upsert(desired)
        }
        _ => Action::NoOp,
    }
}

/// Kind of a planned or applied change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Upsert,
    Delete,
}

/// A change to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Change {
    pub kind: ChangeKind,
    /// Inventory key.
    pub key: String,
    /// Name of the resource acted on.
    pub name: String,
}

/// All non-no-op changes in the inventory, in key order, each with the
/// payload it acts on: the desired payload for an upsert, the current one for
/// a delete.
pub fn plan<P: Resource, C>(inventory: &ResourceInventory<P, C>) -> Vec<(Change, &P)> {
    inventory
        .iter()
        .filter_map(|(key, state)| {
            let (kind, payload) = match classify(state) {
                Action::NoOp => return None,
                Action::Upsert(p) => (ChangeKind::Upsert, p),
                Action::Delete(p) => (ChangeKind::Delete, p),
            };
            let change = Change {
                kind,
                key: key.clone(),
                name: payload.name().to_string(),
            };
            Some((change, payload))
        })
        .collect()
}

/// All non-no-op changes in the inventory, in key order.
pub fn diff<P: Resource, C>(inventory: &ResourceInventory<P, C>) -> Vec<Change> {
    plan(inventory).into_iter().map(|(change, _)| change).collect()
}

/// Per-cycle context handed to every integration step.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle: u64,
    /// Span all log lines of this cycle are recorded under.
    pub span: Span,
    /// Cancelled when the runner shuts down.
    pub cancel: CancellationToken,
}

impl CycleContext {
    pub fn new(cycle: u64, cancel: CancellationToken) -> Self {
        Self {
            cycle,
            span: tracing::info_span!("cycle", cycle),
            cancel,
        }
    }
}

/// A three-phase reconciliation over one resource type.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Payload compared between both sides.
    type Payload: Resource + Send + Sync;
    /// Raw record backing the desired payload.
    type Config: Send + Sync;

    fn name(&self) -> &str;

    /// One-time preparation before the first cycle.
    async fn setup(&self) -> Result<()>;

    async fn current_state(
        &self,
        ctx: &CycleContext,
        inventory: &mut ResourceInventory<Self::Payload, Self::Config>,
    ) -> Result<()>;

    async fn desired_state(
        &self,
        ctx: &CycleContext,
        inventory: &mut ResourceInventory<Self::Payload, Self::Config>,
    ) -> Result<()>;

    /// Apply the diff. Returns the applied changes; stops at the first failure.
    async fn reconcile(
        &self,
        ctx: &CycleContext,
        inventory: &ResourceInventory<Self::Payload, Self::Config>,
    ) -> Result<Vec<Change>>;

    /// Log the diff without applying it. Returns the planned changes.
    fn log_diff(
        &self,
        ctx: &CycleContext,
        inventory: &ResourceInventory<Self::Payload, Self::Config>,
    ) -> Vec<Change>;
}
