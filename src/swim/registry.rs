//! # Trajectory registry
//!
//! Process-wide store of the trajectories of the current event, in two slots:
//! [`TrajectoryKind::MonteCarlo`] (truth) and [`TrajectoryKind::Reconstructed`].
//!
//! Publishing replaces a slot with a new immutable snapshot and then notifies every subscriber,
//! synchronously and in registration order. Readers clone the snapshot `Arc` and never observe a
//! half-replaced collection; they only contend with a publisher for the pointer swap itself.
//!
//! Lifecycle
//! -----------------
//! * [`TrajectoryRegistry::global`] lazily creates the process-wide instance,
//! * [`TrajectoryRegistry::publish`] / [`TrajectoryRegistry::clear`] per event,
//! * [`TrajectoryRegistry::teardown`] at shutdown empties both slots and drops every subscriber.
//!
//! Independent registries can be created with [`TrajectoryRegistry::new`], e.g. in tests.
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, trace};

use super::trajectory::SwimTrajectory;

/// The two trajectory collections an event can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrajectoryKind {
    MonteCarlo,
    Reconstructed,
}

impl fmt::Display for TrajectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrajectoryKind::MonteCarlo => write!(f, "Monte-Carlo"),
            TrajectoryKind::Reconstructed => write!(f, "reconstructed"),
        }
    }
}

/// An immutable published collection. Trajectories are shared, never copied.
pub type TrajectorySnapshot = Arc<Vec<Arc<SwimTrajectory>>>;

/// Receives a callback each time a registry slot changes.
///
/// A listener may publish from its callback. Publishing the kind it is being notified for
/// notifies it again, synchronously and on the same stack, so such a listener must stop
/// republishing on its own (e.g. with a flag) or it recurses until the stack overflows.
pub trait SwimTrajectoryListener: Send + Sync {
    /// Called after `kind` was published or cleared. Read the new content through the registry.
    fn on_trajectories_changed(&self, kind: TrajectoryKind);

    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Adapts a closure into a [`SwimTrajectoryListener`].
pub struct FnListener<F>
where
    F: Fn(TrajectoryKind) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(TrajectoryKind) + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> SwimTrajectoryListener for FnListener<F>
where
    F: Fn(TrajectoryKind) + Send + Sync,
{
    fn on_trajectories_changed(&self, kind: TrajectoryKind) {
        (self.handler)(kind);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

static GLOBAL: Lazy<TrajectoryRegistry> = Lazy::new(TrajectoryRegistry::new);

#[derive(Default)]
pub struct TrajectoryRegistry {
    monte_carlo: RwLock<Option<TrajectorySnapshot>>,
    reconstructed: RwLock<Option<TrajectorySnapshot>>,
    // serializes publish + notify; reentrant so a listener may publish in turn
    publish_lock: ReentrantMutex<()>,
    listeners: RwLock<Vec<Arc<dyn SwimTrajectoryListener>>>,
}

impl TrajectoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static TrajectoryRegistry {
        &GLOBAL
    }

    fn slot(&self, kind: TrajectoryKind) -> &RwLock<Option<TrajectorySnapshot>> {
        match kind {
            TrajectoryKind::MonteCarlo => &self.monte_carlo,
            TrajectoryKind::Reconstructed => &self.reconstructed,
        }
    }

    /// Current snapshot of a slot, `None` if nothing was published since the last clear.
    pub fn trajectories(&self, kind: TrajectoryKind) -> Option<TrajectorySnapshot> {
        self.slot(kind).read().clone()
    }

    /// Replace a slot with `trajectories` and notify subscribers.
    ///
    /// Return
    /// ----------
    /// * The snapshot now visible to readers.
    pub fn publish(
        &self,
        kind: TrajectoryKind,
        trajectories: Vec<Arc<SwimTrajectory>>,
    ) -> TrajectorySnapshot {
        let _guard = self.publish_lock.lock();

        let snapshot: TrajectorySnapshot = Arc::new(trajectories);
        *self.slot(kind).write() = Some(Arc::clone(&snapshot));
        debug!(%kind, count = snapshot.len(), "trajectories published");

        self.notify(kind);
        snapshot
    }

    /// Empty a slot. Subscribers are notified as for a publish.
    pub fn clear(&self, kind: TrajectoryKind) {
        let _guard = self.publish_lock.lock();

        let previous = self.slot(kind).write().take();
        debug!(
            %kind,
            dropped = previous.as_ref().map_or(0, |s| s.len()),
            "trajectories cleared"
        );

        self.notify(kind);
    }

    pub fn clear_all(&self) {
        self.clear(TrajectoryKind::MonteCarlo);
        self.clear(TrajectoryKind::Reconstructed);
    }

    /// Empty both slots without notification and drop every subscriber.
    pub fn teardown(&self) {
        let _guard = self.publish_lock.lock();

        *self.monte_carlo.write() = None;
        *self.reconstructed.write() = None;
        let dropped = std::mem::take(&mut *self.listeners.write());
        debug!(listeners = dropped.len(), "trajectory registry torn down");
    }

    pub fn subscribe(&self, listener: Arc<dyn SwimTrajectoryListener>) {
        let name = listener.name().to_string();
        self.listeners.write().push(listener);
        debug!(listener = %name, "trajectory listener added");
    }

    /// Remove a listener by identity.
    ///
    /// Return
    /// ----------
    /// * `true` if the listener was subscribed.
    pub fn unsubscribe(&self, listener: &Arc<dyn SwimTrajectoryListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn notify(&self, kind: TrajectoryKind) {
        // listeners may (un)subscribe from their callback
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            trace!(listener = listener.name(), %kind, "notifying");
            listener.on_trajectories_changed(kind);
        }
    }
}

impl fmt::Debug for TrajectoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |kind| self.trajectories(kind).map(|s| s.len());
        f.debug_struct("TrajectoryRegistry")
            .field("monte_carlo", &count(TrajectoryKind::MonteCarlo))
            .field("reconstructed", &count(TrajectoryKind::Reconstructed))
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
