//! Shared application state for the private-plane HTTP handlers and the
//! public-plane websocket rooms (§5).
//!
//! Grounded on `openibank-api::AppState`'s service-handle bundle,
//! generalized from `{db, auth}` to the dual-plane coordinator's own
//! service handles. Every field is already internally `Arc`-shared (each
//! of `Registry`/`Ledger`/`VotingCoordinator`/`RoomRegistry` is `Clone`
//! over its own `Arc<RwLock<..>>>`), so `AppState` is cheap to clone per
//! request without an outer `Arc`.

use dualplane_ledger::Ledger;
use dualplane_projector::RoomRegistry;
use dualplane_registry::Registry;
use dualplane_voting::VotingCoordinator;

/// Handles to every coordinator service a transport handler may need.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub ledger: Ledger,
    pub voting: VotingCoordinator,
    pub rooms: RoomRegistry,
}

impl AppState {
    pub fn new(registry: Registry, ledger: Ledger, voting: VotingCoordinator, rooms: RoomRegistry) -> Self {
        Self {
            registry,
            ledger,
            voting,
            rooms,
        }
    }

    /// Construct a fresh, empty state for handler unit tests.
    #[cfg(test)]
    pub fn test() -> Self {
        let registry = Registry::new();
        let ledger = Ledger::with_registry(registry.clone());
        let voting = VotingCoordinator::new(registry.clone(), ledger.clone());
        let rooms = RoomRegistry::default();
        Self::new(registry, ledger, voting, rooms)
    }
}

