use std::net::SocketAddr;

use pitlane_shared::{Car, CarState, Iteration};

// UserKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct UserKey(u64);

impl UserKey {
    pub fn to_u64(&self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        UserKey(value)
    }
}

/// Server-side record of one joined connection.
#[derive(Clone, Debug)]
pub struct User {
    address: SocketAddr,
    name: String,
    /// Position in the join sequence; decides grid order.
    join_order: u64,
    /// Independently replayed copy of the client's car.
    pub(crate) shadow: Car,
    /// Iteration of the last snapshot the shadow accepted. `None` until the
    /// first snapshot, and again after the car has been moved by the server.
    pub(crate) last_iteration: Option<Iteration>,
    pub(crate) last_state: Option<CarState>,
}

impl User {
    pub(crate) fn new(address: SocketAddr, name: &str, join_order: u64) -> Self {
        Self {
            address,
            name: name.to_string(),
            join_order,
            shadow: Car::default(),
            last_iteration: None,
            last_state: None,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join_order(&self) -> u64 {
        self.join_order
    }

    pub fn shadow(&self) -> &Car {
        &self.shadow
    }

    pub fn last_state(&self) -> Option<&CarState> {
        self.last_state.as_ref()
    }

    /// Forgets the replay baseline so the next snapshot is taken as-is.
    pub(crate) fn rebase(&mut self) {
        self.last_iteration = None;
    }
}
