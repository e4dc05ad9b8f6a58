use log::{info, warn};

use pitlane_shared::{Millis, PeriodicTimer};

/// A directory of running servers. Each call is expected to give up after
/// its own timeout and report failure rather than block the tick for long.
pub trait PresenceService: Send {
    fn register_server(&mut self, port: u16) -> bool;
    fn keep_alive(&mut self, port: u16) -> bool;
}

/// Keeps this server listed: registers until that works, then sends
/// keepalives. Any failure is retried on the next period.
pub struct PresenceKeeper {
    service: Box<dyn PresenceService>,
    port: u16,
    registered: bool,
    register_timer: PeriodicTimer,
    keepalive_timer: PeriodicTimer,
}

impl PresenceKeeper {
    pub fn new(
        service: Box<dyn PresenceService>,
        port: u16,
        register_period: Millis,
        keepalive_period: Millis,
    ) -> Self {
        Self {
            service,
            port,
            registered: false,
            register_timer: PeriodicTimer::new(register_period),
            keepalive_timer: PeriodicTimer::new(keepalive_period),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn update(&mut self, now: Millis) {
        if !self.registered {
            if !self.register_timer.fire(now) {
                return;
            }
            if self.service.register_server(self.port) {
                info!("Presence: registered on port {}", self.port);
                self.registered = true;
                self.keepalive_timer.reset(now);
            } else {
                warn!("Presence: registration failed, retrying");
            }
            return;
        }

        if !self.keepalive_timer.fire(now) {
            return;
        }
        if !self.service.keep_alive(self.port) {
            warn!("Presence: keepalive failed, registering again");
            self.registered = false;
            self.register_timer.reset(now);
        }
    }
}
