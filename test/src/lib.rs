//! End-to-end helpers: an in-memory transport, a small square level and a
//! session harness that pumps a server and its clients in lock-step.

pub mod local_hub;
pub mod test_level;

pub use harness::{init_logging, ManualClock, Session};
pub use local_hub::LocalHub;
pub use test_level::{TestLevel, TRACK_SIZE};
