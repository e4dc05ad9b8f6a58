/// Physics tick counter stamped on every car snapshot.
pub type Iteration = u32;

/// Wall-clock milliseconds. Each peer reads its own clock; values are only
/// ever compared against the same peer's clock.
pub type Millis = u64;
