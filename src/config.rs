// Compile-time sizing defaults
//
// Capacities are const generics on the queue and pool types; these are
// the values used when a caller does not pick its own.

/// Tasklet handles addressable by a default `Scheduler`.
pub const DEFAULT_TASKLETS: usize = 16;

/// Callback records held by a default `FixedPool`.
pub const DEFAULT_CONTEXT_NODES: usize = 8;
