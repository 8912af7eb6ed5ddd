// Deferred tasklet scheduling
// Single core, no preemption. Work posted from handlers runs later from
// the host loop, strictly first in, first out.
//
// Producers post a TaskId (or a callback through the multiplexer). The
// first post into an empty queue raises the PendingSignal; the host loop
// answers with one drain(), which runs exactly what was queued when it
// started. Anything posted meanwhile waits for the next drain.

#[cfg(feature = "callback")]
pub mod callback;
#[cfg(feature = "callback")]
pub mod pool;
pub mod scheduler;
pub mod task;
pub mod wake;

#[cfg(feature = "callback")]
pub use callback::{Callback, CallbackTasklet, Defer, PostError};
#[cfg(feature = "callback")]
pub use pool::{ContextPool, FixedPool, Record, RecordId};
pub use scheduler::{Post, Scheduler};
pub use task::TaskId;
pub use wake::{PendingCounter, PendingFlag, PendingSignal};
