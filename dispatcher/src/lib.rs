//! # dispatcher
//!
//! Runs a fixed number of workers over the transport's inbound queue. Each worker takes the next
//! request, passes it through the fully wrapped root handler and delivers the produced responses
//! in order. A handler failure or a failed delivery is logged and never stops a worker; the
//! shared [`tokio_util::sync::CancellationToken`] given to [`Dispatcher::run`] is the only way to
//! stop the pool besides closing the queue.

mod options;
mod pool;
mod stats;

pub use options::{Affinity, DispatcherOptions};
pub use pool::{worker_for, Dispatcher};
pub use stats::{DispatcherStats, StatsSnapshot};
