//! The worker layer between the render loop and the issue backend.
//!
//! 1. The state machine turns input into an [`Intent`].
//! 2. [`Pipeline`] decides whether it needs the network (cache, debounce,
//!    coalescing) and hands it to [`TaskSpawner`].
//! 3. The task sends a [`WorkerMessage`] back through the channel.
//! 4. The main loop drains the channel with `try_recv()` and passes each
//!    message to [`Pipeline::apply`], which drops stale results.

pub mod intent;
pub mod pipeline;
pub mod spawner;

pub use intent::{FetchKind, FieldUpdate, Intent, RequestTarget};
pub use pipeline::{Applied, Dispatch, Pipeline};
pub use spawner::{create_task_channel, TaskSpawner, WorkerMessage, Written};
