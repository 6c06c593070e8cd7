//! `rts-kernel` — the cooperative task core of the `rust_rts` engine.
//!
//! # Model
//!
//! A single-threaded cooperative scheduler runs lightweight tasks.  Tasks are
//! async state machines whose only suspension points are the kernel ops:
//! `send` / `receive` / `reply` (a blocking rendezvous), `yield_now`,
//! `await_event`, and `wait`.  No two tasks ever execute simultaneously, and
//! between suspension points a task has exclusive access to everything it can
//! reach — no locks anywhere.
//!
//! Two system services ride on top:
//!
//! - the **name server** — string name → tid registry (`register`/`who_is`)
//! - the **time server** — tick counting and deferred replies to `delay`
//!   requests, fed by a subordinate tick-notifier task
//!
//! # Crate layout
//!
//! | Module          | Contents                                        |
//! |-----------------|-------------------------------------------------|
//! | [`sched`]       | `Kernel`, the scheduler, priorities             |
//! | [`task`]        | `TaskCtx` — the per-task op handle              |
//! | [`event`]       | Well-known `EventId`s                           |
//! | [`name_server`] | The name server task and its client helpers     |
//! | [`time_server`] | The time server pair and its client helpers     |
//! | [`error`]       | `KernelError`, `KernelResult<T>`                |

pub mod error;
pub mod event;
pub mod name_server;
pub mod sched;
pub mod task;
pub mod time_server;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{KernelError, KernelResult};
pub use name_server::{register, who_is};
pub use sched::{DEFAULT_PRIORITY, Kernel, PRIORITY_LEVELS, SERVER_PRIORITY};
pub use task::TaskCtx;
pub use time_server::{delay, sleep};
