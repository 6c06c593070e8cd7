//! The scheduler and its public face, `Kernel`.
//!
//! # Execution model
//!
//! Every task is a `Pin<Box<dyn Future<Output = ()>>>` stored in a slot
//! indexed by its tid.  [`Kernel::run`] pops the highest-priority ready task
//! (lowest numeric priority first, FIFO within a priority) and polls it.  A
//! poll returns either `Ready(())` — the task exited — or `Pending`, which
//! means the task registered a blocked state through one of the
//! [`TaskCtx`][crate::TaskCtx] ops and will only be re-queued when the
//! kernel delivers its completion.  Wakers carry no information here:
//! readiness is always explicit, so tasks poll with the no-op waker.
//!
//! Tids index a grow-only slot vector and are never reused, so a stale tid
//! can be detected (`exited`) instead of aliasing a new task.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use rustc_hash::FxHashMap;

use rts_core::{EventId, TaskId};

use crate::error::{KernelError, KernelResult};
use crate::task::TaskCtx;
use crate::{name_server, time_server};

/// Number of distinct task priorities.  Lower value runs first.
pub const PRIORITY_LEVELS: usize = 8;

/// Priority the system services run at.
pub const SERVER_PRIORITY: u8 = 0;

/// A reasonable default for application tasks.
pub const DEFAULT_PRIORITY: u8 = 4;

// ── Blocked states and completions ────────────────────────────────────────────

/// Why a task is not ready.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// Queued on `to`'s sender queue, waiting for it to receive.
    Send { to: TaskId },
    /// Waiting for any sender.
    Receive,
    /// Message delivered to `to`; waiting for its reply.
    Reply { to: TaskId },
    /// Waiting for an event to be raised.
    Event(EventId),
    /// Waiting for a task to exit.
    Wait(TaskId),
}

/// The value a blocked op resumes with.
pub(crate) enum Completion {
    Received { from: TaskId, msg: Vec<u8> },
    Replied(Vec<u8>),
    Event(u64),
    Waited(bool),
    /// The peer exited before the rendezvous completed.
    Aborted,
}

// ── Task slot ─────────────────────────────────────────────────────────────────

pub(crate) struct TaskSlot {
    pub parent: TaskId,
    pub priority: u8,
    /// The task body.  `None` while being polled and after exit.
    pub future: Option<Pin<Box<dyn Future<Output = ()>>>>,
    pub block: Option<BlockKind>,
    pub exited: bool,
    pub completion: Option<Completion>,
    pub destructor: Option<Box<dyn FnOnce()>>,
    /// Tasks send-blocked on this task, FIFO.
    pub sender_queue: VecDeque<TaskId>,
    /// Tasks blocked in `wait` on this task.
    pub waiters: Vec<TaskId>,
    /// Outgoing message while send-blocked.
    pub out_msg: Option<Vec<u8>>,
    /// Reply-buffer capacity of the in-flight send.
    pub reply_cap: usize,
    /// Receive-buffer capacity while receive-blocked.
    pub recv_cap: usize,
}

impl TaskSlot {
    fn new(parent: TaskId, priority: u8) -> Self {
        Self {
            parent,
            priority,
            future: None,
            block: None,
            exited: false,
            completion: None,
            destructor: None,
            sender_queue: VecDeque::new(),
            waiters: Vec::new(),
            out_msg: None,
            reply_cap: 0,
            recv_cap: 0,
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

pub(crate) struct Scheduler {
    pub tasks: Vec<TaskSlot>,
    pub ready: [VecDeque<TaskId>; PRIORITY_LEVELS],
    pub event_waiters: FxHashMap<EventId, Vec<TaskId>>,
    pub ns_tid: TaskId,
    pub ts_tid: TaskId,
}

impl Scheduler {
    fn new() -> Self {
        Self {
            tasks: Vec::new(),
            ready: std::array::from_fn(|_| VecDeque::new()),
            event_waiters: FxHashMap::default(),
            ns_tid: TaskId::INVALID,
            ts_tid: TaskId::INVALID,
        }
    }

    pub(crate) fn is_alive(&self, tid: TaskId) -> bool {
        tid.index() < self.tasks.len() && !self.tasks[tid.index()].exited
    }

    pub(crate) fn push_ready(&mut self, tid: TaskId) {
        let prio = self.tasks[tid.index()].priority as usize;
        self.ready[prio].push_back(tid);
    }

    fn pop_ready(&mut self) -> Option<TaskId> {
        self.ready.iter_mut().find_map(|q| q.pop_front())
    }

    /// Deliver a completion to `tid` and make it runnable.
    pub(crate) fn complete(&mut self, tid: TaskId, c: Completion) {
        if !self.is_alive(tid) {
            return;
        }
        let slot = &mut self.tasks[tid.index()];
        slot.completion = Some(c);
        slot.block = None;
        self.push_ready(tid);
    }
}

/// Allocate a slot, build the task's future with its own [`TaskCtx`], and
/// queue it ready.  Shared by [`Kernel::spawn`] and [`TaskCtx::create`].
pub(crate) fn spawn_on<F, Fut>(
    sched:    &Rc<RefCell<Scheduler>>,
    parent:   TaskId,
    priority: u8,
    f:        F,
) -> KernelResult<TaskId>
where
    F: FnOnce(TaskCtx) -> Fut,
    Fut: Future<Output = ()> + 'static,
{
    if priority as usize >= PRIORITY_LEVELS {
        return Err(KernelError::InvalidPriority(priority));
    }
    let tid = {
        let mut s = sched.borrow_mut();
        let tid = TaskId(s.tasks.len() as u32);
        s.tasks.push(TaskSlot::new(parent, priority));
        tid
    };
    // Building the future must happen outside the borrow: the closure may
    // capture arbitrary user state, and the async body does not run yet.
    let ctx = TaskCtx::new(tid, Rc::downgrade(sched));
    let future = Box::pin(f(ctx));
    let mut s = sched.borrow_mut();
    s.tasks[tid.index()].future = Some(future);
    s.push_ready(tid);
    Ok(tid)
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Owner of the scheduler.  Hosts create one, spawn root tasks, raise
/// events, and drive everything with [`Kernel::run`].
pub struct Kernel {
    sched: Rc<RefCell<Scheduler>>,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    pub fn new() -> Self {
        Self {
            sched: Rc::new(RefCell::new(Scheduler::new())),
        }
    }

    /// Spawn a root task (parent = `TaskId::INVALID`).
    pub fn spawn<F, Fut>(&self, priority: u8, f: F) -> KernelResult<TaskId>
    where
        F: FnOnce(TaskCtx) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        spawn_on(&self.sched, TaskId::INVALID, priority, f)
    }

    /// Start the name server and the time server, recording their tids for
    /// [`TaskCtx`] lookups.  Call once, before spawning tasks that use them.
    pub fn create_services(&self) -> KernelResult<(TaskId, TaskId)> {
        let ns = self.spawn(SERVER_PRIORITY, name_server::name_server)?;
        let ts = self.spawn(SERVER_PRIORITY, time_server::time_server)?;
        let mut s = self.sched.borrow_mut();
        s.ns_tid = ns;
        s.ts_tid = ts;
        Ok((ns, ts))
    }

    /// Wake every task blocked on `event`, in registration order, handing
    /// each the payload word.
    pub fn raise_event(&self, event: EventId, payload: u64) {
        let mut s = self.sched.borrow_mut();
        let waiters = s.event_waiters.remove(&event).unwrap_or_default();
        for tid in waiters {
            s.complete(tid, Completion::Event(payload));
        }
    }

    /// Poll ready tasks until none remain.  Returns the number of polls.
    ///
    /// This is the host's scheduling step: raise whatever events are due,
    /// then `run()` drains all resulting work.  Tasks left blocked (servers
    /// waiting to receive, sleepers in the time-server heap) simply stay
    /// blocked until a later event or message readies them.
    pub fn run(&self) -> usize {
        let mut steps = 0usize;
        loop {
            let next = self.sched.borrow_mut().pop_ready();
            let Some(tid) = next else { break };
            let Some(mut future) = self.sched.borrow_mut().tasks[tid.index()].future.take()
            else {
                continue; // exited while queued
            };
            steps += 1;

            let mut cx = Context::from_waker(Waker::noop());
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(()) => self.exit_task(tid),
                Poll::Pending => {
                    self.sched.borrow_mut().tasks[tid.index()].future = Some(future);
                }
            }
        }
        steps
    }

    /// Tear down an exited task: run its destructor, release its waiters,
    /// and abort rendezvous partners left hanging.
    fn exit_task(&self, tid: TaskId) {
        // The destructor is user code; run it outside the scheduler borrow.
        let destructor = self.sched.borrow_mut().tasks[tid.index()].destructor.take();
        if let Some(d) = destructor {
            d();
        }

        let mut s = self.sched.borrow_mut();
        s.tasks[tid.index()].exited = true;
        s.tasks[tid.index()].block = None;

        let waiters = std::mem::take(&mut s.tasks[tid.index()].waiters);
        for w in waiters {
            s.complete(w, Completion::Waited(true));
        }

        // Senders queued on the dead task, and tasks awaiting its reply,
        // would otherwise hang forever.
        let hung: Vec<TaskId> = s
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                matches!(
                    t.block,
                    Some(BlockKind::Send { to } | BlockKind::Reply { to }) if to == tid
                )
            })
            .map(|(i, _)| TaskId(i as u32))
            .collect();
        for h in hung {
            s.tasks[h.index()].out_msg = None;
            s.complete(h, Completion::Aborted);
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn is_alive(&self, tid: TaskId) -> bool {
        self.sched.borrow().is_alive(tid)
    }

    /// The name server's tid (`TaskId::INVALID` before `create_services`).
    pub fn name_server_tid(&self) -> TaskId {
        self.sched.borrow().ns_tid
    }

    /// The time server's tid (`TaskId::INVALID` before `create_services`).
    pub fn time_server_tid(&self) -> TaskId {
        self.sched.borrow().ts_tid
    }
}
