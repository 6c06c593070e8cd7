//! `TaskCtx` — the per-task handle every kernel op goes through.
//!
//! Each op has the same shape: a synchronous registration step that records
//! the blocked state (or completes immediately when the rendezvous partner
//! is already waiting), then a `poll_fn` suspension that resolves when the
//! scheduler delivers this task's [`Completion`].  The handle holds only a
//! `Weak` reference to the scheduler, so a task outliving its kernel gets
//! [`KernelError::Shutdown`] instead of keeping the whole scheduler alive.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::task::Poll;

use rts_core::{EventId, TaskId};

use crate::error::{KernelError, KernelResult};
use crate::sched::{self, BlockKind, Completion, Scheduler};

/// Handle passed to every task body.  Cheap to clone; clones address the
/// same task.
#[derive(Clone)]
pub struct TaskCtx {
    tid: TaskId,
    sched: Weak<RefCell<Scheduler>>,
}

impl TaskCtx {
    pub(crate) fn new(tid: TaskId, sched: Weak<RefCell<Scheduler>>) -> Self {
        Self { tid, sched }
    }

    fn sched(&self) -> KernelResult<Rc<RefCell<Scheduler>>> {
        self.sched.upgrade().ok_or(KernelError::Shutdown)
    }

    /// Suspend until the kernel delivers this task's completion.
    fn suspend(&self) -> impl Future<Output = KernelResult<Completion>> + use<> {
        let weak = self.sched.clone();
        let tid = self.tid;
        std::future::poll_fn(move |_cx| {
            let Some(sched) = weak.upgrade() else {
                return Poll::Ready(Err(KernelError::Shutdown));
            };
            let mut s = sched.borrow_mut();
            match s.tasks[tid.index()].completion.take() {
                Some(c) => Poll::Ready(Ok(c)),
                None => Poll::Pending,
            }
        })
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn my_tid(&self) -> TaskId {
        self.tid
    }

    /// The creator's tid, or `TaskId::INVALID` for root tasks.
    pub fn parent_tid(&self) -> KernelResult<TaskId> {
        Ok(self.sched()?.borrow().tasks[self.tid.index()].parent)
    }

    /// The registered name server (errors before `create_services`).
    pub fn name_server(&self) -> KernelResult<TaskId> {
        let ns = self.sched()?.borrow().ns_tid;
        if ns == TaskId::INVALID {
            return Err(KernelError::NoNameServer);
        }
        Ok(ns)
    }

    /// The registered time server (errors before `create_services`).
    pub fn time_server(&self) -> KernelResult<TaskId> {
        let ts = self.sched()?.borrow().ts_tid;
        if ts == TaskId::INVALID {
            return Err(KernelError::NoTimeServer);
        }
        Ok(ts)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Spawn a child task at `priority`.
    pub fn create<F, Fut>(&self, priority: u8, f: F) -> KernelResult<TaskId>
    where
        F: FnOnce(TaskCtx) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        sched::spawn_on(&self.sched()?, self.tid, priority, f)
    }

    /// Register the cleanup callback run when this task exits.  A second
    /// registration replaces the first.
    pub fn set_destructor<F: FnOnce() + 'static>(&self, f: F) -> KernelResult<()> {
        self.sched()?.borrow_mut().tasks[self.tid.index()].destructor = Some(Box::new(f));
        Ok(())
    }

    /// Block until `tid` exits.  Returns `false` for a tid that never
    /// existed, `true` once the task is (or already was) gone.
    pub async fn wait(&self, tid: TaskId) -> KernelResult<bool> {
        {
            let sched = self.sched()?;
            let mut s = sched.borrow_mut();
            if tid.index() >= s.tasks.len() {
                return Ok(false);
            }
            if s.tasks[tid.index()].exited {
                return Ok(true);
            }
            s.tasks[self.tid.index()].block = Some(BlockKind::Wait(tid));
            s.tasks[tid.index()].waiters.push(self.tid);
        }
        match self.suspend().await? {
            Completion::Waited(ok) => Ok(ok),
            _ => Err(KernelError::Protocol(tid)),
        }
    }

    // ── Cooperation ───────────────────────────────────────────────────────

    /// Hand the CPU to the next ready task of the same priority.
    pub async fn yield_now(&self) -> KernelResult<()> {
        let weak = self.sched.clone();
        let tid = self.tid;
        let mut yielded = false;
        std::future::poll_fn(move |_cx| {
            if yielded {
                return Poll::Ready(Ok(()));
            }
            let Some(sched) = weak.upgrade() else {
                return Poll::Ready(Err(KernelError::Shutdown));
            };
            yielded = true;
            // Back of the own priority queue; the task stays ready.
            sched.borrow_mut().push_ready(tid);
            Poll::Pending
        })
        .await
    }

    /// Block until `event` is raised; resolves to the event payload.
    pub async fn await_event(&self, event: EventId) -> KernelResult<u64> {
        {
            let sched = self.sched()?;
            let mut s = sched.borrow_mut();
            s.tasks[self.tid.index()].block = Some(BlockKind::Event(event));
            s.event_waiters.entry(event).or_default().push(self.tid);
        }
        match self.suspend().await? {
            Completion::Event(payload) => Ok(payload),
            _ => Err(KernelError::Protocol(self.tid)),
        }
    }

    // ── Rendezvous ────────────────────────────────────────────────────────

    /// Send `msg` to `to` and block until it has been received **and**
    /// replied to.  The reply is truncated to `reply_cap` bytes; the
    /// message is truncated to the receiver's buffer capacity.
    pub async fn send(&self, to: TaskId, msg: &[u8], reply_cap: usize) -> KernelResult<Vec<u8>> {
        if to == self.tid {
            return Err(KernelError::SendToSelf);
        }
        {
            let sched = self.sched()?;
            let mut s = sched.borrow_mut();
            if !s.is_alive(to) {
                return Err(KernelError::PeerExited(to));
            }
            let me = self.tid;
            s.tasks[me.index()].reply_cap = reply_cap;

            if s.tasks[to.index()].block == Some(BlockKind::Receive) {
                // Receiver is already waiting: hand the message over now
                // and move straight to the reply-blocked state.
                let cap = s.tasks[to.index()].recv_cap;
                let mut delivered = msg.to_vec();
                delivered.truncate(cap);
                s.tasks[me.index()].block = Some(BlockKind::Reply { to });
                s.complete(to, Completion::Received { from: me, msg: delivered });
            } else {
                s.tasks[me.index()].out_msg = Some(msg.to_vec());
                s.tasks[me.index()].block = Some(BlockKind::Send { to });
                s.tasks[to.index()].sender_queue.push_back(me);
            }
        }
        match self.suspend().await? {
            Completion::Replied(bytes) => Ok(bytes),
            Completion::Aborted => Err(KernelError::PeerExited(to)),
            _ => Err(KernelError::Protocol(to)),
        }
    }

    /// Block until some task sends here; resolves to the sender's tid and
    /// its message, truncated to `cap` bytes.
    pub async fn receive(&self, cap: usize) -> KernelResult<(TaskId, Vec<u8>)> {
        {
            let sched = self.sched()?;
            let mut s = sched.borrow_mut();
            let me = self.tid;

            // Drop senders that exited while queued.
            while let Some(&from) = s.tasks[me.index()].sender_queue.front() {
                if s.is_alive(from) {
                    break;
                }
                s.tasks[me.index()].sender_queue.pop_front();
            }

            if let Some(from) = s.tasks[me.index()].sender_queue.pop_front() {
                let mut msg = s.tasks[from.index()].out_msg.take().unwrap_or_default();
                msg.truncate(cap);
                s.tasks[from.index()].block = Some(BlockKind::Reply { to: me });
                return Ok((from, msg));
            }
            s.tasks[me.index()].recv_cap = cap;
            s.tasks[me.index()].block = Some(BlockKind::Receive);
        }
        match self.suspend().await? {
            Completion::Received { from, msg } => Ok((from, msg)),
            _ => Err(KernelError::Protocol(self.tid)),
        }
    }

    /// Unblock `to`, which must be reply-blocked on this task.  The reply is
    /// truncated to the capacity `to` declared in its `send`.  Non-blocking.
    pub fn reply(&self, to: TaskId, reply: &[u8]) -> KernelResult<()> {
        let sched = self.sched()?;
        let mut s = sched.borrow_mut();
        if !s.is_alive(to) {
            return Err(KernelError::PeerExited(to));
        }
        match s.tasks[to.index()].block {
            Some(BlockKind::Reply { to: waited_on }) if waited_on == self.tid => {
                let cap = s.tasks[to.index()].reply_cap;
                let mut bytes = reply.to_vec();
                bytes.truncate(cap);
                s.complete(to, Completion::Replied(bytes));
                Ok(())
            }
            _ => Err(KernelError::NotReplyBlocked(to)),
        }
    }
}
