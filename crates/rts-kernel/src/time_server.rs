//! The time server — tick counting and deferred wake-ups.
//!
//! Two collaborating tasks:
//!
//! - The **tick notifier** loops `await_event(TICK_60HZ)` → `send(server,
//!   NOTIFY)`.  It exists because the server itself must stay
//!   receive-blocked: a server that awaited the event directly could miss
//!   delay requests arriving between ticks.
//! - The **time server** owns a min-heap of waiters keyed by
//!   `(wake_tick, insertion seq)`.  NOTIFY is replied to immediately and
//!   advances `now`; DELAY goes unanswered onto the heap — the eventual
//!   reply *is* the wake-up.  After every message the heap is drained of
//!   due waiters, so wake-ups are monotone in target tick with ties
//!   released in insertion order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rts_core::{KERNEL_TICK_HZ, TaskId};

use crate::error::KernelResult;
use crate::event::TICK_60HZ;
use crate::sched::SERVER_PRIORITY;
use crate::task::TaskCtx;

const TAG_NOTIFY: u8 = 0;
const TAG_DELAY: u8 = 1;

const TIME_MSG_CAP: usize = 8;

// ── Waiter heap ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq)]
struct Waiter {
    wake_tick: u64,
    /// Insertion sequence: breaks wake-tick ties deterministically.
    seq: u64,
    tid: TaskId,
}

impl Ord for Waiter {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.wake_tick, self.seq).cmp(&(other.wake_tick, other.seq))
    }
}

impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── Server tasks ──────────────────────────────────────────────────────────────

/// The tick notifier: one event await, one NOTIFY send, forever.
async fn tick_notifier(ctx: TaskCtx, server: TaskId) {
    loop {
        if ctx.await_event(TICK_60HZ).await.is_err() {
            return;
        }
        if ctx.send(server, &[TAG_NOTIFY], 0).await.is_err() {
            return;
        }
    }
}

/// The time server body.  `now` is read once per received message; every
/// arm ends by draining due waiters.
pub(crate) async fn time_server(ctx: TaskCtx) {
    let me = ctx.my_tid();
    if let Err(e) = ctx.create(SERVER_PRIORITY, move |c| tick_notifier(c, me)) {
        log::warn!("time server: cannot start tick notifier: {e}");
        return;
    }

    let mut heap: BinaryHeap<Reverse<Waiter>> = BinaryHeap::new();
    let mut now: u64 = 0;
    let mut seq: u64 = 0;

    loop {
        let (from, msg) = match ctx.receive(TIME_MSG_CAP).await {
            Ok(m) => m,
            Err(_) => return, // kernel shut down
        };

        match msg.first() {
            Some(&TAG_NOTIFY) => {
                if let Err(e) = ctx.reply(from, &[]) {
                    log::warn!("time server: notify reply failed: {e}");
                }
                now += 1;
            }
            Some(&TAG_DELAY) if msg.len() >= 5 => {
                let ticks = u32::from_le_bytes([msg[1], msg[2], msg[3], msg[4]]);
                heap.push(Reverse(Waiter {
                    wake_tick: now + ticks as u64,
                    seq,
                    tid: from,
                }));
                seq += 1;
                // Deliberately no reply: it happens when the delay expires.
            }
            _ => {
                log::warn!("time server: malformed request from {from}");
                let _ = ctx.reply(from, &[]);
            }
        }

        // Release everything that is due as of this message's `now`.
        while let Some(&Reverse(w)) = heap.peek() {
            if w.wake_tick > now {
                break;
            }
            heap.pop();
            if let Err(e) = ctx.reply(w.tid, &now.to_le_bytes()) {
                log::warn!("time server: wake-up reply to {} failed: {e}", w.tid);
            }
        }
    }
}

// ── Client helpers ────────────────────────────────────────────────────────────

/// Block the calling task for `ticks` kernel ticks.  Resolves to the
/// server's tick count at wake-up.
pub async fn delay(ctx: &TaskCtx, ticks: u32) -> KernelResult<u64> {
    let ts = ctx.time_server()?;
    let mut msg = [0u8; 5];
    msg[0] = TAG_DELAY;
    msg[1..5].copy_from_slice(&ticks.to_le_bytes());
    let reply = ctx.send(ts, &msg, 8).await?;
    let mut raw = [0u8; 8];
    let n = reply.len().min(8);
    raw[..n].copy_from_slice(&reply[..n]);
    Ok(u64::from_le_bytes(raw))
}

/// Block the calling task for at least `ms` milliseconds of kernel ticks.
///
/// The conversion rounds up (minimum one tick), so a sleeper never resumes
/// before its requested duration has elapsed.
pub async fn sleep(ctx: &TaskCtx, ms: u32) -> KernelResult<u64> {
    let ticks = (ms as u64 * KERNEL_TICK_HZ as u64).div_ceil(1000).max(1) as u32;
    delay(ctx, ticks).await
}
