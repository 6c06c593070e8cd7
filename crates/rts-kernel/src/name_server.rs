//! The name server — string name → tid registry.
//!
//! # Wire protocol
//!
//! Request: one tag byte followed by the UTF-8 name.
//! Reply: a little-endian `u32` — `0` for a register acknowledgement, the
//! mapped tid for a lookup, or `TaskId::INVALID.0` when the name is
//! unknown.  `create` never allocates that sentinel, so it is unambiguous.

use std::collections::HashMap;

use rts_core::TaskId;

use crate::error::{KernelError, KernelResult};
use crate::task::TaskCtx;

const TAG_REGISTER: u8 = 0;
const TAG_WHOIS: u8 = 1;

/// Longest name (plus tag) the server accepts; longer requests are
/// truncated by the rendezvous itself.
const NAME_MSG_CAP: usize = 256;

// ── Server task ───────────────────────────────────────────────────────────────

/// The name server body.  Runs forever; registering an existing name
/// overwrites the previous mapping.
pub(crate) async fn name_server(ctx: TaskCtx) {
    let mut names: HashMap<String, TaskId> = HashMap::new();
    loop {
        let (from, msg) = match ctx.receive(NAME_MSG_CAP).await {
            Ok(m) => m,
            Err(_) => return, // kernel shut down
        };

        let reply = match parse(&msg) {
            Some((TAG_REGISTER, name)) => {
                names.insert(name.to_owned(), from);
                0u32
            }
            Some((TAG_WHOIS, name)) => names.get(name).copied().unwrap_or(TaskId::INVALID).0,
            _ => {
                log::warn!("name server: malformed request from {from}");
                TaskId::INVALID.0
            }
        };
        if let Err(e) = ctx.reply(from, &reply.to_le_bytes()) {
            log::warn!("name server: reply to {from} failed: {e}");
        }
    }
}

fn parse(msg: &[u8]) -> Option<(u8, &str)> {
    let (&tag, name) = msg.split_first()?;
    Some((tag, std::str::from_utf8(name).ok()?))
}

// ── Client helpers ────────────────────────────────────────────────────────────

fn request(tag: u8, name: &str) -> Vec<u8> {
    let mut msg = Vec::with_capacity(1 + name.len());
    msg.push(tag);
    msg.extend_from_slice(name.as_bytes());
    msg
}

/// Register the calling task as `name`, overwriting any previous owner.
pub async fn register(ctx: &TaskCtx, name: &str) -> KernelResult<()> {
    let ns = ctx.name_server()?;
    ctx.send(ns, &request(TAG_REGISTER, name), 4).await?;
    Ok(())
}

/// Look up the task registered as `name`.
pub async fn who_is(ctx: &TaskCtx, name: &str) -> KernelResult<Option<TaskId>> {
    let ns = ctx.name_server()?;
    let reply = ctx.send(ns, &request(TAG_WHOIS, name), 4).await?;
    let raw = u32::from_le_bytes(reply.try_into().map_err(|_| KernelError::Protocol(ns))?);
    Ok((raw != TaskId::INVALID.0).then_some(TaskId(raw)))
}
