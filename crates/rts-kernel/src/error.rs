use rts_core::TaskId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    #[error("priority {0} out of range")]
    InvalidPriority(u8),

    #[error("a task cannot send to itself")]
    SendToSelf,

    #[error("peer task {0} has exited")]
    PeerExited(TaskId),

    /// Replying to a task that is not send-blocked on the replier.  This is
    /// a protocol violation by the caller; servers log it and carry on.
    #[error("task {0} is not awaiting a reply from this task")]
    NotReplyBlocked(TaskId),

    #[error("malformed reply from task {0}")]
    Protocol(TaskId),

    #[error("name server is not running")]
    NoNameServer,

    #[error("time server is not running")]
    NoTimeServer,

    /// The kernel behind this handle has been dropped.
    #[error("kernel has shut down")]
    Shutdown,
}

pub type KernelResult<T> = Result<T, KernelError>;
