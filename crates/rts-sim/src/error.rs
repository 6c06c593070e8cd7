use rts_kernel::KernelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

pub type SimResult<T> = Result<T, SimError>;
