//! The bridge to the bytecode interpreter.
//!
//! The interpreter is external. The backend builds an [`Evm`] bound to one state snapshot and
//! hands it out inside an [`EvmGuard`], which owns the release hook of the resources the instance
//! holds. The hook runs exactly once: explicitly through [`EvmGuard::release`] or when the guard is
//! dropped, which also covers callers that bail out early or whose task is cancelled.

use crate::provider::ProviderError;
use pocc_primitives::{Address, Bytes, Log, U256};
use std::fmt;
use tracing::warn;

/// A read-only message executed by the [`Evm`].
///
/// All defaults have been applied; nothing here is optional except the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Caller
    pub from: Address,
    /// Callee, `None` executes `data` as init code
    pub to: Option<Address>,
    /// Gas available to the execution
    pub gas_limit: u64,
    /// Gas price
    pub gas_price: U256,
    /// Value transferred
    pub value: U256,
    /// Input data
    pub data: Bytes,
}

/// Why an execution halted without completing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HaltReason {
    /// Ran out of gas.
    #[error("out of gas")]
    OutOfGas,
    /// Hit an undefined opcode.
    #[error("invalid opcode")]
    InvalidOpcode,
    /// Jumped to an invalid destination.
    #[error("invalid jump destination")]
    InvalidJump,
    /// Stack under- or overflow.
    #[error("stack limit reached")]
    StackLimit,
    /// Any other interpreter fault.
    #[error("{0}")]
    Other(String),
}

/// The outcome of an execution that ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Completed successfully.
    Success {
        /// Gas consumed
        gas_used: u64,
        /// Returned data
        output: Bytes,
        /// Emitted logs
        logs: Vec<Log>,
    },
    /// Reverted by a `REVERT` opcode.
    Revert {
        /// Gas consumed
        gas_used: u64,
        /// Revert payload
        output: Bytes,
    },
    /// Stopped by an exceptional halt.
    Halt {
        /// Why it halted
        reason: HaltReason,
        /// Gas consumed, all of the limit
        gas_used: u64,
    },
}

impl ExecutionResult {
    /// Returns `true` if the execution completed successfully.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Gas consumed by the execution.
    pub const fn gas_used(&self) -> u64 {
        match *self {
            Self::Success { gas_used, .. } |
            Self::Revert { gas_used, .. } |
            Self::Halt { gas_used, .. } => gas_used,
        }
    }
}

/// Errors that prevent an execution from running or completing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvmError {
    /// State access failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The caller can not pay for `gas * price + value`.
    #[error("insufficient funds for gas * price + value")]
    InsufficientFunds,
    /// The execution was interrupted through its cancellation token.
    #[error("execution aborted")]
    Cancelled,
    /// Any other failure of the interpreter.
    #[error("{0}")]
    Custom(String),
}

/// An interpreter instance bound to one state snapshot and one message.
///
/// Implementations observe the cancellation token they were built with and return
/// [`EvmError::Cancelled`] once it fires. All state changes are discarded.
pub trait Evm: Send {
    /// Runs the message.
    fn transact(&mut self) -> Result<ExecutionResult, EvmError>;
}

impl<T: Evm + ?Sized> Evm for Box<T> {
    fn transact(&mut self) -> Result<ExecutionResult, EvmError> {
        (**self).transact()
    }
}

/// Hook releasing the resources held by an [`Evm`].
///
/// It reports state access failures that were swallowed during execution, the way a light client
/// records failed proof fetches.
pub type ReleaseFn = Box<dyn FnOnce() -> Result<(), EvmError> + Send>;

/// Scoped ownership of an [`Evm`] and its release hook.
pub struct EvmGuard {
    evm: Box<dyn Evm>,
    release: Option<ReleaseFn>,
}

impl EvmGuard {
    /// Wraps an instance and the hook that must run once it is no longer used.
    pub fn new<F>(evm: Box<dyn Evm>, release: F) -> Self
    where
        F: FnOnce() -> Result<(), EvmError> + Send + 'static,
    {
        Self { evm, release: Some(Box::new(release)) }
    }

    /// Runs the message on the wrapped instance.
    pub fn transact(&mut self) -> Result<ExecutionResult, EvmError> {
        self.evm.transact()
    }

    /// Releases the instance and returns the outcome of the hook.
    pub fn release(mut self) -> Result<(), EvmError> {
        self.release.take().map_or(Ok(()), |release| release())
    }
}

impl Drop for EvmGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            if let Err(err) = release() {
                warn!(target: "pocc::evm", %err, "evm released with error");
            }
        }
    }
}

impl fmt::Debug for EvmGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmGuard").field("released", &self.release.is_none()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct Noop;

    impl Evm for Noop {
        fn transact(&mut self) -> Result<ExecutionResult, EvmError> {
            Ok(ExecutionResult::Success { gas_used: 21_000, output: Bytes::new(), logs: vec![] })
        }
    }

    fn guard(counter: &Arc<AtomicUsize>, outcome: Result<(), EvmError>) -> EvmGuard {
        let counter = Arc::clone(counter);
        EvmGuard::new(Box::new(Noop), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            outcome
        })
    }

    #[test]
    fn explicit_release_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut evm = guard(&counter, Ok(()));
        assert!(evm.transact().unwrap().is_success());
        evm.release().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let evm = guard(&counter, Err(EvmError::Cancelled));
        drop(evm);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_reports_hook_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let evm = guard(&counter, Err(ProviderError::StateUnavailable(3).into()));
        assert_matches!(evm.release(), Err(EvmError::Provider(ProviderError::StateUnavailable(3))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
