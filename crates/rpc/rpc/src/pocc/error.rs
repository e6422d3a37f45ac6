//! Implementation specific Errors for the `pocc_` namespace.

use crate::result::{internal_rpc_err, invalid_params_rpc_err, rpc_err};
use jsonrpsee_types::ErrorObject;
use pocc_interfaces::{EvmError, HaltReason, PoolError, ProviderError, SignError};
use pocc_primitives::{abi::decode_revert_reason, Bytes};
use pocc_rpc_types::{BlockError, ConflictingInputs};
use std::time::Duration;

/// Result alias
pub type PoccResult<T> = Result<T, PoccApiError>;

/// Error codes of the `pocc_` namespace.
#[derive(Debug, Copy, PartialEq, Eq, Clone)]
pub enum PoccRpcErrorCode {
    /// Failed to send transaction, e.g. the pool refused it.
    TransactionRejected,
    /// Custom geth error code, used for reverts.
    ExecutionError,
    /// Execution failed, or a signer refused.
    ServerError,
    /// The requested block, header or hash is unknown.
    ResourceNotFound,
}

impl PoccRpcErrorCode {
    /// Returns the error code as `i32`
    pub const fn code(&self) -> i32 {
        match *self {
            Self::TransactionRejected => -32003,
            Self::ExecutionError => 3,
            Self::ServerError => -32000,
            Self::ResourceNotFound => -32001,
        }
    }
}

/// Errors that can occur when interacting with the `pocc_` namespace
#[derive(Debug, thiserror::Error)]
pub enum PoccApiError {
    /// Chain or state data could not be read.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The pool refused the transaction.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The account manager refused to sign.
    #[error(transparent)]
    Sign(#[from] SignError),
    /// The interpreter failed to run the message.
    #[error(transparent)]
    Evm(#[from] EvmError),
    /// The message ran and reverted.
    #[error(transparent)]
    Revert(#[from] RevertError),
    /// The message ran and halted.
    #[error("execution failed: {0}")]
    ExecutionFailed(HaltReason),
    /// The message did not complete within the configured time.
    #[error("execution aborted (timeout = {0:?})")]
    ExecutionTimedOut(Duration),
    /// The message fails even with the highest allowed gas limit.
    #[error("gas required exceeds allowance ({0})")]
    GasRequiredExceedsAllowance(u64),
    /// Both `data` and `input` are set and differ.
    #[error(transparent)]
    ConflictingInputs(#[from] ConflictingInputs),
    /// A creation without init code.
    #[error("contract creation without any data provided")]
    ContractCreationWithoutData,
    /// Raw bytes that are not a signed transaction.
    #[error("failed to decode signed transaction")]
    FailedToDecodeSignedTransaction,
    /// A signature that does not recover to a sender.
    #[error("invalid transaction signature")]
    InvalidTransactionSignature,
    /// Any other malformed parameter.
    #[error("{0}")]
    InvalidParams(String),
    /// A block or transaction referenced by hash is unknown.
    #[error("unknown block or tx")]
    UnknownBlockOrTx,
    /// A spawned execution task panicked or was aborted.
    #[error("internal blocking task error")]
    InternalBlockingTaskError,
    /// Anything that should never happen.
    #[error("{0}")]
    Internal(String),
}

impl PoccApiError {
    /// Returns `true` if the error reports unknown data, as opposed to a failure.
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Provider(err) | Self::Evm(EvmError::Provider(err)) => err.is_not_found(),
            Self::UnknownBlockOrTx => true,
            _ => false,
        }
    }
}

impl From<BlockError> for PoccApiError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::InvalidSignature => Self::InvalidTransactionSignature,
        }
    }
}

impl From<PoccApiError> for ErrorObject<'static> {
    fn from(error: PoccApiError) -> Self {
        if error.is_not_found() {
            return rpc_err(PoccRpcErrorCode::ResourceNotFound.code(), error.to_string(), None)
        }
        match error {
            PoccApiError::Revert(err) => err.into(),
            PoccApiError::Pool(err) => {
                rpc_err(PoccRpcErrorCode::TransactionRejected.code(), err.to_string(), None)
            }
            PoccApiError::Sign(_) |
            PoccApiError::Evm(_) |
            PoccApiError::ExecutionFailed(_) |
            PoccApiError::ExecutionTimedOut(_) |
            PoccApiError::GasRequiredExceedsAllowance(_) => {
                rpc_err(PoccRpcErrorCode::ServerError.code(), error.to_string(), None)
            }
            PoccApiError::ConflictingInputs(_) |
            PoccApiError::ContractCreationWithoutData |
            PoccApiError::FailedToDecodeSignedTransaction |
            PoccApiError::InvalidTransactionSignature |
            PoccApiError::InvalidParams(_) => invalid_params_rpc_err(error.to_string()),
            PoccApiError::Provider(_) |
            PoccApiError::UnknownBlockOrTx |
            PoccApiError::InternalBlockingTaskError |
            PoccApiError::Internal(_) => internal_rpc_err(error.to_string()),
        }
    }
}

/// Represents a reverted execution.
///
/// The payload is kept as is; the message carries the decoded `Error(string)` reason if there is
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertError {
    /// The raw revert payload.
    output: Option<Bytes>,
}

impl RevertError {
    /// Wraps the revert payload. An empty payload carries no reason.
    pub fn new(output: Bytes) -> Self {
        if output.is_empty() {
            Self { output: None }
        } else {
            Self { output: Some(output) }
        }
    }

    /// The raw revert payload.
    pub fn output(&self) -> Option<&Bytes> {
        self.output.as_ref()
    }

    /// The decoded revert reason, if the payload is an `Error(string)`.
    pub fn reason(&self) -> Option<String> {
        self.output.as_ref().and_then(decode_revert_reason)
    }
}

impl std::fmt::Display for RevertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("execution reverted")?;
        if let Some(reason) = self.reason() {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RevertError {}

impl From<RevertError> for ErrorObject<'static> {
    fn from(err: RevertError) -> Self {
        rpc_err(
            PoccRpcErrorCode::ExecutionError.code(),
            err.to_string(),
            err.output.as_ref().map(|out| out.as_ref()),
        )
    }
}
