use crate::U256;

/// Represents error variants that can happen when trying to validate a
/// [Transaction](crate::Transaction)
#[allow(missing_docs)]
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum InvalidTransactionError {
    /// The sender does not have enough funds to cover the transaction fees
    #[error("sender does not have enough funds ({available_funds}) to cover transaction cost: {cost}")]
    InsufficientFunds { cost: U256, available_funds: U256 },
    /// The nonce is lower than the account's nonce, or there is a nonce gap present.
    #[error("transaction nonce is not consistent")]
    NonceNotConsistent,
    /// The chain ID in the transaction does not match the current network configuration.
    #[error("transaction's chain ID does not match")]
    ChainIdMismatch,
    /// The calculated cost of the transaction overflows.
    #[error("gas overflow")]
    GasUintOverflow,
    /// The transaction is specified to use less gas than required to start the
    /// invocation.
    #[error("intrinsic gas too low")]
    GasTooLow,
    /// The transaction gas exceeds the limit
    #[error("exceeds block gas limit")]
    GasTooHigh,
    /// The signature could not be verified.
    #[error("invalid sender")]
    InvalidSender,
}
