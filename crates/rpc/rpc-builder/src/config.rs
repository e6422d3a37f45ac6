//! Settings of the `pocc` API objects.

use pocc_rpc::{
    pocc::gas_oracle::GasPriceOracleConfig, DEFAULT_EVM_TIMEOUT, RPC_DEFAULT_GAS_CAP,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of the `pocc` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoccApiConfig {
    /// Maximum gas limit of `pocc_call` and `pocc_estimateGas`, zero for no limit
    pub rpc_gas_cap: u64,
    /// Maximum running time of a single `pocc_call`
    #[serde(with = "humantime_serde")]
    pub rpc_evm_timeout: Duration,
    /// Settings for the gas price oracle a backend suggests prices with
    pub gas_oracle: GasPriceOracleConfig,
}

impl PoccApiConfig {
    /// Configures the gas cap of calls.
    pub const fn rpc_gas_cap(mut self, rpc_gas_cap: u64) -> Self {
        self.rpc_gas_cap = rpc_gas_cap;
        self
    }

    /// Configures the running time limit of calls.
    pub const fn rpc_evm_timeout(mut self, rpc_evm_timeout: Duration) -> Self {
        self.rpc_evm_timeout = rpc_evm_timeout;
        self
    }

    /// Configures the gas price oracle.
    pub fn gas_oracle(mut self, gas_oracle: GasPriceOracleConfig) -> Self {
        self.gas_oracle = gas_oracle;
        self
    }
}

impl Default for PoccApiConfig {
    fn default() -> Self {
        Self {
            rpc_gas_cap: RPC_DEFAULT_GAS_CAP,
            rpc_evm_timeout: DEFAULT_EVM_TIMEOUT,
            gas_oracle: GasPriceOracleConfig::default(),
        }
    }
}
