/// The default port for the http server
pub const DEFAULT_HTTP_RPC_PORT: u16 = 8545;

/// The default port for the ws server
pub const DEFAULT_WS_RPC_PORT: u16 = 8546;

/// The version every namespace is announced with
pub const API_VERSION: &str = "1.0";

/// Number of recent blocks to check for gas price
pub const DEFAULT_GAS_PRICE_BLOCKS: u32 = 20;

/// Gas Price below which the gas price oracle will ignore transactions
pub const DEFAULT_GAS_PRICE_IGNORE: u64 = 2;

/// Maximum gas price to be recommended by the gas price oracle
pub const DEFAULT_GAS_PRICE_MAX: u64 = 500_000_000_000;

/// The percentile of gas prices to use for the estimate
pub const DEFAULT_GAS_PRICE_PERCENTILE: u32 = 60;
