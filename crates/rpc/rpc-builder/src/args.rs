//! clap [Args](clap::Args) for RPC related arguments.

use crate::{
    config::PoccApiConfig,
    constants::{
        self, DEFAULT_GAS_PRICE_BLOCKS, DEFAULT_GAS_PRICE_IGNORE, DEFAULT_GAS_PRICE_MAX,
        DEFAULT_GAS_PRICE_PERCENTILE,
    },
    error::RpcError,
    launch, PoccRpcModule, RpcModuleSelection, RpcServerConfig, RpcServerHandle,
    TransportRpcModuleConfig,
};
use clap::{
    builder::{PossibleValue, TypedValueParser},
    Arg, Args, Command,
};
use pocc_interfaces::Backend;
use pocc_primitives::U256;
use pocc_rpc::{
    pocc::gas_oracle::GasPriceOracleConfig, DEFAULT_EVM_TIMEOUT, RPC_DEFAULT_GAS_CAP,
};
use std::{
    ffi::OsStr,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

/// Parameters for configuring the rpc more granularity via CLI
#[derive(Debug, Clone, Args, PartialEq, Eq)]
#[command(next_help_heading = "RPC")]
pub struct RpcServerArgs {
    /// Enable the HTTP-RPC server
    #[arg(long)]
    pub http: bool,

    /// Http server address to listen on
    #[arg(long = "http.addr")]
    pub http_addr: Option<IpAddr>,

    /// Http server port to listen on
    #[arg(long = "http.port", default_value_t = constants::DEFAULT_HTTP_RPC_PORT)]
    pub http_port: u16,

    /// Rpc Modules to be configured for the HTTP server
    #[arg(long = "http.api", value_parser = RpcModuleSelectionValueParser::default())]
    pub http_api: Option<RpcModuleSelection>,

    /// Enable the WS-RPC server
    #[arg(long)]
    pub ws: bool,

    /// Ws server address to listen on
    #[arg(long = "ws.addr")]
    pub ws_addr: Option<IpAddr>,

    /// Ws server port to listen on
    #[arg(long = "ws.port", default_value_t = constants::DEFAULT_WS_RPC_PORT)]
    pub ws_port: u16,

    /// Rpc Modules to be configured for the WS server
    #[arg(long = "ws.api", value_parser = RpcModuleSelectionValueParser::default())]
    pub ws_api: Option<RpcModuleSelection>,

    /// Maximum gas limit for `pocc_call` and `pocc_estimateGas`, 0 for no limit.
    #[arg(long = "rpc.gascap", value_name = "GAS_CAP", default_value_t = RPC_DEFAULT_GAS_CAP)]
    pub rpc_gas_cap: u64,

    /// Maximum running time of a `pocc_call` in seconds.
    #[arg(
        long = "rpc.evmtimeout",
        value_name = "SECONDS",
        value_parser = parse_duration_from_secs,
        default_value = "5"
    )]
    pub rpc_evm_timeout: Duration,

    /// Gas price oracle configuration.
    #[command(flatten)]
    pub gas_price_oracle: GasPriceOracleArgs,
}

impl Default for RpcServerArgs {
    fn default() -> Self {
        Self {
            http: false,
            http_addr: None,
            http_port: constants::DEFAULT_HTTP_RPC_PORT,
            http_api: None,
            ws: false,
            ws_addr: None,
            ws_port: constants::DEFAULT_WS_RPC_PORT,
            ws_api: None,
            rpc_gas_cap: RPC_DEFAULT_GAS_CAP,
            rpc_evm_timeout: DEFAULT_EVM_TIMEOUT,
            gas_price_oracle: GasPriceOracleArgs::default(),
        }
    }
}

impl RpcServerArgs {
    /// Extracts the [`PoccApiConfig`] from the args.
    pub fn api_config(&self) -> PoccApiConfig {
        PoccApiConfig::default()
            .rpc_gas_cap(self.rpc_gas_cap)
            .rpc_evm_timeout(self.rpc_evm_timeout)
            .gas_oracle(self.gas_price_oracle.gas_price_oracle_config())
    }

    /// Creates the [`TransportRpcModuleConfig`] from cli args.
    ///
    /// A transport that is enabled without a module list serves the standard modules.
    pub fn transport_rpc_module_config(&self) -> TransportRpcModuleConfig {
        let mut config = TransportRpcModuleConfig::default();

        if self.http {
            config = config.with_http(self.http_api.clone().unwrap_or_default());
        }

        if self.ws {
            config = config.with_ws(self.ws_api.clone().unwrap_or_default());
        }

        config
    }

    /// Creates the [`RpcServerConfig`] from cli args.
    pub fn rpc_server_config(&self) -> RpcServerConfig {
        let mut config = RpcServerConfig::default();

        if self.http {
            let socket_address = SocketAddr::new(
                self.http_addr.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
                self.http_port,
            );
            config = config.with_http_address(socket_address);
        }

        if self.ws {
            let socket_address = SocketAddr::new(
                self.ws_addr.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
                self.ws_port,
            );
            config = config.with_ws_address(socket_address);
        }

        config
    }

    /// Convenience function for starting the rpc servers with the configs extracted from cli
    /// args.
    pub async fn start_rpc_server<B: Backend>(
        &self,
        backend: Arc<B>,
    ) -> Result<RpcServerHandle, RpcError> {
        launch(
            backend,
            &self.api_config(),
            self.transport_rpc_module_config(),
            self.rpc_server_config(),
        )
        .await
    }
}

/// Parameters to configure Gas Price Oracle
#[derive(Debug, Clone, Args, PartialEq, Eq)]
#[command(next_help_heading = "Gas Price Oracle")]
pub struct GasPriceOracleArgs {
    /// Number of recent blocks to check for gas price
    #[arg(long = "gpo.blocks", default_value_t = DEFAULT_GAS_PRICE_BLOCKS)]
    pub blocks: u32,

    /// Gas Price below which gpo will ignore transactions
    #[arg(long = "gpo.ignoreprice", default_value_t = DEFAULT_GAS_PRICE_IGNORE)]
    pub ignore_price: u64,

    /// Maximum gas price to be recommended by gpo
    #[arg(long = "gpo.maxprice", default_value_t = DEFAULT_GAS_PRICE_MAX)]
    pub max_price: u64,

    /// The percentile of gas prices to use for the estimate
    #[arg(long = "gpo.percentile", default_value_t = DEFAULT_GAS_PRICE_PERCENTILE)]
    pub percentile: u32,
}

impl GasPriceOracleArgs {
    /// Extracts the gas price oracle config from the args.
    pub fn gas_price_oracle_config(&self) -> GasPriceOracleConfig {
        GasPriceOracleConfig {
            blocks: self.blocks,
            percentile: self.percentile,
            max_price: Some(U256::from(self.max_price)),
            ignore_price: Some(U256::from(self.ignore_price)),
            ..Default::default()
        }
    }
}

impl Default for GasPriceOracleArgs {
    fn default() -> Self {
        Self {
            blocks: DEFAULT_GAS_PRICE_BLOCKS,
            ignore_price: DEFAULT_GAS_PRICE_IGNORE,
            max_price: DEFAULT_GAS_PRICE_MAX,
            percentile: DEFAULT_GAS_PRICE_PERCENTILE,
        }
    }
}

/// Helper to parse a [Duration] from seconds
fn parse_duration_from_secs(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}

/// clap value parser for [`RpcModuleSelection`].
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
struct RpcModuleSelectionValueParser;

impl TypedValueParser for RpcModuleSelectionValueParser {
    type Value = RpcModuleSelection;

    fn parse_ref(
        &self,
        _cmd: &Command,
        arg: Option<&Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let val =
            value.to_str().ok_or_else(|| clap::Error::new(clap::error::ErrorKind::InvalidUtf8))?;
        val.parse::<RpcModuleSelection>().map_err(|err| {
            let arg = arg.map(|a| a.to_string()).unwrap_or_else(|| "...".to_owned());
            let possible_values = PoccRpcModule::all_variant_names().join(",");
            let msg = format!(
                "Invalid value '{val}' for {arg}: {err}.\n    [possible values: {possible_values}]"
            );
            clap::Error::raw(clap::error::ErrorKind::InvalidValue, msg)
        })
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        let values =
            PoccRpcModule::all_variant_names().iter().map(|name| PossibleValue::new(*name));
        Some(Box::new(values))
    }
}
