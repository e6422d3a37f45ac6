#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Configure and launch the Pocc RPC servers.
//!
//! [`apis`] creates every service of a node on top of one [`Backend`](pocc_interfaces::Backend),
//! [`TransportRpcModules`] picks the services each transport serves and starts the servers.
//!
//! # Example
//!
//! ```no_run
//! use pocc_interfaces::Backend;
//! use pocc_rpc_builder::{
//!     launch, PoccApiConfig, PoccRpcModule, RpcServerConfig, TransportRpcModuleConfig,
//! };
//! use std::sync::Arc;
//!
//! pub async fn launch_http<B: Backend>(backend: Arc<B>) {
//!     let modules = TransportRpcModuleConfig::set_http([PoccRpcModule::Pocc, PoccRpcModule::Rpc]);
//!     let server = RpcServerConfig::default().with_http_address("127.0.0.1:8545".parse().unwrap());
//!     let handle = launch(backend, &PoccApiConfig::default(), modules, server).await.unwrap();
//!     println!("serving on {:?}", handle.http_url());
//! }
//! ```

mod args;
mod config;
mod module;
mod registry;
mod server;

pub use args::{GasPriceOracleArgs, RpcServerArgs};
pub use config::PoccApiConfig;
pub use module::{PoccRpcModule, RpcModuleSelection};
pub use registry::{apis, RpcApi};
pub use server::{
    launch, RpcServerConfig, RpcServerHandle, TransportRpcModuleConfig, TransportRpcModules,
};

/// Common RPC constants.
pub mod constants;

/// Rpc error utilities.
pub mod error;
