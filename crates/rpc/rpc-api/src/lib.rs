//! Pocc RPC interface definitions
//!
//! Provides all RPC interfaces.
//!
//! ## Feature Flags
//!
//! - `client`: Enables JSON-RPC client support.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod debug;
mod personal;
mod pocc;
mod pubsub;
mod rpc;
mod txpool;

/// re-export of all server traits
pub use servers::*;

/// Aggregates all server traits.
pub mod servers {
    pub use crate::{
        debug::{DebugApiServer, PrivateDebugApiServer},
        personal::PersonalApiServer,
        pocc::{AccountApiServer, BlockChainApiServer, PoccApiServer, TransactionPoolApiServer},
        pubsub::PoccPubSubApiServer,
        rpc::RpcApiServer,
        txpool::TxPoolApiServer,
    };
}

/// re-export of all client traits
#[cfg(feature = "client")]
pub use clients::*;

/// Aggregates all client traits.
#[cfg(feature = "client")]
pub mod clients {
    pub use crate::{
        debug::{DebugApiClient, PrivateDebugApiClient},
        personal::PersonalApiClient,
        pocc::{AccountApiClient, BlockChainApiClient, PoccApiClient, TransactionPoolApiClient},
        pubsub::PoccPubSubApiClient,
        rpc::RpcApiClient,
        txpool::TxPoolApiClient,
    };
}
