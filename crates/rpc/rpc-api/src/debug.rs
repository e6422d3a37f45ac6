use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use pocc_primitives::{Bytes, U64};

/// Public debug rpc interface.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "debug"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "debug"))]
pub trait DebugApi {
    /// Returns the RLP encoding of the canonical block with the given number.
    #[method(name = "getBlockRlp")]
    async fn get_block_rlp(&self, number: U64) -> RpcResult<Bytes>;

    /// Returns a human readable dump of the canonical block with the given number.
    #[method(name = "printBlock")]
    async fn print_block(&self, number: U64) -> RpcResult<String>;
}

/// Private debug rpc interface. Never exposed unless explicitly selected.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "debug"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "debug"))]
pub trait PrivateDebugApi {
    /// Rewinds the canonical chain to the given block number.
    #[method(name = "setHead")]
    async fn set_head(&self, number: U64) -> RpcResult<()>;
}
