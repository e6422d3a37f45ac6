use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use pocc_primitives::{Address, Bytes, B256};
use pocc_rpc_types::TransactionRequest;

/// Personal rpc interface: key management and signing for the node's managed accounts.
///
/// Never public. Only served when explicitly selected for a transport.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "personal"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "personal"))]
pub trait PersonalApi {
    /// Returns the addresses of all managed accounts.
    #[method(name = "listAccounts")]
    async fn list_accounts(&self) -> RpcResult<Vec<Address>>;

    /// Creates a new account protected by `password` and returns its address.
    #[method(name = "newAccount")]
    async fn new_account(&self, password: String) -> RpcResult<Address>;

    /// Imports a hex encoded secret key protected by `password`.
    #[method(name = "importRawKey")]
    async fn import_raw_key(&self, privkey: String, password: String) -> RpcResult<Address>;

    /// Unlocks the account for `duration` seconds, 300 if not given. Zero keeps it unlocked
    /// until it is locked again.
    #[method(name = "unlockAccount")]
    async fn unlock_account(
        &self,
        address: Address,
        password: String,
        duration: Option<u64>,
    ) -> RpcResult<bool>;

    /// Locks the account.
    #[method(name = "lockAccount")]
    async fn lock_account(&self, address: Address) -> RpcResult<bool>;

    /// Signs the transaction with the sender's key, unlocked with `password` for this call
    /// only, and submits it.
    #[method(name = "sendTransaction")]
    async fn send_transaction(
        &self,
        request: TransactionRequest,
        password: String,
    ) -> RpcResult<B256>;

    /// Signs `data` with the prefixed message hash.
    #[method(name = "sign")]
    async fn sign(&self, data: Bytes, address: Address, password: String) -> RpcResult<Bytes>;

    /// Returns the address that produced `signature` over the prefixed hash of `data`.
    #[method(name = "ecRecover")]
    async fn ec_recover(&self, data: Bytes, signature: Bytes) -> RpcResult<Address>;
}
