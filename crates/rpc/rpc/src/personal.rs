use crate::{
    nonce_lock::AddrLocker,
    pocc::{
        error::{PoccApiError, PoccResult},
        fill_transaction,
        signer::{hash_message, recover_message_signer},
        submit_transaction,
    },
};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use pocc_interfaces::Backend;
use pocc_primitives::{Address, Bytes, TransactionSignedEcRecovered, TxHash, B256};
use pocc_rpc_api::PersonalApiServer;
use pocc_rpc_types::TransactionRequest;
use std::{str::FromStr, sync::Arc, time::Duration};
use tracing::{info, trace};

/// How long `personal_unlockAccount` unlocks a key when no duration is given.
pub const DEFAULT_UNLOCK_DURATION: Duration = Duration::from_secs(300);

/// `personal` API implementation.
///
/// Submissions go through the same [`AddrLocker`] as `pocc_sendTransaction`, so the two namespaces
/// never hand out the same nonce.
pub struct PersonalApi<B> {
    backend: Arc<B>,
    locker: AddrLocker,
}

impl<B> PersonalApi<B> {
    /// Creates a new instance sharing the given locker.
    pub const fn new(backend: Arc<B>, locker: AddrLocker) -> Self {
        Self { backend, locker }
    }
}

impl<B> Clone for PersonalApi<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend), locker: self.locker.clone() }
    }
}

impl<B: Backend> PersonalApi<B> {
    /// Imports a hex encoded secret key.
    pub fn import_raw_key(&self, privkey: &str, password: &str) -> PoccResult<Address> {
        let secret = B256::from_str(privkey)
            .map_err(|err| PoccApiError::InvalidParams(format!("invalid private key: {err}")))?;
        let address = self.backend.account_manager().import_raw_key(secret, password)?;
        info!(target: "rpc::personal", %address, "Imported account");
        Ok(address)
    }

    /// Unlocks the key of `address`. `None` applies [`DEFAULT_UNLOCK_DURATION`] and zero seconds
    /// unlock until the key is locked again.
    pub fn unlock_account(
        &self,
        address: Address,
        password: &str,
        duration: Option<u64>,
    ) -> PoccResult<()> {
        let duration = match duration {
            None => Some(DEFAULT_UNLOCK_DURATION),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };
        self.backend.account_manager().unlock(address, password, duration)?;
        Ok(())
    }

    /// Signs the request with the sender's key, unlocked by `password` for this signature only,
    /// and submits it.
    pub async fn send_transaction(
        &self,
        request: TransactionRequest,
        password: &str,
    ) -> PoccResult<TxHash> {
        let from = request.from;
        let _guard = self.locker.lock_addr(from).await;

        let tx = fill_transaction(&*self.backend, request).await?;
        let signed =
            self.backend.account_manager().sign_transaction_with_passphrase(from, password, tx)?;
        submit_transaction(
            &*self.backend,
            TransactionSignedEcRecovered::from_signed_transaction(signed, from),
        )
        .await
    }

    /// Signs the prefixed hash of `data`.
    pub fn sign(&self, data: &[u8], address: Address, password: &str) -> PoccResult<Bytes> {
        let signature = self.backend.account_manager().sign_hash_with_passphrase(
            address,
            password,
            hash_message(data),
        )?;
        Ok(signature.to_rsv_bytes().to_vec().into())
    }
}

#[async_trait]
impl<B: Backend> PersonalApiServer for PersonalApi<B> {
    /// Handler for `personal_listAccounts`
    async fn list_accounts(&self) -> RpcResult<Vec<Address>> {
        trace!(target: "rpc::personal", "Serving personal_listAccounts");
        Ok(self.backend.account_manager().accounts())
    }

    /// Handler for `personal_newAccount`
    async fn new_account(&self, password: String) -> RpcResult<Address> {
        trace!(target: "rpc::personal", "Serving personal_newAccount");
        let address =
            self.backend.account_manager().new_account(&password).map_err(PoccApiError::from)?;
        info!(target: "rpc::personal", %address, "Created account");
        Ok(address)
    }

    /// Handler for `personal_importRawKey`
    async fn import_raw_key(&self, privkey: String, password: String) -> RpcResult<Address> {
        trace!(target: "rpc::personal", "Serving personal_importRawKey");
        Ok(Self::import_raw_key(self, &privkey, &password)?)
    }

    /// Handler for `personal_unlockAccount`
    async fn unlock_account(
        &self,
        address: Address,
        password: String,
        duration: Option<u64>,
    ) -> RpcResult<bool> {
        trace!(target: "rpc::personal", ?address, ?duration, "Serving personal_unlockAccount");
        Self::unlock_account(self, address, &password, duration)?;
        Ok(true)
    }

    /// Handler for `personal_lockAccount`
    async fn lock_account(&self, address: Address) -> RpcResult<bool> {
        trace!(target: "rpc::personal", ?address, "Serving personal_lockAccount");
        self.backend.account_manager().lock(address).map_err(PoccApiError::from)?;
        Ok(true)
    }

    /// Handler for `personal_sendTransaction`
    async fn send_transaction(
        &self,
        request: TransactionRequest,
        password: String,
    ) -> RpcResult<B256> {
        trace!(target: "rpc::personal", ?request, "Serving personal_sendTransaction");
        Ok(Self::send_transaction(self, request, &password).await?)
    }

    /// Handler for `personal_sign`
    async fn sign(&self, data: Bytes, address: Address, password: String) -> RpcResult<Bytes> {
        trace!(target: "rpc::personal", ?address, "Serving personal_sign");
        Ok(Self::sign(self, &data, address, &password)?)
    }

    /// Handler for `personal_ecRecover`
    async fn ec_recover(&self, data: Bytes, signature: Bytes) -> RpcResult<Address> {
        trace!(target: "rpc::personal", "Serving personal_ecRecover");
        recover_message_signer(&data, &signature).ok_or_else(|| {
            PoccApiError::InvalidParams("invalid signature".to_string()).into()
        })
    }
}

impl<B> std::fmt::Debug for PersonalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalApi").field("locker", &self.locker).finish_non_exhaustive()
    }
}
