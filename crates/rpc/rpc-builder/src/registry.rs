//! The services a node exposes over RPC.

use crate::{config::PoccApiConfig, constants::API_VERSION, PoccRpcModule};
use jsonrpsee::Methods;
use pocc_interfaces::Backend;
use pocc_rpc::{
    AccountApi, AddrLocker, BlockChainApi, DebugApi, PersonalApi, PoccApi, PoccPubSub,
    PrivateDebugApi, TransactionPoolApi, TxPoolApi,
};
use pocc_rpc_api::servers::*;
use std::sync::Arc;

/// One service of a namespace.
#[derive(Debug, Clone)]
pub struct RpcApi {
    /// Namespace the methods are served under
    pub namespace: PoccRpcModule,
    /// Version of the namespace
    pub version: &'static str,
    /// The RPC methods
    pub service: Methods,
    /// Whether the service may be exposed without being asked for by name
    pub public: bool,
}

impl RpcApi {
    fn new(namespace: PoccRpcModule, service: impl Into<Methods>, public: bool) -> Self {
        Self { namespace, version: API_VERSION, service: service.into(), public }
    }
}

/// Creates every service backed by `backend`.
///
/// One [`AddrLocker`] is shared by all services that submit transactions, so nonces of one account
/// are assigned one submission at a time whichever namespace the submission arrives through.
pub fn apis<B: Backend>(backend: Arc<B>, config: &PoccApiConfig) -> Vec<RpcApi> {
    let nonce_lock = AddrLocker::new();
    vec![
        RpcApi::new(PoccRpcModule::Pocc, PoccApi::new(backend.clone()).into_rpc(), true),
        RpcApi::new(
            PoccRpcModule::Pocc,
            BlockChainApi::new(backend.clone(), config.rpc_gas_cap, config.rpc_evm_timeout)
                .into_rpc(),
            true,
        ),
        RpcApi::new(
            PoccRpcModule::Pocc,
            TransactionPoolApi::new(backend.clone(), nonce_lock.clone()).into_rpc(),
            true,
        ),
        RpcApi::new(PoccRpcModule::Txpool, TxPoolApi::new(backend.clone()).into_rpc(), true),
        RpcApi::new(PoccRpcModule::Debug, DebugApi::new(backend.clone()).into_rpc(), true),
        RpcApi::new(PoccRpcModule::Debug, PrivateDebugApi::new(backend.clone()).into_rpc(), false),
        RpcApi::new(PoccRpcModule::Pocc, AccountApi::new(backend.clone()).into_rpc(), true),
        RpcApi::new(
            PoccRpcModule::Personal,
            PersonalApi::new(backend.clone(), nonce_lock).into_rpc(),
            false,
        ),
        RpcApi::new(PoccRpcModule::Pocc, PoccPubSub::new(backend).into_rpc(), true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::RpcModule;
    use pocc_interfaces::AccountManager;
    use pocc_primitives::{B256, U256};
    use pocc_rpc::test_utils::{random_secret, MockAccount, MockBackend};
    use serde_json::json;

    fn methods(api: &RpcApi) -> Vec<&'static str> {
        api.service.method_names().collect()
    }

    #[test]
    fn services_in_order() {
        let apis = apis(Arc::new(MockBackend::new(1)), &PoccApiConfig::default());
        let layout = apis.iter().map(|api| (api.namespace, api.public)).collect::<Vec<_>>();
        assert_eq!(
            layout,
            vec![
                (PoccRpcModule::Pocc, true),
                (PoccRpcModule::Pocc, true),
                (PoccRpcModule::Pocc, true),
                (PoccRpcModule::Txpool, true),
                (PoccRpcModule::Debug, true),
                (PoccRpcModule::Debug, false),
                (PoccRpcModule::Pocc, true),
                (PoccRpcModule::Personal, false),
                (PoccRpcModule::Pocc, true),
            ]
        );
        assert!(apis.iter().all(|api| api.version == "1.0"));
    }

    #[test]
    fn methods_are_namespaced() {
        for api in apis(Arc::new(MockBackend::new(1)), &PoccApiConfig::default()) {
            let prefix = format!("{}_", api.namespace);
            assert!(methods(&api).iter().all(|name| name.starts_with(&prefix)), "{api:?}");
        }
    }

    #[test]
    fn private_debug_only_rewinds() {
        let apis = apis(Arc::new(MockBackend::new(1)), &PoccApiConfig::default());
        assert_eq!(methods(&apis[5]), vec!["debug_setHead"]);
        assert!(methods(&apis[7]).contains(&"personal_sendTransaction"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn submitting_services_share_the_nonce_lock() {
        let backend = Arc::new(MockBackend::new(1));
        let from = backend.key_store().import_raw_key(random_secret(), "test").unwrap();
        backend.key_store().unlock(from, "test", None).unwrap();
        backend.set_account(from, MockAccount::with_balance(U256::from(10).pow(U256::from(18))));

        let mut module = RpcModule::new(());
        for api in apis(backend.clone(), &PoccApiConfig::default()) {
            module.merge(api.service).unwrap();
        }
        let methods = Methods::from(module);

        let request = json!({ "from": from, "to": from });
        let handles = (0..16)
            .map(|i| {
                let methods = methods.clone();
                let request = request.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        methods.call::<_, B256>("pocc_sendTransaction", [request]).await
                    } else {
                        methods
                            .call::<_, B256>("personal_sendTransaction", [request, json!("test")])
                            .await
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let content = backend.pool_content();
        let nonces = content.pending[&from].keys().copied().collect::<Vec<_>>();
        assert_eq!(nonces, (0..16).collect::<Vec<_>>());
    }
}
