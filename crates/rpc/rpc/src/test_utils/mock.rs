//! An in-memory [`Backend`] with a scripted interpreter.

use crate::pocc::{
    gas_oracle::{GasPriceOracle, GasPriceOracleConfig},
    signer::KeyStore,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use pocc_interfaces::{
    pool::TransactionsBySender, AccountManager, Backend, BlockReader, Evm, EvmError, EvmGuard,
    ExecutionResult, HaltReason, Message, PoolContent, PoolError, PoolResult, PoolStats,
    ProviderError, ProviderResult, StateProvider, StateProviderBox,
};
use pocc_primitives::{
    Address, Block, BlockHash, BlockNumber, BlockNumberOrTag, BlockSummary, Bytes, ChainConfig,
    ChainEvent, ChainHeadEvent, ChainSideEvent, Header, NewTxsEvent, Receipt, StorageKey,
    StorageValue, TransactionSigned, TransactionSignedEcRecovered, TxHash, MIN_TRANSACTION_GAS,
    U256,
};
use pocc_tokio_util::{EventSender, EventStream};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;

/// Protocol version reported by the mock.
pub const MOCK_PROTOCOL_VERSION: u64 = 63;

/// Gas limit of every mock block.
pub const MOCK_BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// Decides the outcome of a message run by the mock interpreter.
pub type EvmScript = Arc<dyn Fn(&Message, &dyn StateProvider) -> ExecutionResult + Send + Sync>;

/// Succeeds with the intrinsic gas and returns the code of the callee, running out of gas below
/// the intrinsic gas.
fn default_script() -> EvmScript {
    gas_hungry_script(MIN_TRANSACTION_GAS)
}

/// Succeeds once the gas limit reaches `required`, halts out of gas below it.
pub fn gas_hungry_script(required: u64) -> EvmScript {
    Arc::new(move |msg, state| {
        if msg.gas_limit < required {
            return ExecutionResult::Halt { reason: HaltReason::OutOfGas, gas_used: msg.gas_limit }
        }
        let output = msg.to.and_then(|to| state.code(to).ok()).unwrap_or_default();
        ExecutionResult::Success { gas_used: required, output, logs: vec![] }
    })
}

/// Always reverts with the given payload.
pub fn revert_script(output: Bytes) -> EvmScript {
    Arc::new(move |_, _| ExecutionResult::Revert {
        gas_used: MIN_TRANSACTION_GAS,
        output: output.clone(),
    })
}

/// An account of the mock state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockAccount {
    /// Balance
    pub balance: U256,
    /// Nonce
    pub nonce: u64,
    /// Deployed code
    pub code: Bytes,
    /// Storage slots
    pub storage: HashMap<StorageKey, StorageValue>,
}

impl MockAccount {
    /// An account holding `balance`.
    pub fn with_balance(balance: U256) -> Self {
        Self { balance, ..Default::default() }
    }
}

/// The state of one block.
#[derive(Debug, Clone, Default)]
struct MockState(Arc<HashMap<Address, MockAccount>>);

impl MockState {
    fn account(&self, address: &Address) -> Option<&MockAccount> {
        self.0.get(address)
    }
}

impl StateProvider for MockState {
    fn balance(&self, address: Address) -> ProviderResult<U256> {
        Ok(self.account(&address).map(|acc| acc.balance).unwrap_or_default())
    }

    fn nonce(&self, address: Address) -> ProviderResult<u64> {
        Ok(self.account(&address).map(|acc| acc.nonce).unwrap_or_default())
    }

    fn code(&self, address: Address) -> ProviderResult<Bytes> {
        Ok(self.account(&address).map(|acc| acc.code.clone()).unwrap_or_default())
    }

    fn storage(&self, address: Address, key: StorageKey) -> ProviderResult<StorageValue> {
        Ok(self
            .account(&address)
            .and_then(|acc| acc.storage.get(&key).copied())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct ChainInner {
    blocks: Vec<Arc<Block>>,
    hashes: HashMap<BlockHash, BlockNumber>,
    states: Vec<MockState>,
    receipts: HashMap<BlockHash, Vec<Receipt>>,
}

/// An in-memory canonical chain.
#[derive(Debug)]
pub struct MockChain {
    inner: RwLock<ChainInner>,
}

impl MockChain {
    /// Creates a chain holding only a genesis block with the given state.
    fn new(accounts: HashMap<Address, MockAccount>) -> Self {
        let genesis = Block {
            header: Header {
                difficulty: U256::from(1),
                gas_limit: MOCK_BLOCK_GAS_LIMIT,
                ..Default::default()
            },
            body: vec![],
        };
        let chain = Self { inner: RwLock::new(ChainInner::default()) };
        chain.push(genesis, MockState(Arc::new(accounts)), vec![]);
        chain
    }

    fn push(&self, block: Block, state: MockState, receipts: Vec<Receipt>) -> Arc<Block> {
        let block = Arc::new(block);
        let hash = block.hash_slow();
        let mut inner = self.inner.write();
        inner.hashes.insert(hash, block.number());
        inner.receipts.insert(hash, receipts);
        inner.blocks.push(Arc::clone(&block));
        inner.states.push(state);
        block
    }

    /// The canonical head.
    pub fn head(&self) -> Arc<Block> {
        let inner = self.inner.read();
        Arc::clone(&inner.blocks[inner.blocks.len() - 1])
    }

    fn head_state(&self) -> MockState {
        let inner = self.inner.read();
        inner.states[inner.states.len() - 1].clone()
    }

    fn block_at(&self, number: BlockNumber) -> Option<Arc<Block>> {
        self.inner.read().blocks.get(number as usize).cloned()
    }

    fn state_at(&self, number: BlockNumber) -> Option<MockState> {
        self.inner.read().states.get(number as usize).cloned()
    }

    fn number_of(&self, hash: &BlockHash) -> Option<BlockNumber> {
        self.inner.read().hashes.get(hash).copied()
    }

    fn rewind(&self, number: BlockNumber) -> ProviderResult<()> {
        let mut inner = self.inner.write();
        let head = inner.blocks.len() as u64 - 1;
        if number > head {
            return Err(ProviderError::InvalidRewind { requested: number, head })
        }
        let removed: Vec<_> = inner.blocks.drain(number as usize + 1..).collect();
        for block in removed {
            let hash = block.hash_slow();
            inner.hashes.remove(&hash);
            inner.receipts.remove(&hash);
        }
        inner.states.truncate(number as usize + 1);
        Ok(())
    }
}

#[async_trait]
impl BlockReader for MockChain {
    async fn latest_header(&self) -> ProviderResult<Header> {
        Ok(self.head().header.clone())
    }

    async fn block(&self, number: BlockNumber) -> ProviderResult<Arc<Block>> {
        self.block_at(number)
            .ok_or(ProviderError::HeaderNotFound(BlockNumberOrTag::Number(number)))
    }
}

/// The interpreter of the mock: applies the funds check, then the script.
struct MockEvm {
    msg: Message,
    state: StateProviderBox,
    script: EvmScript,
    delay: Option<Duration>,
    cancel: CancellationToken,
}

impl Evm for MockEvm {
    fn transact(&mut self) -> Result<ExecutionResult, EvmError> {
        if let Some(delay) = self.delay {
            let deadline = Instant::now() + delay;
            while Instant::now() < deadline {
                if self.cancel.is_cancelled() {
                    return Err(EvmError::Cancelled)
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        if self.cancel.is_cancelled() {
            return Err(EvmError::Cancelled)
        }

        let cost = U256::from(self.msg.gas_limit) * self.msg.gas_price + self.msg.value;
        if self.state.balance(self.msg.from)? < cost {
            return Err(EvmError::InsufficientFunds)
        }
        Ok((self.script)(&self.msg, &*self.state))
    }
}

/// Scripted behavior of the interpreter.
struct EvmConfig {
    script: EvmScript,
    delay: Option<Duration>,
}

/// An in-memory node.
///
/// The pool accepts any correctly signed transaction whose nonce is not below the sender's
/// confirmed nonce. [`MockBackend::mine`] moves the executable pool transactions into a new
/// block.
pub struct MockBackend {
    chain_config: ChainConfig,
    chain: Arc<MockChain>,
    pool: Mutex<TransactionsBySender>,
    key_store: KeyStore,
    gas_oracle: GasPriceOracle<Arc<MockChain>>,
    evm: RwLock<EvmConfig>,
    evm_instances: AtomicUsize,
    evm_releases: Arc<AtomicUsize>,
    chain_events: EventSender<ChainEvent>,
    head_events: EventSender<ChainHeadEvent>,
    side_events: EventSender<ChainSideEvent>,
    tx_events: EventSender<NewTxsEvent>,
}

impl MockBackend {
    /// Creates a node on the given chain with an empty genesis state.
    pub fn new(chain_id: u64) -> Self {
        Self::with_accounts(chain_id, [])
    }

    /// Creates a node on the given chain with the given genesis accounts.
    pub fn with_accounts(
        chain_id: u64,
        accounts: impl IntoIterator<Item = (Address, MockAccount)>,
    ) -> Self {
        let chain = Arc::new(MockChain::new(accounts.into_iter().collect()));
        Self {
            chain_config: ChainConfig::new(chain_id),
            gas_oracle: GasPriceOracle::new(Arc::clone(&chain), GasPriceOracleConfig::default()),
            chain,
            pool: Default::default(),
            key_store: KeyStore::new(),
            evm: RwLock::new(EvmConfig { script: default_script(), delay: None }),
            evm_instances: Default::default(),
            evm_releases: Default::default(),
            chain_events: Default::default(),
            head_events: Default::default(),
            side_events: Default::default(),
            tx_events: Default::default(),
        }
    }

    /// The key store serving as account manager.
    pub const fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    /// Replaces the interpreter script.
    pub fn set_evm_script(&self, script: EvmScript) {
        self.evm.write().script = script;
    }

    /// Makes every execution take `delay` before it runs the script.
    pub fn set_evm_delay(&self, delay: Duration) {
        self.evm.write().delay = Some(delay);
    }

    /// How many interpreter instances have been released.
    pub fn evm_releases(&self) -> usize {
        self.evm_releases.load(Ordering::SeqCst)
    }

    /// How many interpreter instances have been handed out.
    pub fn evm_instances(&self) -> usize {
        self.evm_instances.load(Ordering::SeqCst)
    }

    /// Overwrites an account in the head state.
    pub fn set_account(&self, address: Address, account: MockAccount) {
        let mut inner = self.chain.inner.write();
        let last = inner.states.len() - 1;
        Arc::make_mut(&mut inner.states[last].0).insert(address, account);
    }

    /// Publishes a side chain block.
    pub fn notify_side_block(&self, block: Arc<Block>) {
        self.side_events.notify(ChainSideEvent { block });
    }

    /// Mines the executable pool transactions into a new canonical block.
    pub fn mine(&self) -> Arc<Block> {
        let executable = {
            let state = self.chain.head_state();
            let mut pool = self.pool.lock();
            let mut mined = Vec::new();
            for (sender, txs) in pool.iter_mut() {
                let mut nonce = state.nonce(*sender).unwrap_or_default();
                while let Some(tx) = txs.remove(&nonce) {
                    mined.push(tx);
                    nonce += 1;
                }
            }
            pool.retain(|_, txs| !txs.is_empty());
            mined
        };

        let parent = self.chain.head();
        let mut state = self.chain.head_state();
        let accounts = Arc::make_mut(&mut state.0);
        let mut receipts = Vec::with_capacity(executable.len());
        let mut cumulative_gas_used = 0;
        for tx in &executable {
            let account = accounts.entry(tx.signer()).or_default();
            account.nonce = tx.nonce + 1;
            cumulative_gas_used += MIN_TRANSACTION_GAS;
            receipts.push(Receipt {
                success: true,
                cumulative_gas_used,
                gas_used: MIN_TRANSACTION_GAS,
                contract_address: tx.to().is_none().then(|| tx.signer().create(tx.nonce)),
                logs: vec![],
            });
        }

        let block = Block {
            header: Header {
                parent_hash: parent.hash_slow(),
                difficulty: U256::from(1),
                number: parent.number() + 1,
                gas_limit: MOCK_BLOCK_GAS_LIMIT,
                gas_used: cumulative_gas_used,
                timestamp: parent.header.timestamp + 1,
                ..Default::default()
            },
            body: executable.into_iter().map(TransactionSignedEcRecovered::into_signed).collect(),
        };
        let block = self.chain.push(block, state, receipts);
        let hash = block.hash_slow();
        self.chain_events.notify(ChainEvent { block: Arc::clone(&block), hash, logs: vec![] });
        self.head_events.notify(ChainHeadEvent { block: Arc::clone(&block) });
        block
    }

    /// The next nonce of `address`, counting the pooled transactions that continue its confirmed
    /// nonce.
    fn next_nonce(&self, address: Address) -> u64 {
        let mut nonce = self.chain.head_state().nonce(address).unwrap_or_default();
        if let Some(txs) = self.pool.lock().get(&address) {
            while txs.contains_key(&nonce) {
                nonce += 1;
            }
        }
        nonce
    }

    /// Splits the pool into executable and gapped transactions.
    fn split_pool(&self) -> PoolContent {
        let state = self.chain.head_state();
        let mut content = PoolContent::default();
        for (sender, txs) in self.pool.lock().iter() {
            let mut next = state.nonce(*sender).unwrap_or_default();
            for (nonce, tx) in txs {
                let section = if *nonce == next {
                    next += 1;
                    &mut content.pending
                } else {
                    &mut content.queued
                };
                section.entry(*sender).or_default().insert(*nonce, tx.clone());
            }
        }
        content
    }

    /// The block being built on top of the head: the executable pool transactions.
    fn pending_block(&self) -> Block {
        let head = self.chain.head();
        let body = self
            .split_pool()
            .pending
            .into_values()
            .flat_map(BTreeMap::into_values)
            .map(TransactionSignedEcRecovered::into_signed)
            .collect();
        Block {
            header: Header {
                parent_hash: head.hash_slow(),
                difficulty: U256::from(1),
                number: head.number() + 1,
                gas_limit: MOCK_BLOCK_GAS_LIMIT,
                timestamp: head.header.timestamp + 1,
                ..Default::default()
            },
            body,
        }
    }

    fn resolve(&self, number: BlockNumberOrTag) -> BlockNumber {
        match number {
            BlockNumberOrTag::Earliest => 0,
            BlockNumberOrTag::Number(number) => number,
            BlockNumberOrTag::Latest | BlockNumberOrTag::Pending => self.chain.head().number(),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn protocol_version(&self) -> u64 {
        MOCK_PROTOCOL_VERSION
    }

    async fn suggest_price(&self) -> ProviderResult<U256> {
        self.gas_oracle.suggest_price().await
    }

    fn chain_config(&self) -> ChainConfig {
        self.chain_config
    }

    fn current_block(&self) -> Arc<Block> {
        self.chain.head()
    }

    fn account_manager(&self) -> &dyn AccountManager {
        &self.key_store
    }

    async fn set_head(&self, number: BlockNumber) -> ProviderResult<()> {
        self.chain.rewind(number)?;
        self.head_events.notify(ChainHeadEvent { block: self.chain.head() });
        Ok(())
    }

    async fn header_by_number(&self, number: BlockNumberOrTag) -> ProviderResult<Header> {
        Ok(self.block_by_number(number).await?.header.clone())
    }

    async fn block_by_number(&self, number: BlockNumberOrTag) -> ProviderResult<Arc<Block>> {
        if number.is_pending() {
            return Ok(Arc::new(self.pending_block()))
        }
        self.chain.block_at(self.resolve(number)).ok_or(ProviderError::HeaderNotFound(number))
    }

    async fn block_by_hash(&self, hash: BlockHash) -> ProviderResult<Arc<Block>> {
        self.chain
            .number_of(&hash)
            .and_then(|number| self.chain.block_at(number))
            .ok_or(ProviderError::BlockHashNotFound(hash))
    }

    async fn poc_blocks(
        &self,
        start: BlockNumberOrTag,
        count: u64,
    ) -> ProviderResult<Vec<BlockSummary>> {
        let start = self.resolve(start);
        if self.chain.block_at(start).is_none() {
            return Err(ProviderError::HeaderNotFound(BlockNumberOrTag::Number(start)))
        }
        Ok((0..count)
            .map_while(|offset| start.checked_sub(offset))
            .filter_map(|number| self.chain.block_at(number))
            .map(|block| block.summary())
            .collect())
    }

    async fn receipts(&self, hash: BlockHash) -> ProviderResult<Vec<Receipt>> {
        self.chain
            .inner
            .read()
            .receipts
            .get(&hash)
            .cloned()
            .ok_or(ProviderError::ReceiptsNotFound(hash))
    }

    async fn total_difficulty(&self, hash: BlockHash) -> ProviderResult<U256> {
        let number =
            self.chain.number_of(&hash).ok_or(ProviderError::TotalDifficultyNotFound(hash))?;
        Ok(self.chain.inner.read().blocks[..=number as usize]
            .iter()
            .map(|block| block.header.difficulty)
            .sum())
    }

    async fn state_and_header_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> ProviderResult<(StateProviderBox, Header)> {
        if number.is_pending() {
            let mut state = self.chain.head_state();
            let accounts = Arc::make_mut(&mut state.0);
            for (sender, txs) in self.split_pool().pending {
                if let Some(last) = txs.keys().next_back() {
                    accounts.entry(sender).or_default().nonce = last + 1;
                }
            }
            return Ok((Box::new(state), self.pending_block().header))
        }

        let resolved = self.resolve(number);
        let block = self.chain.block_at(resolved).ok_or(ProviderError::HeaderNotFound(number))?;
        let state = self.chain.state_at(resolved).ok_or(ProviderError::StateUnavailable(resolved))?;
        Ok((Box::new(state), block.header.clone()))
    }

    async fn evm(
        &self,
        msg: Message,
        state: StateProviderBox,
        _header: &Header,
        cancel: CancellationToken,
    ) -> Result<EvmGuard, EvmError> {
        let (script, delay) = {
            let config = self.evm.read();
            (Arc::clone(&config.script), config.delay)
        };
        self.evm_instances.fetch_add(1, Ordering::SeqCst);
        let releases = Arc::clone(&self.evm_releases);
        let evm = MockEvm { msg, state, script, delay, cancel };
        Ok(EvmGuard::new(Box::new(evm), move || {
            releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
    }

    fn subscribe_chain_events(&self) -> EventStream<ChainEvent> {
        self.chain_events.new_listener()
    }

    fn subscribe_chain_head_events(&self) -> EventStream<ChainHeadEvent> {
        self.head_events.new_listener()
    }

    fn subscribe_chain_side_events(&self) -> EventStream<ChainSideEvent> {
        self.side_events.new_listener()
    }

    fn subscribe_new_txs(&self) -> EventStream<NewTxsEvent> {
        self.tx_events.new_listener()
    }

    async fn send_tx(&self, tx: TransactionSignedEcRecovered) -> PoolResult<TxHash> {
        // widen the window between nonce selection and admission
        tokio::task::yield_now().await;

        let sender = tx.signer();
        let state_nonce = self.chain.head_state().nonce(sender).unwrap_or_default();
        if tx.nonce < state_nonce {
            return Err(PoolError::NonceTooLow { tx_nonce: tx.nonce, state_nonce })
        }

        let hash = tx.hash();
        {
            let mut pool = self.pool.lock();
            let txs = pool.entry(sender).or_default();
            if let Some(existing) = txs.get(&tx.nonce) {
                if existing.hash() == hash {
                    return Err(PoolError::AlreadyKnown(hash))
                }
                if existing.gas_price >= tx.gas_price {
                    return Err(PoolError::ReplacementUnderpriced)
                }
            }
            txs.insert(tx.nonce, tx.clone());
        }

        let signed: TransactionSigned = tx.into_signed();
        self.tx_events.notify(NewTxsEvent { txs: vec![Arc::new(signed)] });
        Ok(hash)
    }

    fn pool_transactions(&self) -> Vec<TransactionSignedEcRecovered> {
        self.pool.lock().values().flat_map(|txs| txs.values().cloned()).collect()
    }

    fn pool_transaction(&self, hash: TxHash) -> Option<TransactionSignedEcRecovered> {
        self.pool
            .lock()
            .values()
            .flat_map(BTreeMap::values)
            .find(|tx| tx.hash() == hash)
            .cloned()
    }

    async fn pool_nonce(&self, address: Address) -> ProviderResult<u64> {
        tokio::task::yield_now().await;
        Ok(self.next_nonce(address))
    }

    fn pool_stats(&self) -> PoolStats {
        let content = self.split_pool();
        let count =
            |section: &TransactionsBySender| -> usize { section.values().map(BTreeMap::len).sum() };
        PoolStats { pending: count(&content.pending), queued: count(&content.queued) }
    }

    fn pool_content(&self) -> PoolContent {
        self.split_pool()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("chain_config", &self.chain_config)
            .field("head", &self.chain.head().number())
            .finish_non_exhaustive()
    }
}
