//! An implementation of the gas price oracle, used for providing gas price estimates based on
//! previous blocks.

use pocc_interfaces::{BlockReader, ProviderResult};
use pocc_primitives::{constants::GWEI_TO_WEI, B256, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

/// The number of transactions sampled in a block
pub const SAMPLE_NUMBER: usize = 3;

/// The default maximum gas price to use for the estimate
pub const DEFAULT_MAX_PRICE: U256 = U256::from_limbs([500_000_000_000u64, 0, 0, 0]);

/// The default minimum gas price, under which the sample will be ignored
pub const DEFAULT_IGNORE_PRICE: U256 = U256::from_limbs([2u64, 0, 0, 0]);

/// The default gas price, returned while there are no samples
pub const DEFAULT_GAS_PRICE: U256 = U256::from_limbs([GWEI_TO_WEI, 0, 0, 0]);

/// Settings for the [GasPriceOracle]
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GasPriceOracleConfig {
    /// The number of populated blocks to produce the gas price estimate
    pub blocks: u32,

    /// The percentile of gas prices to use for the estimate
    pub percentile: u32,

    /// The maximum number of blocks for estimating gas price
    pub max_block_history: u64,

    /// The default gas price to use if there are no blocks to use
    pub default: U256,

    /// The maximum gas price to use for the estimate
    pub max_price: Option<U256>,

    /// The minimum gas price, under which the sample will be ignored
    pub ignore_price: Option<U256>,
}

impl Default for GasPriceOracleConfig {
    fn default() -> Self {
        Self {
            blocks: 20,
            percentile: 60,
            max_block_history: 1024,
            default: DEFAULT_GAS_PRICE,
            max_price: Some(DEFAULT_MAX_PRICE),
            ignore_price: Some(DEFAULT_IGNORE_PRICE),
        }
    }
}

/// Calculates a gas price depending on recent blocks.
#[derive(Debug)]
pub struct GasPriceOracle<Reader> {
    /// The type used to read canonical blocks
    reader: Reader,
    /// The config for the oracle
    oracle_config: GasPriceOracleConfig,
    /// The latest calculated price and its block hash
    last_price: Mutex<GasPriceOracleResult>,
}

impl<Reader> GasPriceOracle<Reader>
where
    Reader: BlockReader,
{
    /// Creates and returns the [GasPriceOracle].
    pub fn new(reader: Reader, mut oracle_config: GasPriceOracleConfig) -> Self {
        // sanitize the percentile to be less than 100
        if oracle_config.percentile > 100 {
            warn!(target: "rpc::pocc", prev_percentile=?oracle_config.percentile, "Invalid configured gas price percentile, using 100 instead");
            oracle_config.percentile = 100;
        }
        let last_price = GasPriceOracleResult { block_hash: B256::ZERO, price: oracle_config.default };

        Self { reader, oracle_config, last_price: Mutex::new(last_price) }
    }

    /// Returns the configuration of the oracle.
    pub const fn config(&self) -> &GasPriceOracleConfig {
        &self.oracle_config
    }

    /// Suggests a gas price estimate based on recent blocks, using the configured percentile.
    pub async fn suggest_price(&self) -> ProviderResult<U256> {
        let header = self.reader.latest_header().await?;
        let header_hash = header.hash_slow();

        let mut last_price = self.last_price.lock().await;

        // if we have stored a last price, then we check whether or not it was for the same head
        if last_price.block_hash == header_hash {
            return Ok(last_price.price)
        }

        let mut current_block = header.number;
        let mut results = Vec::new();
        let mut populated_blocks = 0;

        for _ in 0..self.oracle_config.max_block_history {
            let block_values = self.get_block_values(current_block, SAMPLE_NUMBER).await?;
            if !block_values.is_empty() {
                results.extend(block_values);
                populated_blocks += 1;
            }

            // break when we have enough populated blocks
            if populated_blocks >= self.oracle_config.blocks || current_block == 0 {
                break
            }

            current_block -= 1;
        }

        // sort results then take the configured percentile result
        let mut price = last_price.price;
        if !results.is_empty() {
            results.sort_unstable();
            let idx = (results.len() - 1) * self.oracle_config.percentile as usize / 100;
            if let Some(sample) = results.get(idx) {
                price = *sample;
            }
        }

        // constrain to the max price
        if let Some(max_price) = self.oracle_config.max_price {
            price = price.min(max_price);
        }

        *last_price = GasPriceOracleResult { block_hash: header_hash, price };

        Ok(price)
    }

    /// Get the `limit` lowest gas prices of the block at number `block_num`. If the oracle has a
    /// configured `ignore_price` threshold, then prices under that threshold are ignored, as are
    /// transactions sent by the block producer.
    async fn get_block_values(&self, block_num: u64, limit: usize) -> ProviderResult<Vec<U256>> {
        let block = self.reader.block(block_num).await?;

        let mut prices = block
            .body
            .iter()
            .filter(|tx| {
                let price = U256::from(tx.gas_price);
                if self.oracle_config.ignore_price.is_some_and(|ignore_under| price < ignore_under)
                {
                    return false
                }

                // recover sender, check if coinbase
                match tx.recover_signer() {
                    Some(addr) => addr != block.header.beneficiary,
                    None => false,
                }
            })
            .map(|tx| U256::from(tx.gas_price))
            .collect::<Vec<_>>();

        prices.sort_unstable();
        prices.truncate(limit);

        Ok(prices)
    }
}

/// Stores the last result that the oracle returned
#[derive(Debug, Clone)]
pub struct GasPriceOracleResult {
    /// The block hash that the oracle used to calculate the price
    pub block_hash: B256,
    /// The price that the oracle calculated
    pub price: U256,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pocc_interfaces::ProviderError;
    use pocc_primitives::{
        sign_message, Block, BlockNumber, BlockNumberOrTag, Header, Transaction,
        TransactionSigned, TxKind,
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn max_price_sanity() {
        assert_eq!(DEFAULT_MAX_PRICE, U256::from(500_000_000_000u64));
        assert_eq!(DEFAULT_MAX_PRICE, U256::from(500 * GWEI_TO_WEI))
    }

    #[test]
    fn ignore_price_sanity() {
        assert_eq!(DEFAULT_IGNORE_PRICE, U256::from(2u64));
    }

    struct Chain {
        blocks: Vec<Arc<Block>>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl BlockReader for Chain {
        async fn latest_header(&self) -> ProviderResult<Header> {
            Ok(self.blocks.last().map(|block| block.header.clone()).unwrap_or_default())
        }

        async fn block(&self, number: BlockNumber) -> ProviderResult<Arc<Block>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.blocks
                .get(number as usize)
                .cloned()
                .ok_or(ProviderError::HeaderNotFound(BlockNumberOrTag::Number(number)))
        }
    }

    fn signed(gas_price: u128) -> TransactionSigned {
        let tx = Transaction {
            chain_id: Some(1),
            nonce: 0,
            gas_price,
            gas_limit: 21_000,
            to: TxKind::Call(Default::default()),
            value: U256::ZERO,
            input: Default::default(),
        };
        let signature = sign_message(B256::with_last_byte(1), tx.signature_hash()).unwrap();
        TransactionSigned::from_transaction_and_signature(tx, signature)
    }

    fn chain(prices: &[&[u128]]) -> Chain {
        let blocks = prices
            .iter()
            .enumerate()
            .map(|(number, prices)| {
                Arc::new(Block {
                    header: Header { number: number as u64, ..Default::default() },
                    body: prices.iter().map(|price| signed(*price)).collect(),
                })
            })
            .collect();
        Chain { blocks, reads: AtomicUsize::new(0) }
    }

    #[tokio::test]
    async fn default_without_samples() {
        let oracle = GasPriceOracle::new(chain(&[&[], &[]]), GasPriceOracleConfig::default());
        assert_eq!(oracle.suggest_price().await.unwrap(), DEFAULT_GAS_PRICE);
    }

    #[tokio::test]
    async fn percentile_of_lowest_samples() {
        let config = GasPriceOracleConfig { percentile: 50, ..Default::default() };
        // block 1 only contributes its three lowest prices; 1 wei is ignored
        let oracle = GasPriceOracle::new(chain(&[&[10, 20], &[1, 30, 40, 50, 60]]), config);
        // samples: 10, 20, 30, 40, 50
        assert_eq!(oracle.suggest_price().await.unwrap(), U256::from(30));
    }

    #[tokio::test]
    async fn clamps_and_caches_per_head() {
        let config = GasPriceOracleConfig { max_price: Some(U256::from(15)), ..Default::default() };
        let oracle = GasPriceOracle::new(chain(&[&[100]]), config);
        assert_eq!(oracle.suggest_price().await.unwrap(), U256::from(15));
        let reads = oracle.reader.reads.load(Ordering::SeqCst);
        assert_eq!(oracle.suggest_price().await.unwrap(), U256::from(15));
        assert_eq!(oracle.reader.reads.load(Ordering::SeqCst), reads);
    }

    #[test]
    fn sanitizes_percentile() {
        let config = GasPriceOracleConfig { percentile: 250, ..Default::default() };
        let oracle = GasPriceOracle::new(chain(&[]), config);
        assert_eq!(oracle.config().percentile, 100);
    }
}
