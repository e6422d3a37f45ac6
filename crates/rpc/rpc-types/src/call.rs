use pocc_primitives::{Address, Bytes, U256, U64};
use serde::{Deserialize, Serialize};

/// Call request
///
/// Every field is optional; the node fills in defaults before executing.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CallRequest {
    /// From
    pub from: Option<Address>,
    /// To
    pub to: Option<Address>,
    /// Gas
    pub gas: Option<U64>,
    /// Gas Price
    pub gas_price: Option<U256>,
    /// Value
    pub value: Option<U256>,
    /// Data
    pub data: Option<Bytes>,
    /// Input, the newer name of `data`
    pub input: Option<Bytes>,
}

impl CallRequest {
    /// Returns the call data, preferring `input` over `data`.
    ///
    /// Fails if both are set and differ.
    pub fn input_data(&self) -> Result<Option<Bytes>, ConflictingInputs> {
        pick_input(&self.data, &self.input)
    }
}

/// Error thrown when both `data` and `input` fields are set and not equal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "both \"data\" and \"input\" are set and not equal. Please use \"input\" to pass transaction call data"
)]
#[non_exhaustive]
pub struct ConflictingInputs;

pub(crate) fn pick_input(
    data: &Option<Bytes>,
    input: &Option<Bytes>,
) -> Result<Option<Bytes>, ConflictingInputs> {
    match (data, input) {
        (Some(data), Some(input)) if data != input => Err(ConflictingInputs),
        (data, input) => Ok(input.clone().or_else(|| data.clone())),
    }
}
