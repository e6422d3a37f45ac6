//! Various serde utilities

/// serde functions for handling primitive `u64` as [U64](crate::U64)
pub mod u64_hex {
    use crate::U64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Deserializes an `u64` from [U64] accepting a hex quantity string with optional 0x prefix
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        U64::deserialize(deserializer).map(|val| val.to())
    }

    /// Serializes u64 as hex string
    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        U64::from(*value).serialize(s)
    }
}

/// serde functions for handling `Option<u64>` as `Option<U64>`
pub mod u64_hex_opt {
    use crate::U64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Deserializes an optional hex quantity
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<U64>::deserialize(deserializer)?.map(|val| val.to()))
    }

    /// Serializes an optional u64 as hex string
    pub fn serialize<S: Serializer>(value: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
        value.map(U64::from).serialize(s)
    }
}

/// serde functions for handling `u128` as a hex quantity
pub mod u128_hex {
    use crate::U256;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Deserializes an `u128` from a hex quantity
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val = U256::deserialize(deserializer)?;
        u128::try_from(val).map_err(|_| de::Error::custom("quantity exceeds u128"))
    }

    /// Serializes u128 as hex string
    pub fn serialize<S: Serializer>(value: &u128, s: S) -> Result<S::Ok, S::Error> {
        U256::from(*value).serialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_hex_u64() {
        #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
        struct Value {
            #[serde(with = "u64_hex")]
            inner: u64,
        }

        let val = Value { inner: 1000 };
        let s = serde_json::to_string(&val).unwrap();
        assert_eq!(s, "{\"inner\":\"0x3e8\"}");

        let deserialized: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(val, deserialized);
    }

    #[test]
    fn test_hex_u128_opt() {
        #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
        struct Value {
            #[serde(with = "u128_hex")]
            price: u128,
            #[serde(with = "u64_hex_opt", default)]
            nonce: Option<u64>,
        }

        let val: Value = serde_json::from_str(r#"{"price":"0x3b9aca00"}"#).unwrap();
        assert_eq!(val, Value { price: 1_000_000_000, nonce: None });

        let val: Value = serde_json::from_str(r#"{"price":"0x0","nonce":"0x2"}"#).unwrap();
        assert_eq!(val.nonce, Some(2));
    }
}
