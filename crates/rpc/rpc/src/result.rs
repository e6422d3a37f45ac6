//! Additional helpers for converting errors.

use jsonrpsee::core::RpcResult;
use jsonrpsee_types::{
    error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE},
    ErrorObject,
};
use pocc_interfaces::ProviderError;
use pocc_primitives::hex;

/// Helper trait to easily convert various `Result` types into [`RpcResult`]
pub trait ToRpcResult<Ok, Err>: Sized {
    /// Converts this type into an [`RpcResult`], picking the code, message and data from the
    /// error.
    fn map_rpc_err<'a, F, M>(self, op: F) -> RpcResult<Ok>
    where
        F: FnOnce(Err) -> (i32, M, Option<&'a [u8]>),
        M: Into<String>;
}

impl<Ok> ToRpcResult<Ok, ProviderError> for Result<Ok, ProviderError> {
    #[inline]
    fn map_rpc_err<'a, F, M>(self, op: F) -> RpcResult<Ok>
    where
        F: FnOnce(ProviderError) -> (i32, M, Option<&'a [u8]>),
        M: Into<String>,
    {
        self.map_err(|err| {
            let (code, msg, data) = op(err);
            rpc_err(code, msg, data)
        })
    }
}

/// Constructs an invalid params JSON-RPC error.
pub fn invalid_params_rpc_err(msg: impl Into<String>) -> ErrorObject<'static> {
    rpc_err(INVALID_PARAMS_CODE, msg, None)
}

/// Constructs an internal JSON-RPC error.
pub fn internal_rpc_err(msg: impl Into<String>) -> ErrorObject<'static> {
    rpc_err(INTERNAL_ERROR_CODE, msg, None)
}

/// Constructs a JSON-RPC error, consisting of `code`, `message` and optional `data`.
///
/// `data` is sent hex encoded.
pub fn rpc_err(code: i32, msg: impl Into<String>, data: Option<&[u8]>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), data.map(hex::encode_prefixed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocc_primitives::BlockNumberOrTag;

    #[test]
    fn ok_passes_through() {
        let res: Result<u64, ProviderError> = Ok(100);
        let val = res.map_rpc_err(|err| (INTERNAL_ERROR_CODE, err.to_string(), None)).unwrap();
        assert_eq!(val, 100);
    }

    #[test]
    fn error_takes_mapped_code() {
        let res: Result<(), _> = Err(ProviderError::HeaderNotFound(BlockNumberOrTag::Number(5)));
        let err = res.map_rpc_err(|err| (INVALID_PARAMS_CODE, err.to_string(), None)).unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS_CODE);
        assert!(err.data().is_none());
    }

    #[test]
    fn data_is_hex_encoded() {
        let err = rpc_err(3, "reverted", Some(&[0xde, 0xad]));
        assert_eq!(err.code(), 3);
        assert_eq!(err.data().map(|data| data.get()), Some("\"0xdead\""));
    }
}
