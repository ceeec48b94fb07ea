//! Reversible encoding of the account id carried in verification links.

use core::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use gatehouse_core::{AccountId, DomainError};

/// Encode an account id as a URL-safe opaque payload.
pub fn encode_account_id(id: AccountId) -> String {
    URL_SAFE_NO_PAD.encode(id.as_uuid().to_string())
}

/// Decode the payload produced by [`encode_account_id`].
pub fn decode_account_id(payload: &str) -> Result<AccountId, DomainError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DomainError::invalid_id(format!("link payload: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| DomainError::invalid_id(format!("link payload: {e}")))?;
    AccountId::from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let id = AccountId::new();
        assert_eq!(decode_account_id(&encode_account_id(id)).unwrap(), id);
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert!(decode_account_id("!!!not-base64!!!").is_err());
    }

    #[test]
    fn rejects_payload_that_is_not_a_uuid() {
        let payload = URL_SAFE_NO_PAD.encode("definitely-not-a-uuid");
        assert!(decode_account_id(&payload).is_err());
    }
}
