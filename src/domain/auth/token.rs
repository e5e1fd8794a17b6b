//! Refresh token identifiers and issued token pairs

use serde::{Deserialize, Serialize};

/// Opaque single-use reference exchanged for a new access token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshTokenId(String);

impl RefreshTokenId {
    /// Generate a new random 128-bit identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cache key the refresh record is stored under
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<String> for RefreshTokenId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RefreshTokenId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed access token together with the refresh id that can renew it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: RefreshTokenId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_uuids() {
        let id = RefreshTokenId::generate();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_eq!(id.as_bytes().len(), 36);
    }

    #[test]
    fn test_generated_ids_do_not_repeat() {
        let ids: HashSet<RefreshTokenId> = (0..1000).map(|_| RefreshTokenId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_token_pair_json_shape() {
        let pair = TokenPair {
            token: "header.payload.signature".to_string(),
            refresh_token: RefreshTokenId::from("abc"),
        };

        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(
            json,
            r#"{"token":"header.payload.signature","refresh_token":"abc"}"#
        );
    }
}
