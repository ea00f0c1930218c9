//! Client token decoding.
//!
//! The gateway does not validate tokens itself; a [`TokenDecoder`] turns the
//! token field into a connection id, or refuses it.

use thiserror::Error;

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TokenError(String);

impl TokenError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Turns a client token into a connection id.
pub trait TokenDecoder: Send + Sync {
    /// `pattern` and `operation` are passed so decoders can apply
    /// per-operation policy.
    fn decode(&self, pattern: &str, operation: &str, token: &str) -> Result<u64, TokenError>;
}

/// Treats the token as the decimal connection id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericTokenDecoder;

impl TokenDecoder for NumericTokenDecoder {
    fn decode(&self, _pattern: &str, _operation: &str, token: &str) -> Result<u64, TokenError> {
        token
            .parse::<u64>()
            .map_err(|e| TokenError::new(format!("token `{token}` is not a connection id: {e}")))
    }
}

impl<F> TokenDecoder for F
where
    F: Fn(&str, &str, &str) -> Result<u64, TokenError> + Send + Sync,
{
    fn decode(&self, pattern: &str, operation: &str, token: &str) -> Result<u64, TokenError> {
        self(pattern, operation, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tokens_become_connection_ids() {
        let decoder = NumericTokenDecoder;
        assert_eq!(decoder.decode("/user", "login", "42"), Ok(42));
        assert!(decoder.decode("/user", "login", "").is_err());
        assert!(decoder.decode("/user", "login", "abc").is_err());
    }

    #[test]
    fn closures_see_pattern_and_operation() {
        let decoder = |pattern: &str, operation: &str, token: &str| -> Result<u64, TokenError> {
            if pattern == "/admin" && operation != "login" && token.is_empty() {
                Err(TokenError::new("admin operations need a token"))
            } else {
                Ok(7)
            }
        };
        assert_eq!(decoder.decode("/admin", "login", ""), Ok(7));
        assert!(decoder.decode("/admin", "purge", "").is_err());
    }
}
