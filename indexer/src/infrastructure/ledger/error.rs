use std::error::Error;
use std::fmt;

/// Represents errors that can occur while talking to the ledger node
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Transport failure or an error object returned by the node
    NetworkError(String),
    /// Response did not have the expected shape
    ParseError(String),
    /// The node has no block at the requested height
    BlockNotFound(i64),
}

impl LedgerError {
    /// Whether asking again later may succeed. A node that is unreachable or
    /// still catching up is transient; a malformed response is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::NetworkError(_) | LedgerError::BlockNotFound(_))
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::NetworkError(msg) => write!(f, "Ledger network error: {}", msg),
            LedgerError::ParseError(msg) => write!(f, "Ledger response parse error: {}", msg),
            LedgerError::BlockNotFound(height) => write!(f, "Block {} not found", height),
        }
    }
}

impl Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(LedgerError::NetworkError("timeout".to_string()).is_transient());
        assert!(LedgerError::BlockNotFound(7).is_transient());
        assert!(!LedgerError::ParseError("missing field".to_string()).is_transient());
    }
}
