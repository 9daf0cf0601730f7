use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest ticker accepted (exchange suffix included, e.g. `PETR4.SA`).
pub const MAX_SYMBOL_LEN: usize = 20;

/// Rejected symbol input. Raised before any network or storage activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol is empty")]
    Empty,

    #[error("symbol '{0}' is longer than {MAX_SYMBOL_LEN} characters")]
    TooLong(String),

    #[error("symbol '{symbol}' contains invalid character '{ch}'")]
    InvalidChar { symbol: String, ch: char },
}

/// Validated, uppercase instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim, uppercase and validate a raw ticker.
    ///
    /// Accepted characters: `A-Z`, `0-9`, `.`, `-`, `^`, `=` (covers exchange
    /// suffixes, index tickers like `^BVSP` and FX pairs like `BRL=X`).
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let upper = raw.trim().to_uppercase();
        if upper.is_empty() {
            return Err(SymbolError::Empty);
        }
        if upper.chars().count() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong(upper));
        }
        if let Some(ch) = upper
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || ".-^=".contains(*c)))
        {
            return Err(SymbolError::InvalidChar { symbol: upper, ch });
        }
        Ok(Self(upper))
    }

    /// Validate a whole list, failing on the first bad entry.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>, SymbolError> {
        raw.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        let sym = Symbol::parse("  petr4.sa ").unwrap();
        assert_eq!(sym.as_str(), "PETR4.SA");
    }

    #[test]
    fn accepts_index_and_fx_tickers() {
        assert!(Symbol::parse("^BVSP").is_ok());
        assert!(Symbol::parse("BRL=X").is_ok());
        assert!(Symbol::parse("BRK-B").is_ok());
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(Symbol::parse(""), Err(SymbolError::Empty));
        assert_eq!(Symbol::parse("   "), Err(SymbolError::Empty));
    }

    #[test]
    fn rejects_bad_characters() {
        let err = Symbol::parse("AA PL").unwrap_err();
        assert_eq!(
            err,
            SymbolError::InvalidChar {
                symbol: "AA PL".into(),
                ch: ' '
            }
        );
        assert!(Symbol::parse("AAPL;DROP").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "A".repeat(MAX_SYMBOL_LEN + 1);
        assert!(matches!(Symbol::parse(&long), Err(SymbolError::TooLong(_))));
    }

    #[test]
    fn parse_all_stops_at_first_error() {
        let err = Symbol::parse_all(&["AAPL", "", "MSFT"]).unwrap_err();
        assert_eq!(err, SymbolError::Empty);
    }

    #[test]
    fn serde_round_trip_validates() {
        let json = serde_json::to_string(&Symbol::parse("msft").unwrap()).unwrap();
        assert_eq!(json, "\"MSFT\"");
        assert!(serde_json::from_str::<Symbol>("\"bad symbol\"").is_err());
    }
}
