//! Trading-pair symbols and the shared base-currency rule.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Shortest suffix accepted as a base currency.
const MIN_BASE_LEN: usize = 3;

/// Characters that must stay in front of the base on the shorter symbol.
const MIN_ASSET_LEN: usize = 2;

/// A trading-pair identifier such as `BTCUSDT`, conventionally `<asset><base>`.
///
/// Symbols are normalised to upper case on construction, so `btcusdt` and
/// `BTCUSDT` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Parses and normalises a raw symbol.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError(
                "Currency symbol cannot be empty".into(),
            ));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::ValidationError(format!(
                "Currency symbol must be alphanumeric, got '{}'",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the longest suffix this symbol shares with `other`.
    ///
    /// Candidates run from `min(len) - 2` characters down to 3, so the shorter
    /// symbol always keeps at least two characters of asset in front of the
    /// base. Identical symbols are not special-cased here; see
    /// [`Symbol::ensure_same_base`].
    pub fn shared_base<'a>(&'a self, other: &Symbol) -> Option<&'a str> {
        let longest = self.0.len().min(other.0.len()).saturating_sub(MIN_ASSET_LEN);
        (MIN_BASE_LEN..=longest)
            .rev()
            .map(|len| &self.0[self.0.len() - len..])
            .find(|suffix| other.0.ends_with(suffix))
    }

    /// Fails with [`DomainError::UnsupportedConversion`] unless both symbols
    /// quote against the same base currency.
    pub fn ensure_same_base(&self, other: &Symbol) -> Result<(), DomainError> {
        if self == other || self.shared_base(other).is_some() {
            return Ok(());
        }
        Err(DomainError::UnsupportedConversion {
            from: self.clone(),
            to: other.clone(),
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_normalises_case() {
        assert_eq!(sym("btcUsdt").as_str(), "BTCUSDT");
        assert_eq!(sym("  ethusdt ").as_str(), "ETHUSDT");
    }

    #[test]
    fn test_parse_rejects_empty_and_punctuation() {
        assert!(matches!(
            Symbol::parse("   "),
            Err(DomainError::ValidationError(_))
        ));
        assert!(matches!(
            Symbol::parse("BTC/USDT"),
            Err(DomainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_shared_base_prefers_longest_suffix() {
        assert_eq!(sym("BTCUSDT").shared_base(&sym("ETHUSDT")), Some("USDT"));
        assert_eq!(sym("XRPBUSD").shared_base(&sym("BNBBUSD")), Some("BUSD"));
        assert_eq!(sym("LTCBTC").shared_base(&sym("ETHBTC")), Some("BTC"));
    }

    #[test]
    fn test_shared_base_accepts_unlisted_bases() {
        assert_eq!(sym("AAAXYZW").shared_base(&sym("BBBXYZW")), Some("XYZW"));
    }

    #[test]
    fn test_supported_usdt_pairs() {
        let symbols = ["BTCUSDT", "ETHUSDT", "ADAUSDT", "BNBUSDT"];
        for from in symbols {
            for to in symbols {
                assert!(
                    sym(from).ensure_same_base(&sym(to)).is_ok(),
                    "{from} -> {to} should be supported"
                );
            }
        }
    }

    #[test]
    fn test_unsupported_cross_currency_pairs() {
        let pairs = [
            ("BTCUSDT", "LTCETH"),
            ("ETHUSDT", "DOGEBTC"),
            ("ADAUSDT", "XLMBNB"),
            ("BNBUSDT", "AVAXETH"),
            ("BTCETH", "ADAUSDT"),
            ("ETHBTC", "BNBUSDT"),
            ("RANDOM1", "RANDOM2"),
        ];
        for (from, to) in pairs {
            let err = sym(from).ensure_same_base(&sym(to)).unwrap_err();
            assert!(
                matches!(err, DomainError::UnsupportedConversion { .. }),
                "{from} -> {to} should be unsupported"
            );
            let message = err.to_string();
            assert!(message.contains(from) && message.contains(to));
        }
    }

    #[test]
    fn test_short_overlap_is_rejected() {
        // Only "DT" overlaps.
        assert!(sym("BTCUSDT").ensure_same_base(&sym("ETHXDT")).is_err());
        // "XUSDT" can only give up three characters, so "SDT" is the base.
        assert_eq!(sym("BTCUSDT").shared_base(&sym("XUSDT")), Some("SDT"));
        // A bare base leaves no asset in front of it.
        assert!(sym("BTCUSDT").ensure_same_base(&sym("USDT")).is_err());
    }

    #[test]
    fn test_same_symbol_always_passes() {
        assert!(sym("BTCUSDT").ensure_same_base(&sym("btcusdt")).is_ok());
        assert!(sym("AB").ensure_same_base(&sym("AB")).is_ok());
    }
}
