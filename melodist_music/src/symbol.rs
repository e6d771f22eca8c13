// Time-series symbols.
//
// An encoded melody is a flat stream of symbols, one per time-step slot:
// a MIDI pitch number starts a note, "r" starts a rest, "_" holds the
// previous event for one more slot, and "/" marks a song boundary.
//
// On disk, symbols are always separated by single spaces. Concatenating
// them without a separator is ambiguous ("6_0" vs "60"), so the textual
// form is whitespace-separated everywhere: per-song files, the assembled
// corpus, vocabulary keys, and generation seeds.

use crate::error::DecodeError;
use std::fmt;
use std::str::FromStr;

pub const REST_TOKEN: &str = "r";
pub const HOLD_TOKEN: &str = "_";
pub const DELIMITER_TOKEN: &str = "/";

/// One slot of the time series.
///
/// The derived `Ord` is the vocabulary's canonical order: pitches ascending
/// by MIDI value, then the named markers by their token text
/// (`"/"` < `"_"` < `"r"`). Variant order must stay in sync with that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Pitch(u8),
    Delimiter,
    Hold,
    Rest,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Pitch(p) => write!(f, "{p}"),
            Symbol::Delimiter => f.write_str(DELIMITER_TOKEN),
            Symbol::Hold => f.write_str(HOLD_TOKEN),
            Symbol::Rest => f.write_str(REST_TOKEN),
        }
    }
}

impl FromStr for Symbol {
    type Err = DecodeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            REST_TOKEN => Ok(Symbol::Rest),
            HOLD_TOKEN => Ok(Symbol::Hold),
            DELIMITER_TOKEN => Ok(Symbol::Delimiter),
            _ => token
                .parse::<u8>()
                .ok()
                .filter(|&p| p <= 127 && !token.starts_with('+'))
                .map(Symbol::Pitch)
                .ok_or_else(|| DecodeError::UnrecognizedToken(token.to_string())),
        }
    }
}

/// Parse a whitespace-separated symbol stream.
pub fn parse_symbols(text: &str) -> Result<Vec<Symbol>, DecodeError> {
    text.split_whitespace().map(str::parse).collect()
}

/// Render symbols in the canonical space-joined form.
pub fn join_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!("60".parse::<Symbol>(), Ok(Symbol::Pitch(60)));
        assert_eq!("r".parse::<Symbol>(), Ok(Symbol::Rest));
        assert_eq!("_".parse::<Symbol>(), Ok(Symbol::Hold));
        assert_eq!("/".parse::<Symbol>(), Ok(Symbol::Delimiter));
        assert!("128".parse::<Symbol>().is_err());
        assert!("+60".parse::<Symbol>().is_err());
        assert!("x".parse::<Symbol>().is_err());
        assert!("-1".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_canonical_order() {
        let mut symbols = vec![
            Symbol::Rest,
            Symbol::Hold,
            Symbol::Pitch(72),
            Symbol::Delimiter,
            Symbol::Pitch(55),
        ];
        symbols.sort();
        assert_eq!(join_symbols(&symbols), "55 72 / _ r");
    }

    #[test]
    fn test_parse_join() {
        let text = "60 _ _ _ r _";
        let symbols = parse_symbols(text).unwrap();
        assert_eq!(symbols.len(), 6);
        assert_eq!(join_symbols(&symbols), text);
        assert_eq!(
            parse_symbols("60 x"),
            Err(DecodeError::UnrecognizedToken("x".to_string()))
        );
    }
}
