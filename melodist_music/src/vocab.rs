// Symbol vocabulary: the bijection between symbols and dense integer ids.
//
// Built once from the assembled corpus and immutable afterwards. Ids are
// assigned in the canonical symbol order (see `Symbol`'s `Ord`: pitches
// ascending, then "/", "_", "r"), so rebuilding over the same corpus always
// yields the same table. The delimiter and hold marker are always present,
// since generation relies on the delimiter id and every melody longer than
// its events needs holds.
//
// Both directions are stored: `ids` maps symbol -> id and `symbols[id]` maps
// back, so neither lookup scans.
//
// Persisted as a pretty-printed JSON object of token -> id. A loaded table
// keeps whatever (bijective) ids the file assigns, since a predictor trained
// against that file depends on them.

use crate::error::VocabularyError;
use crate::symbol::Symbol;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    symbols: Vec<Symbol>,
    ids: BTreeMap<Symbol, usize>,
    delimiter_id: usize,
}

impl Vocabulary {
    /// Build from every symbol of a corpus stream. Duplicates are collapsed
    /// and ids are assigned in canonical order.
    pub fn from_symbols<'a>(stream: impl IntoIterator<Item = &'a Symbol>) -> Self {
        let mut distinct: BTreeSet<Symbol> = stream.into_iter().copied().collect();
        distinct.insert(Symbol::Delimiter);
        distinct.insert(Symbol::Hold);

        let symbols: Vec<Symbol> = distinct.into_iter().collect();
        let ids: BTreeMap<Symbol, usize> =
            symbols.iter().enumerate().map(|(id, &s)| (s, id)).collect();
        let delimiter_id = ids[&Symbol::Delimiter];
        Vocabulary {
            symbols,
            ids,
            delimiter_id,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in id order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn delimiter_id(&self) -> usize {
        self.delimiter_id
    }

    pub fn id_of(&self, symbol: Symbol) -> Result<usize, VocabularyError> {
        self.ids
            .get(&symbol)
            .copied()
            .ok_or(VocabularyError::UnknownSymbol(symbol))
    }

    pub fn symbol_of(&self, id: usize) -> Result<Symbol, VocabularyError> {
        self.symbols
            .get(id)
            .copied()
            .ok_or(VocabularyError::InvalidId {
                id,
                len: self.symbols.len(),
            })
    }

    pub fn encode(&self, symbols: &[Symbol]) -> Result<Vec<usize>, VocabularyError> {
        symbols.iter().map(|&s| self.id_of(s)).collect()
    }

    pub fn decode(&self, ids: &[usize]) -> Result<Vec<Symbol>, VocabularyError> {
        ids.iter().map(|&id| self.symbol_of(id)).collect()
    }

    /// Token -> id table, as persisted.
    pub fn to_mapping(&self) -> BTreeMap<String, usize> {
        self.ids.iter().map(|(s, &id)| (s.to_string(), id)).collect()
    }

    /// Rebuild from a token -> id table. Ids must cover `[0, N)` exactly once
    /// and both the delimiter and the hold marker must be present.
    pub fn from_mapping(mapping: &BTreeMap<String, usize>) -> Result<Self, VocabularyError> {
        let len = mapping.len();
        let mut slots: Vec<Option<Symbol>> = vec![None; len];
        let mut ids = BTreeMap::new();

        for (token, &id) in mapping {
            let symbol: Symbol = token
                .parse()
                .map_err(|_| VocabularyError::Malformed(format!("unknown token '{token}'")))?;
            let slot = slots.get_mut(id).ok_or_else(|| {
                VocabularyError::Malformed(format!("id {id} for '{token}' is outside 0..{len}"))
            })?;
            if slot.is_some() {
                return Err(VocabularyError::Malformed(format!("id {id} assigned twice")));
            }
            if ids.insert(symbol, id).is_some() {
                return Err(VocabularyError::Malformed(format!(
                    "symbol '{symbol}' listed twice"
                )));
            }
            *slot = Some(symbol);
        }

        // Every slot is filled: N distinct in-range ids over N entries.
        let symbols: Vec<Symbol> = slots.into_iter().flatten().collect();
        if !ids.contains_key(&Symbol::Hold) {
            return Err(VocabularyError::Malformed("missing hold marker '_'".to_string()));
        }
        let delimiter_id = ids
            .get(&Symbol::Delimiter)
            .copied()
            .ok_or_else(|| VocabularyError::Malformed("missing delimiter '/'".to_string()))?;
        Ok(Vocabulary {
            symbols,
            ids,
            delimiter_id,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), VocabularyError> {
        let json = serde_json::to_string_pretty(&self.to_mapping())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let data = std::fs::read_to_string(path)?;
        let mapping: BTreeMap<String, usize> = serde_json::from_str(&data)?;
        Self::from_mapping(&mapping)
    }
}
