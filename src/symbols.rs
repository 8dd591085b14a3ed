//! Symbol list loading for the pair selector.

use std::path::Path;

use woox::{PairFilter, NO_PAIR_FILTER};

use crate::error::AppError;

/// Parse a newline-separated symbol list.
///
/// Blank lines and `#` comments are skipped, duplicates dropped, and the
/// `ALL` sentinel is always the first entry.
pub fn parse_symbols(text: &str) -> Vec<String> {
    let mut symbols = vec![NO_PAIR_FILTER.to_string()];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case(NO_PAIR_FILTER) {
            continue;
        }
        if !symbols.iter().any(|s| s == line) {
            symbols.push(line.to_string());
        }
    }
    symbols
}

pub fn load_symbols(path: &Path) -> Result<Vec<String>, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::SymbolFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_symbols(&text))
}

/// Check that a pair filter names a symbol from the list. `All` always passes.
pub fn validate_pair(filter: &PairFilter, symbols: &[String]) -> Result<(), AppError> {
    match filter {
        PairFilter::All => Ok(()),
        PairFilter::Pair(pair) if symbols.iter().any(|s| s == pair) => Ok(()),
        PairFilter::Pair(pair) => Err(AppError::UnknownPair(pair.clone())),
    }
}
