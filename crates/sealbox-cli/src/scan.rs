//! Hex strings in mail text that look like wallet addresses or hashes.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static ETH_ADDRESS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b0x[a-fA-F0-9]{40}\b").ok());
static LONG_HEX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{48,128}\b").ok());

/// Distinct matches in lexicographic order.
pub fn find_crypto_tokens(text: &str) -> Vec<String> {
    let mut found = BTreeSet::new();
    for pattern in [&ETH_ADDRESS, &LONG_HEX] {
        if let Some(re) = pattern.as_ref() {
            found.extend(re.find_iter(text).map(|m| m.as_str().to_string()));
        }
    }
    found.into_iter().collect()
}
