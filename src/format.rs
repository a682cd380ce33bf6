// src/format.rs
use ethers::types::{Address, H256, U256};
use ethers::utils::format_ether;

/// Decimal places shown for account balances.
pub const BALANCE_DECIMALS: usize = 4;
/// Decimal places shown for gas deposited in the entry point.
pub const DEPOSIT_DECIMALS: usize = 5;

/// Formats a wei amount in ether, rounded to `decimals` places.
pub fn format_ether_fixed(value: U256, decimals: usize) -> String {
    let ether = format_ether(value);
    match ether.parse::<f64>() {
        Ok(amount) => format!("{amount:.decimals$}"),
        Err(_) => ether,
    }
}

/// Like [`format_ether_fixed`], but renders a missing value as `-`.
pub fn display_amount(value: Option<U256>, decimals: usize) -> String {
    value
        .map(|v| format_ether_fixed(v, decimals))
        .unwrap_or_else(|| "-".to_string())
}

/// Keeps the first `keep_left` and last `keep_right` characters of `text`,
/// joined by `...`. Text shorter than both ends together is returned as is.
pub fn shorten(text: &str, keep_left: usize, keep_right: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < keep_left + keep_right {
        return text.to_string();
    }

    let left: String = chars[..keep_left].iter().collect();
    let right: String = chars[chars.len() - keep_right..].iter().collect();
    format!("{left}...{right}")
}

/// Block explorer link builder.
#[derive(Debug, Clone)]
pub struct Explorer {
    base_url: String,
}

impl Explorer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn address(&self, address: Address) -> String {
        format!("{}/address/{:?}", self.base_url, address)
    }

    pub fn tx(&self, hash: H256) -> String {
        format!("{}/tx/{:?}", self.base_url, hash)
    }

    pub fn token_transfers(&self, address: Address) -> String {
        format!("{}#tokentxns", self.address(address))
    }

    pub fn internal_transfers(&self, address: Address) -> String {
        format!("{}#internaltx", self.address(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ether_with_fixed_decimals() {
        let value = U256::from(1_234_567_000_000_000_000u64);

        assert_eq!(format_ether_fixed(value, BALANCE_DECIMALS), "1.2346");
        assert_eq!(format_ether_fixed(U256::exp10(16), DEPOSIT_DECIMALS), "0.01000");
        assert_eq!(format_ether_fixed(U256::zero(), BALANCE_DECIMALS), "0.0000");
    }

    #[test]
    fn missing_amount_is_dash() {
        assert_eq!(display_amount(None, BALANCE_DECIMALS), "-");
    }

    #[test]
    fn shortens_long_hashes() {
        let hash = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

        assert_eq!(shorten(hash, 6, 6), "0x5FF1...2d2789");
        assert_eq!(shorten("0xabcd", 6, 6), "0xabcd");
    }

    #[test]
    fn shorten_keeps_text_of_exact_length() {
        assert_eq!(shorten("abcdef", 3, 3), "abc...def");
    }

    #[test]
    fn explorer_links() {
        let explorer = Explorer::new("https://goerli.etherscan.io/");
        let address = Address::repeat_byte(0xab);

        assert_eq!(
            explorer.address(address),
            "https://goerli.etherscan.io/address/0xabababababababababababababababababababab"
        );
        assert!(explorer.token_transfers(address).ends_with("#tokentxns"));
        assert!(explorer.internal_transfers(address).ends_with("#internaltx"));
        assert!(explorer
            .tx(H256::zero())
            .starts_with("https://goerli.etherscan.io/tx/0x0000"));
    }
}
