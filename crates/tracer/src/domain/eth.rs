pub use alloy_primitives::{Address, B256, U256};

/// Decimals of the chain's native asset (1 ETH = 10^18 wei).
pub const NATIVE_DECIMALS: u32 = 18;

/// Display symbol attached to native-asset edges.
pub const NATIVE_SYMBOL: &str = "ETH";

/// The asset class a transfer is denominated in.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Native,
    Token,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "NATIVE",
            Self::Token => "TOKEN",
        }
    }
}

/// Canonical lowercase `0x…` rendering. `Display` for [`Address`] is EIP-55
/// checksummed, which is the wrong form for provider queries and reports.
pub fn lowercase(address: &Address) -> String {
    format!("0x{}", alloy_primitives::hex::encode(address))
}
