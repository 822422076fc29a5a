//! In-memory chain data source backed by pre-baked transfer lists. The
//! offline counterpart of [`super::Etherscan`], used by tests and demos.

use {
    super::{
        ChainDataFetching, Closest, NativeTransfer, Result, Sort, TokenMeta, TokenTransfer,
    },
    crate::domain::eth::Address,
    async_trait::async_trait,
    futures::{StreamExt, stream, stream::BoxStream},
    std::{collections::HashMap, ops::RangeInclusive},
};

#[derive(Clone, Debug, Default)]
pub struct FakeChainData {
    native: Vec<NativeTransfer>,
    token: Vec<TokenTransfer>,
    token_meta: HashMap<Address, TokenMeta>,
    contracts: HashMap<Address, bool>,
    blocks_by_time: HashMap<i64, u64>,
}

impl FakeChainData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_transfers(mut self, transfers: Vec<NativeTransfer>) -> Self {
        self.native = transfers;
        self
    }

    pub fn with_token_transfers(mut self, transfers: Vec<TokenTransfer>) -> Self {
        self.token = transfers;
        self
    }

    pub fn with_token_meta(mut self, meta: HashMap<Address, TokenMeta>) -> Self {
        self.token_meta = meta;
        self
    }

    pub fn with_contracts(mut self, contracts: HashMap<Address, bool>) -> Self {
        self.contracts = contracts;
        self
    }

    pub fn with_blocks_by_time(mut self, blocks: HashMap<i64, u64>) -> Self {
        self.blocks_by_time = blocks;
        self
    }
}

fn sorted<T>(mut items: Vec<T>, sort: Sort, key: impl Fn(&T) -> (u64, i64)) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    if sort == Sort::Descending {
        items.reverse();
    }
    items
}

#[async_trait]
impl ChainDataFetching for FakeChainData {
    async fn block_at_time(&self, timestamp: i64, _closest: Closest) -> Result<u64> {
        Ok(self.blocks_by_time.get(&timestamp).copied().unwrap_or(0))
    }

    fn native_transfers(
        &self,
        address: Address,
        blocks: RangeInclusive<u64>,
        sort: Sort,
    ) -> BoxStream<'_, Result<NativeTransfer>> {
        let items: Vec<_> = self
            .native
            .iter()
            .filter(|transfer| {
                blocks.contains(&transfer.block_number)
                    && (transfer.from == address || transfer.to == address)
            })
            .cloned()
            .collect();
        let items = sorted(items, sort, |transfer| {
            (transfer.block_number, transfer.timestamp)
        });
        stream::iter(items.into_iter().map(Ok)).boxed()
    }

    fn token_transfers(
        &self,
        address: Address,
        blocks: RangeInclusive<u64>,
        sort: Sort,
        token_address: Option<Address>,
    ) -> BoxStream<'_, Result<TokenTransfer>> {
        let items: Vec<_> = self
            .token
            .iter()
            .filter(|transfer| {
                blocks.contains(&transfer.block_number)
                    && (transfer.from == address || transfer.to == address)
                    && token_address.is_none_or(|token| transfer.token_address == token)
            })
            .cloned()
            .collect();
        let items = sorted(items, sort, |transfer| {
            (transfer.block_number, transfer.timestamp)
        });
        stream::iter(items.into_iter().map(Ok)).boxed()
    }

    async fn is_contract(&self, address: Address) -> Result<bool> {
        Ok(self.contracts.get(&address).copied().unwrap_or(false))
    }

    async fn token_meta(&self, token_address: Address) -> TokenMeta {
        self.token_meta
            .get(&token_address)
            .cloned()
            .unwrap_or(TokenMeta {
                token_address,
                ..Default::default()
            })
    }
}
