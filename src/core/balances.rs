//! Session cache of carried balances, keyed by (campaign, promotion).
//!
//! Each pair owns a `OnceCell`: the first caller runs the lookup, concurrent callers for
//! the same pair wait for that lookup instead of starting their own. A failed lookup
//! leaves the cell empty, so the next caller retries.

use crate::{
    api::PromotionsApi,
    entities::{PromotionKey, balance::balance_for},
    errors::Result,
};
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

#[derive(Debug, Default)]
pub struct BalanceCache {
    cells: Mutex<HashMap<PromotionKey, Arc<OnceCell<Decimal>>>>,
}

impl BalanceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the client's carried balance for `key`, looking it up at most once.
    ///
    /// # Errors
    /// Propagates the collaborator's `LookupFailure`; a pair missing from a successful
    /// response is a zero balance, not an error.
    pub async fn get_or_fetch<A>(&self, api: &A, cliente_id: i64, key: PromotionKey) -> Result<Decimal>
    where
        A: PromotionsApi + ?Sized,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key).or_default())
        };

        if let Some(saldo) = cell.get() {
            debug!("Balance cache hit for {:?}: {}", key, saldo);
            return Ok(*saldo);
        }

        let saldo = cell
            .get_or_try_init(|| async {
                let balances = api.client_balances(cliente_id).await?;
                let saldo = balance_for(&balances, key);
                debug!("Fetched balance for {:?}: {}", key, saldo);
                Ok::<_, crate::errors::Error>(saldo)
            })
            .await?;
        Ok(*saldo)
    }

    /// Forgets every cached balance.
    pub async fn invalidate(&self) {
        self.cells.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::FakeApi;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lookup_happens_once_per_pair() {
        let api = FakeApi::new().with_balance(1, 2, dec!(8));
        let cache = BalanceCache::new();
        let key = PromotionKey::new(1, 2);

        assert_eq!(cache.get_or_fetch(&api, 5, key).await.unwrap(), dec!(8));
        assert_eq!(cache.get_or_fetch(&api, 5, key).await.unwrap(), dec!(8));
        assert_eq!(api.balance_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_lookups_share_one_request() {
        let api = FakeApi::new()
            .with_balance(1, 2, dec!(4.50))
            .with_balance_delay(Duration::from_millis(200));
        let cache = BalanceCache::new();
        let key = PromotionKey::new(1, 2);

        let (first, second) = tokio::join!(
            cache.get_or_fetch(&api, 5, key),
            cache.get_or_fetch(&api, 5, key)
        );
        assert_eq!(first.unwrap(), dec!(4.50));
        assert_eq!(second.unwrap(), dec!(4.50));
        assert_eq!(api.balance_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_pair_is_zero() {
        let api = FakeApi::new().with_balance(1, 2, dec!(8));
        let cache = BalanceCache::new();
        let saldo = cache.get_or_fetch(&api, 5, PromotionKey::new(3, 4)).await.unwrap();
        assert_eq!(saldo, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_retried() {
        let api = FakeApi::new().with_balance(1, 2, dec!(8));
        api.fail_balances(true);
        let cache = BalanceCache::new();
        let key = PromotionKey::new(1, 2);

        let result = cache.get_or_fetch(&api, 5, key).await;
        assert!(matches!(result, Err(Error::LookupFailure { .. })));

        api.fail_balances(false);
        assert_eq!(cache.get_or_fetch(&api, 5, key).await.unwrap(), dec!(8));
        assert_eq!(api.balance_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_lookup() {
        let api = FakeApi::new().with_balance(1, 2, dec!(8));
        let cache = BalanceCache::new();
        let key = PromotionKey::new(1, 2);

        cache.get_or_fetch(&api, 5, key).await.unwrap();
        cache.invalidate().await;
        cache.get_or_fetch(&api, 5, key).await.unwrap();
        assert_eq!(api.balance_calls(), 2);
    }
}
