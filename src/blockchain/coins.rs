//! Coin selection for payment and gas.
//!
//! Each call fetches a fresh snapshot; nothing is cached or locked across
//! operations, so two concurrent requests may pick the same coin and the
//! chain decides which one wins.

use std::collections::HashSet;

use crate::blockchain::client::SuiClient;
use crate::blockchain::types::{ChainError, ChainResult, Coin};

/// Selects spendable coins of one currency owned by one address.
#[derive(Debug, Clone)]
pub struct CoinSelector {
    client: SuiClient,
    owner: String,
    coin_type: String,
    page_size: usize,
}

impl CoinSelector {
    pub fn new(client: SuiClient, owner: impl Into<String>, coin_type: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            owner: owner.into(),
            coin_type: coin_type.into(),
            page_size: page_size.max(1),
        }
    }

    /// Full coin listing, all pages.
    pub async fn all_coins(&self) -> ChainResult<Vec<Coin>> {
        self.client
            .get_all_coins(&self.owner, &self.coin_type, self.page_size)
            .await
    }

    /// First coin whose id is not in `excluding`.
    pub async fn select_gas_coin(&self, excluding: &HashSet<String>) -> ChainResult<String> {
        let coins = self.all_coins().await?;
        pick_gas_coin(&coins, excluding)
    }

    /// `count` distinct coins, each holding at least `min_amount` on its own.
    pub async fn select_payment_coins(&self, min_amount: u64, count: usize) -> ChainResult<Vec<String>> {
        let coins = self.all_coins().await?;
        pick_payment_coins(&coins, min_amount, count)
    }
}

fn pick_gas_coin(coins: &[Coin], excluding: &HashSet<String>) -> ChainResult<String> {
    coins
        .iter()
        .find(|c| !excluding.contains(&c.object_id))
        .map(|c| c.object_id.clone())
        .ok_or(ChainError::NoGasCoinAvailable)
}

fn pick_payment_coins(coins: &[Coin], min_amount: u64, count: usize) -> ChainResult<Vec<String>> {
    let mut selected: Vec<String> = Vec::with_capacity(count);
    for coin in coins {
        if selected.len() >= count {
            break;
        }
        if coin.balance >= min_amount && !selected.contains(&coin.object_id) {
            selected.push(coin.object_id.clone());
        }
    }

    if selected.len() < count {
        return Err(ChainError::InsufficientCoins {
            needed: count,
            found: selected.len(),
            min_balance: min_amount,
        });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, balance: u64) -> Coin {
        Coin {
            object_id: id.to_string(),
            balance,
            coin_type: "0x2::sui::SUI".to_string(),
        }
    }

    fn excluding(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_gas_coin_skips_excluded() {
        let coins = vec![coin("0xc1", 500), coin("0xc2", 300), coin("0xc3", 200)];
        let gas = pick_gas_coin(&coins, &excluding(&["0xc1", "0xc2"])).unwrap();
        assert_eq!(gas, "0xc3");
    }

    #[test]
    fn test_gas_coin_all_excluded() {
        let coins = vec![coin("0xc1", 500), coin("0xc2", 300)];
        let err = pick_gas_coin(&coins, &excluding(&["0xc1", "0xc2"])).unwrap_err();
        assert_eq!(err, ChainError::NoGasCoinAvailable);
    }

    #[test]
    fn test_payment_coins_require_individual_balance() {
        // 250 total across two small coins does not cover 200 per coin.
        let coins = vec![coin("0xa", 150), coin("0xb", 100), coin("0xc", 200), coin("0xd", 900)];
        let picked = pick_payment_coins(&coins, 200, 2).unwrap();
        assert_eq!(picked, vec!["0xc".to_string(), "0xd".to_string()]);
    }

    #[test]
    fn test_payment_coins_insufficient() {
        let coins = vec![coin("0xa", 150), coin("0xb", 300)];
        let err = pick_payment_coins(&coins, 200, 2).unwrap_err();
        assert_eq!(
            err,
            ChainError::InsufficientCoins {
                needed: 2,
                found: 1,
                min_balance: 200
            }
        );
    }

    #[test]
    fn test_payment_coins_never_duplicate() {
        let coins = vec![coin("0xa", 500), coin("0xa", 500), coin("0xb", 500)];
        let picked = pick_payment_coins(&coins, 100, 2).unwrap();
        assert_eq!(picked, vec!["0xa".to_string(), "0xb".to_string()]);
    }
}
