use crate::config::CoinConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HOURS_PER_DAY: f64 = 24.0;
const WATTS_PER_KILOWATT: f64 = 1000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitEstimate {
    pub target: String,
    pub daily_revenue: f64,
    pub daily_power_cost: f64,
    pub daily_profit: f64,
}

#[async_trait]
pub trait ProfitabilitySource: Send + Sync {
    async fn estimate(
        &self,
        target: &str,
        coins: &BTreeMap<String, CoinConfig>,
        electricity_cost: f64,
    ) -> Option<ProfitEstimate>;

    async fn best_target(
        &self,
        coins: &BTreeMap<String, CoinConfig>,
        electricity_cost: f64,
    ) -> Option<ProfitEstimate>;
}

/// Static estimates computed from the configured coin table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfitTable;

impl ProfitTable {
    pub fn compute(target: &str, coin: &CoinConfig, electricity_cost: f64) -> Option<ProfitEstimate> {
        let price = coin.price?;
        let daily_revenue = coin.expected_hashrate * coin.revenue_per_unit * price;
        let daily_power_cost = coin.power_watts * HOURS_PER_DAY / WATTS_PER_KILOWATT * electricity_cost;

        Some(ProfitEstimate {
            target: target.to_string(),
            daily_revenue,
            daily_power_cost,
            daily_profit: daily_revenue - daily_power_cost,
        })
    }

    pub fn rank(coins: &BTreeMap<String, CoinConfig>, electricity_cost: f64) -> Vec<ProfitEstimate> {
        let mut estimates: Vec<ProfitEstimate> = coins
            .iter()
            .filter_map(|(symbol, coin)| Self::compute(symbol, coin, electricity_cost))
            .collect();
        estimates.sort_by(|a, b| b.daily_profit.total_cmp(&a.daily_profit));
        estimates
    }
}

#[async_trait]
impl ProfitabilitySource for ProfitTable {
    async fn estimate(
        &self,
        target: &str,
        coins: &BTreeMap<String, CoinConfig>,
        electricity_cost: f64,
    ) -> Option<ProfitEstimate> {
        coins
            .get(target)
            .and_then(|coin| Self::compute(target, coin, electricity_cost))
    }

    async fn best_target(
        &self,
        coins: &BTreeMap<String, CoinConfig>,
        electricity_cost: f64,
    ) -> Option<ProfitEstimate> {
        Self::rank(coins, electricity_cost).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(hashrate: f64, watts: f64, revenue: f64, price: Option<f64>) -> CoinConfig {
        CoinConfig {
            algorithm: "kawpow".into(),
            pools: vec!["pool:1".into()],
            expected_hashrate: hashrate,
            power_watts: watts,
            revenue_per_unit: revenue,
            price,
            ..Default::default()
        }
    }

    #[test]
    fn test_daily_profit_formula() {
        let estimate = ProfitTable::compute("RVN", &coin(15.5, 90.0, 2.0, Some(0.03)), 0.12).expect("estimate");
        assert!((estimate.daily_revenue - 0.93).abs() < 1e-9);
        assert!((estimate.daily_power_cost - 0.2592).abs() < 1e-9);
        assert!((estimate.daily_profit - 0.6708).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_best_target_skips_unpriced_coins() {
        let mut coins = BTreeMap::new();
        coins.insert("RVN".to_string(), coin(15.5, 90.0, 2.0, Some(0.03)));
        coins.insert("ERG".to_string(), coin(90.0, 95.0, 0.01, Some(1.5)));
        coins.insert("ETC".to_string(), coin(28.0, 85.0, 1000.0, None));

        let best = ProfitTable.best_target(&coins, 0.12).await.expect("best");
        assert_eq!(best.target, "ERG");

        assert_eq!(ProfitTable.estimate("ETC", &coins, 0.12).await, None);
        assert_eq!(ProfitTable.estimate("DOGE", &coins, 0.12).await, None);
        assert_eq!(ProfitTable::rank(&coins, 0.12).len(), 2);
    }

    #[tokio::test]
    async fn test_no_priced_coins() {
        let mut coins = BTreeMap::new();
        coins.insert("RVN".to_string(), coin(15.5, 90.0, 2.0, None));
        assert_eq!(ProfitTable.best_target(&coins, 0.12).await, None);
    }
}
