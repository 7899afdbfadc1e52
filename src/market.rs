use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::flips::FeeModel;
use crate::loader::MarketCache;
use crate::metric::MetricKind;
use crate::model::{MarketRecord, MetadataIndex};
use crate::snapshot::ItemSnapshot;
use crate::worlds::WorldDirectory;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Builds every item snapshot of one world's market payload.
pub fn build_world_market(world: &str, records: &[MarketRecord], metadata: &MetadataIndex, fees: FeeModel) -> Vec<ItemSnapshot> {
    let snapshots: Vec<ItemSnapshot> = records
        .par_iter()
        .map(|record| ItemSnapshot::from_record(record, metadata.get(&record.id), world, fees))
        .collect();

    tracing::info!(world, items = snapshots.len(), "built world market");
    snapshots
}

/// Folds several worlds' markets into one snapshot per item. The first world
/// listed provides each item's own values.
pub fn merge_worlds(markets: Vec<Vec<ItemSnapshot>>, worlds: &WorldDirectory) -> Vec<ItemSnapshot> {
    let mut by_item: BTreeMap<u32, Vec<ItemSnapshot>> = BTreeMap::new();
    for market in markets {
        for snapshot in market {
            by_item.entry(snapshot.id).or_default().push(snapshot);
        }
    }

    let merged: Vec<ItemSnapshot> = by_item
        .into_values()
        .filter_map(|snapshots| ItemSnapshot::aggregate(snapshots, worlds))
        .collect();

    tracing::debug!(items = merged.len(), "merged world markets");
    merged
}

/// Builds and merges the cached markets of every configured world.
pub fn merged_market_from_cache(
    cache: &MarketCache,
    config: &AnalyzerConfig,
    metadata: &MetadataIndex,
    worlds: &WorldDirectory,
) -> Result<Vec<ItemSnapshot>> {
    let mut markets = Vec::with_capacity(config.worlds.len());
    for world in &config.worlds {
        let records = cache.load_market(world)?;
        if records.is_empty() {
            tracing::warn!(world = %world, "no cached market for world");
        }
        markets.push(build_world_market(world, &records, metadata, config.fees));
    }
    Ok(merge_worlds(markets, worlds))
}

/// Table filter. A maximum of zero means "no upper bound".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketFilter {
    pub name: String,
    pub min_buy_price: f64,
    pub max_buy_price: f64,
    pub min_flips: f64,
    pub max_flips: f64,
    pub min_traders: f64,
    pub max_traders: f64,
}

impl MarketFilter {
    pub fn matches(&self, snapshot: &ItemSnapshot) -> bool {
        if !self.name.is_empty() && !snapshot.name.to_lowercase().contains(&self.name.to_lowercase()) {
            return false;
        }

        let buy = snapshot.value(MetricKind::BuyPrice);
        if self.max_buy_price > 0.0 && buy > self.max_buy_price {
            return false;
        }
        if buy < self.min_buy_price {
            return false;
        }

        let flips = snapshot.value(MetricKind::MonthSold).min(snapshot.value(MetricKind::MonthBought));
        if flips < self.min_flips {
            return false;
        }
        if self.max_flips > 0.0 && flips > self.max_flips {
            return false;
        }

        let traders = snapshot.value(MetricKind::ActiveTraders);
        if self.max_traders > 0.0 && traders > self.max_traders {
            return false;
        }
        traders >= self.min_traders
    }

    pub fn apply(&self, snapshots: Vec<ItemSnapshot>) -> Vec<ItemSnapshot> {
        let before = snapshots.len();
        let kept: Vec<ItemSnapshot> = snapshots.into_iter().filter(|s| self.matches(s)).collect();
        tracing::debug!(before, after = kept.len(), "applied market filter");
        kept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sorts by a metric's own value; NaN sorts last in both directions.
pub fn sort_snapshots(snapshots: &mut [ItemSnapshot], by: MetricKind, order: SortOrder) {
    snapshots.sort_by(|a, b| {
        let (x, y) = (a.value(by), b.value(by));
        match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match order {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
        }
    });
}
