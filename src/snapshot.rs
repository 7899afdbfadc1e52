use crate::flips::{npc_immediate_profit, npc_profit, transfer_route, FeeModel, TransferQuote, TransferRoute};
use crate::metric::{MetricKind, MetricValue, SiblingGroup, TrendMetricValue};
use crate::model::{ItemMetadata, MarketRecord};
use crate::worlds::WorldDirectory;
use serde::Serialize;
use std::collections::BTreeMap;

/// One item's market state on one world, plus whatever other worlds have been
/// folded into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSnapshot {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub world: String,
    pub time: i64,
    fees: FeeModel,
    metrics: BTreeMap<MetricKind, SiblingGroup>,
    quotes: Vec<TransferQuote>,
    best_average_route: Option<TransferRoute>,
    best_potential_route: Option<TransferRoute>,
}

impl ItemSnapshot {
    pub fn from_record(record: &MarketRecord, meta: Option<&ItemMetadata>, world: &str, fees: FeeModel) -> Self {
        use MetricKind::*;

        let mut values: Vec<MetricValue> = [
            (SellPrice, record.sell_offer),
            (BuyPrice, record.buy_offer),
            (MonthAverageSell, record.month_average_sell),
            (MonthAverageBuy, record.month_average_buy),
            (DayAverageSell, record.day_average_sell),
            (DayAverageBuy, record.day_average_buy),
            (MonthHighestSell, record.month_highest_sell),
            (MonthLowestSell, record.month_lowest_sell),
            (MonthHighestBuy, record.month_highest_buy),
            (MonthLowestBuy, record.month_lowest_buy),
            (DayHighestSell, record.day_highest_sell),
            (DayLowestSell, record.day_lowest_sell),
            (DayHighestBuy, record.day_highest_buy),
            (DayLowestBuy, record.day_lowest_buy),
            (MonthSold, record.month_sold),
            (MonthBought, record.month_bought),
            (DaySold, record.day_sold),
            (DayBought, record.day_bought),
            (SellOffers, record.sell_offers),
            (BuyOffers, record.buy_offers),
            (ActiveTraders, record.active_traders),
        ]
        .into_iter()
        .map(|(kind, value)| MetricValue::new(kind, value, world))
        .collect();

        values.push(delta(DeltaSellPrice, record.sell_offer, record.month_average_sell, world));
        values.push(delta(DeltaBuyPrice, record.buy_offer, record.month_average_buy, world));

        let prices_known = record.sell_offer > 0.0 && record.buy_offer > 0.0;
        let averages_known = record.month_average_sell > 0.0 && record.month_average_buy > 0.0;
        let volume_known = record.month_sold >= 0.0 && record.month_bought >= 0.0;

        let profit = fees.flip_profit(record.sell_offer, record.buy_offer);
        let average_profit = fees.flip_profit(record.month_average_sell, record.month_average_buy);
        let potential_profit = fees.potential_profit(average_profit, record.month_sold, record.month_bought);
        values.push(
            derived_value(Profit, profit, prices_known, world).with_info(format!(
                "Minus {}% fee on both offers, at most {} each.",
                fees.rate * 100.0,
                fees.cap
            )),
        );
        values.push(derived_value(AverageProfit, average_profit, averages_known, world));
        values.push(derived_value(PotentialProfit, potential_profit, averages_known && volume_known, world));

        let empty = ItemMetadata::default();
        let meta_or_empty = meta.unwrap_or(&empty);

        let npc = match npc_profit(&fees, record.sell_offer, record.buy_offer, meta_or_empty) {
            Some(deal) => MetricValue::new(NpcProfit, deal.profit, world).with_info(deal.describe(false)),
            None => MetricValue::unavailable(NpcProfit, 0.0, world),
        };
        values.push(npc);

        let immediate = match npc_immediate_profit(record.sell_offer, record.buy_offer, meta_or_empty) {
            Some(deal) if deal.profit > 0.0 => {
                MetricValue::new(NpcImmediateProfit, deal.profit, world).with_info(deal.describe(true))
            }
            Some(deal) => MetricValue::new(NpcImmediateProfit, deal.profit, world),
            None => MetricValue::unavailable(NpcImmediateProfit, 0.0, world),
        };
        values.push(immediate);

        values.push(MetricValue::new(TransferAverageProfit, 0.0, world));
        values.push(MetricValue::new(TransferPotentialProfit, 0.0, world));

        let metrics = values.into_iter().map(|v| (v.kind, SiblingGroup::new(v))).collect();

        ItemSnapshot {
            id: record.id,
            name: meta.map(|m| m.display_name().to_string()).unwrap_or_else(|| record.id.to_string()),
            category: meta.map(|m| m.category.clone()).unwrap_or_default(),
            world: world.to_string(),
            time: record.time,
            fees,
            metrics,
            quotes: vec![TransferQuote {
                world: world.to_string(),
                month_average_sell: record.month_average_sell,
                month_average_buy: record.month_average_buy,
                month_sold: record.month_sold,
                month_bought: record.month_bought,
            }],
            best_average_route: None,
            best_potential_route: None,
        }
    }

    pub fn metric(&self, kind: MetricKind) -> &SiblingGroup {
        &self.metrics[&kind]
    }

    /// This snapshot's own value for `kind`, ignoring siblings.
    pub fn value(&self, kind: MetricKind) -> f64 {
        self.metric(kind).own().value
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&MetricKind, &SiblingGroup)> {
        self.metrics.iter()
    }

    /// Worlds folded into this snapshot, own world first.
    pub fn worlds(&self) -> impl Iterator<Item = &str> {
        self.quotes.iter().map(|q| q.world.as_str())
    }

    pub fn best_average_route(&self) -> Option<&TransferRoute> {
        self.best_average_route.as_ref()
    }

    pub fn best_potential_route(&self) -> Option<&TransferRoute> {
        self.best_potential_route.as_ref()
    }

    /// Compares this snapshot's value against an earlier snapshot of the same item.
    pub fn trend_against(&self, previous: &ItemSnapshot, kind: MetricKind) -> TrendMetricValue {
        TrendMetricValue::new(self.metric(kind).own().clone(), previous.value(kind))
    }

    /// Folds another world's snapshot of the same item into this one.
    ///
    /// Every per-world metric gains the other snapshot's values as siblings.
    /// Transfer metrics are not merged; they are re-evaluated over each route
    /// between a world already known here and a world brought in by `other`.
    pub fn add_sibling(&mut self, other: &ItemSnapshot, worlds: &WorldDirectory) {
        if other.id != self.id {
            tracing::warn!(item = self.id, other = other.id, "refusing to merge snapshots of different items");
            return;
        }

        for (kind, group) in self.metrics.iter_mut() {
            if kind.is_transfer_derived() {
                continue;
            }
            for member in other.metric(*kind).members() {
                group.add_sibling(member.clone());
            }
        }

        if let Some(route) = &other.best_average_route {
            self.offer_route(route.clone());
        }
        if let Some(route) = &other.best_potential_route {
            self.offer_route(route.clone());
        }

        let mut candidates = Vec::new();
        for known in &self.quotes {
            for incoming in &other.quotes {
                if worlds.can_transfer_worlds(&known.world, &incoming.world) {
                    candidates.push(transfer_route(&self.fees, known, incoming));
                }
                if worlds.can_transfer_worlds(&incoming.world, &known.world) {
                    candidates.push(transfer_route(&self.fees, incoming, known));
                }
            }
        }
        for route in candidates {
            self.offer_route(route);
        }

        self.quotes.extend(other.quotes.iter().cloned());
    }

    /// Merge step of the fold: `self` with `other` folded in.
    pub fn merged(mut self, other: &ItemSnapshot, worlds: &WorldDirectory) -> Self {
        self.add_sibling(other, worlds);
        self
    }

    /// Folds several worlds' snapshots of one item into a single view.
    pub fn aggregate<I>(snapshots: I, worlds: &WorldDirectory) -> Option<ItemSnapshot>
    where
        I: IntoIterator<Item = ItemSnapshot>,
    {
        snapshots.into_iter().reduce(|acc, next| acc.merged(&next, worlds))
    }

    fn offer_route(&mut self, route: TransferRoute) {
        if route.average_profit > self.value(MetricKind::TransferAverageProfit) {
            let value = MetricValue::new(MetricKind::TransferAverageProfit, route.average_profit, &self.world)
                .with_info(route.describe());
            self.replace_transfer(value);
            self.best_average_route = Some(route.clone());
        }
        if route.potential_profit > self.value(MetricKind::TransferPotentialProfit) {
            let value = MetricValue::new(MetricKind::TransferPotentialProfit, route.potential_profit, &self.world)
                .with_info(route.describe());
            self.replace_transfer(value);
            self.best_potential_route = Some(route);
        }
    }

    fn replace_transfer(&mut self, value: MetricValue) {
        if let Some(group) = self.metrics.get_mut(&value.kind) {
            group.replace_own(value);
        }
    }
}

fn derived_value(kind: MetricKind, value: f64, inputs_known: bool, world: &str) -> MetricValue {
    if inputs_known {
        MetricValue::new(kind, value, world)
    } else {
        MetricValue::unavailable(kind, value, world)
    }
}

/// Current price minus the monthly average; only meaningful when both are known.
fn delta(kind: MetricKind, current: f64, average: f64, world: &str) -> MetricValue {
    if current > 0.0 && average > 0.0 {
        MetricValue::new(kind, current - average, world)
    } else {
        MetricValue::unavailable(kind, 0.0, world)
    }
}
