use serde::Serialize;
use thousands::Separable;

/// Every metric an item snapshot carries. Policies hang off the kind, never off its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MetricKind {
    SellPrice,
    BuyPrice,
    MonthAverageSell,
    MonthAverageBuy,
    DayAverageSell,
    DayAverageBuy,
    DeltaSellPrice,
    DeltaBuyPrice,
    MonthHighestSell,
    MonthLowestSell,
    MonthHighestBuy,
    MonthLowestBuy,
    DayHighestSell,
    DayLowestSell,
    DayHighestBuy,
    DayLowestBuy,
    MonthSold,
    MonthBought,
    DaySold,
    DayBought,
    SellOffers,
    BuyOffers,
    ActiveTraders,
    Profit,
    AverageProfit,
    PotentialProfit,
    NpcProfit,
    NpcImmediateProfit,
    TransferAverageProfit,
    TransferPotentialProfit,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub can_be_negative: bool,
    pub hidden_by_default: bool,
    /// Depends on a pair of worlds; recomputed on merge instead of folded as a sibling.
    pub transfer_derived: bool,
}

const fn observed(name: &'static str, description: &'static str, hidden_by_default: bool) -> MetricDescriptor {
    MetricDescriptor {
        name,
        description,
        can_be_negative: false,
        hidden_by_default,
        transfer_derived: false,
    }
}

const fn derived(name: &'static str, description: &'static str, hidden_by_default: bool) -> MetricDescriptor {
    MetricDescriptor {
        name,
        description,
        can_be_negative: true,
        hidden_by_default,
        transfer_derived: false,
    }
}

impl MetricKind {
    pub const ALL: [MetricKind; 30] = [
        MetricKind::SellPrice,
        MetricKind::BuyPrice,
        MetricKind::MonthAverageSell,
        MetricKind::MonthAverageBuy,
        MetricKind::DayAverageSell,
        MetricKind::DayAverageBuy,
        MetricKind::DeltaSellPrice,
        MetricKind::DeltaBuyPrice,
        MetricKind::MonthHighestSell,
        MetricKind::MonthLowestSell,
        MetricKind::MonthHighestBuy,
        MetricKind::MonthLowestBuy,
        MetricKind::DayHighestSell,
        MetricKind::DayLowestSell,
        MetricKind::DayHighestBuy,
        MetricKind::DayLowestBuy,
        MetricKind::MonthSold,
        MetricKind::MonthBought,
        MetricKind::DaySold,
        MetricKind::DayBought,
        MetricKind::SellOffers,
        MetricKind::BuyOffers,
        MetricKind::ActiveTraders,
        MetricKind::Profit,
        MetricKind::AverageProfit,
        MetricKind::PotentialProfit,
        MetricKind::NpcProfit,
        MetricKind::NpcImmediateProfit,
        MetricKind::TransferAverageProfit,
        MetricKind::TransferPotentialProfit,
    ];

    pub fn descriptor(self) -> MetricDescriptor {
        use MetricKind::*;
        match self {
            SellPrice => observed("Sell Price", "The current lowest sell offer of the item.", false),
            BuyPrice => observed("Buy Price", "The current highest buy offer of the item.", false),
            MonthAverageSell => observed("Avg. Sell Price", "The average sell price over the last 30 days.", true),
            MonthAverageBuy => observed("Avg. Buy Price", "The average buy price over the last 30 days.", true),
            DayAverageSell => observed("Day Avg. Sell Price", "The average sell price over the last 24 hours.", true),
            DayAverageBuy => observed("Day Avg. Buy Price", "The average buy price over the last 24 hours.", true),
            DeltaSellPrice => derived(
                "Delta Sell Price",
                "Current sell price minus the monthly average. Very negative is a good time to buy, very positive a good time to sell.",
                true,
            ),
            DeltaBuyPrice => derived(
                "Delta Buy Price",
                "Current buy price minus the monthly average. Very negative is a good time to buy, very positive a good time to sell.",
                true,
            ),
            MonthHighestSell => observed("Highest Sell Price", "The highest sell price in the last 30 days.", true),
            MonthLowestSell => observed("Lowest Sell Price", "The lowest sell price in the last 30 days.", true),
            MonthHighestBuy => observed("Highest Buy Price", "The highest buy price in the last 30 days.", true),
            MonthLowestBuy => observed("Lowest Buy Price", "The lowest buy price in the last 30 days.", true),
            DayHighestSell => observed("Day Highest Sell Price", "The highest sell price in the last 24 hours.", true),
            DayLowestSell => observed("Day Lowest Sell Price", "The lowest sell price in the last 24 hours.", true),
            DayHighestBuy => observed("Day Highest Buy Price", "The highest buy price in the last 24 hours.", true),
            DayLowestBuy => observed("Day Lowest Buy Price", "The lowest buy price in the last 24 hours.", true),
            MonthSold => observed("Sold", "The amount of items sold in the last 30 days.", false),
            MonthBought => observed("Bought", "The amount of items bought in the last 30 days.", false),
            DaySold => observed("Day Sold", "The amount of items sold in the last 24 hours.", true),
            DayBought => observed("Day Bought", "The amount of items bought in the last 24 hours.", true),
            SellOffers => observed("Sell Offers", "The current amount of sell offers.", true),
            BuyOffers => observed("Buy Offers", "The current amount of buy offers.", true),
            ActiveTraders => observed(
                "Traders",
                "Buy or sell offers placed in the last 24 hours, whichever is smaller. Roughly the number of flippers you compete with.",
                false,
            ),
            Profit => derived("Profit", "The profit of flipping this item right now, after fees on both offers.", false),
            AverageProfit => derived(
                "Avg. Profit",
                "The profit of flipping this item at the monthly average prices, after fees on both offers.",
                false,
            ),
            PotentialProfit => derived(
                "Potential Profit",
                "The monthly average profit if you were the only trader for a month, capped by the smaller side of the market.",
                false,
            ),
            NpcProfit => derived(
                "NPC Profit",
                "The profit of placing a market offer and trading the other side with an NPC, after the offer fee.",
                true,
            ),
            NpcImmediateProfit => derived(
                "NPC Immediate Profit",
                "The profit of accepting an existing market offer and trading the other side with an NPC. No fee applies.",
                true,
            ),
            TransferAverageProfit => MetricDescriptor {
                name: "Transfer Avg. Profit",
                description: "The best average profit of buying on one world and selling on another. Does not include the cost of the world transfer itself.",
                can_be_negative: false,
                hidden_by_default: true,
                transfer_derived: true,
            },
            TransferPotentialProfit => MetricDescriptor {
                name: "Transfer Potential Profit",
                description: "The best monthly potential profit of buying on one world and selling on another. Does not include the cost of the world transfer itself.",
                can_be_negative: false,
                hidden_by_default: true,
                transfer_derived: true,
            },
        }
    }

    pub fn is_transfer_derived(self) -> bool {
        self.descriptor().transfer_derived
    }
}

/// Whether `value` is a real observation under the given sign policy.
pub fn is_valid_value(value: f64, can_be_negative: bool) -> bool {
    value.is_finite() && (can_be_negative || value > 0.0)
}

/// Text shown for a value; unavailable observations render as "None".
pub fn localise(value: f64, can_be_negative: bool) -> String {
    if !is_valid_value(value, can_be_negative) {
        return "None".to_string();
    }

    // -0.0 would otherwise render with a sign
    let rounded = (value * 1000.0).round() / 1000.0 + 0.0;
    rounded.separate_with_commas()
}

/// One world's observation of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub kind: MetricKind,
    pub value: f64,
    pub can_be_negative: bool,
    pub additional_info: Option<String>,
    pub world: String,
    /// False when the inputs this value is derived from were unknown; the
    /// stored number is then a placeholder, not an observation.
    pub known: bool,
}

impl MetricValue {
    pub fn new(kind: MetricKind, value: f64, world: impl Into<String>) -> Self {
        MetricValue {
            kind,
            value,
            can_be_negative: kind.descriptor().can_be_negative,
            additional_info: None,
            world: world.into(),
            known: true,
        }
    }

    /// Placeholder for a value that could not be derived on this world.
    pub fn unavailable(kind: MetricKind, placeholder: f64, world: impl Into<String>) -> Self {
        MetricValue {
            known: false,
            ..MetricValue::new(kind, placeholder, world)
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.known && is_valid_value(self.value, self.can_be_negative)
    }

    pub fn localised_value(&self) -> String {
        if !self.known {
            return "None".to_string();
        }
        localise(self.value, self.can_be_negative)
    }
}

/// A metric together with the same metric observed on other worlds.
///
/// The first member is the group's own value. `min`/`max` only ever point at
/// valid members and are kept current as siblings arrive; ties keep the earlier
/// member, so the extreme values do not depend on insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiblingGroup {
    members: Vec<MetricValue>,
    min: Option<usize>,
    max: Option<usize>,
}

impl SiblingGroup {
    pub fn new(own: MetricValue) -> Self {
        let mut group = SiblingGroup {
            members: Vec::with_capacity(1),
            min: None,
            max: None,
        };
        group.add_sibling(own);
        group
    }

    pub fn add_sibling(&mut self, sibling: MetricValue) {
        let index = self.members.len();
        let valid = sibling.is_valid();
        let value = sibling.value;
        self.members.push(sibling);

        if !valid {
            return;
        }
        if self.min.map_or(true, |i| value < self.members[i].value) {
            self.min = Some(index);
        }
        if self.max.map_or(true, |i| value > self.members[i].value) {
            self.max = Some(index);
        }
    }

    pub fn own(&self) -> &MetricValue {
        &self.members[0]
    }

    /// Replaces the group's own value. Only transfer metrics, which are never
    /// folded as siblings, are updated this way.
    pub(crate) fn replace_own(&mut self, own: MetricValue) {
        *self = SiblingGroup::new(own);
    }

    /// All members in insertion order.
    pub fn members(&self) -> &[MetricValue] {
        &self.members
    }

    pub fn siblings(&self) -> &[MetricValue] {
        &self.members[1..]
    }

    pub fn min(&self) -> &MetricValue {
        &self.members[self.min.unwrap_or(0)]
    }

    pub fn max(&self) -> &MetricValue {
        &self.members[self.max.unwrap_or(0)]
    }

    pub fn has_valid_member(&self) -> bool {
        self.min.is_some()
    }

    /// Members ordered by value, highest first.
    pub fn sorted_by_value(&self) -> Vec<&MetricValue> {
        let mut sorted: Vec<&MetricValue> = self.members.iter().collect();
        sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
        sorted
    }
}

/// A metric compared against an earlier baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendMetricValue {
    pub metric: MetricValue,
    pub previous_value: f64,
}

impl TrendMetricValue {
    pub fn new(metric: MetricValue, previous_value: f64) -> Self {
        TrendMetricValue { metric, previous_value }
    }

    pub fn difference(&self) -> f64 {
        self.metric.value - self.previous_value
    }

    /// 1 means "no trend"; also used when there is no positive baseline.
    pub fn relative_difference(&self) -> f64 {
        if self.previous_value <= 0.0 {
            1.0
        } else {
            self.metric.value / self.previous_value
        }
    }
}
