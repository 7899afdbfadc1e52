use crate::metric::localise;
use crate::model::{ItemMetadata, NpcListing};
use serde::{Deserialize, Serialize};

/// Market fee charged once for every offer placed: a share of the offer
/// value, capped per offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeModel {
    pub rate: f64,
    pub cap: f64,
}

impl Default for FeeModel {
    fn default() -> Self {
        FeeModel {
            rate: 0.02,
            cap: 250_000.0,
        }
    }
}

impl FeeModel {
    pub fn fee(&self, value: f64) -> f64 {
        (value * self.rate).min(self.cap)
    }

    /// Profit of placing a buy offer and a sell offer. Zero unless both prices are known.
    pub fn flip_profit(&self, sell_price: f64, buy_price: f64) -> f64 {
        if sell_price > 0.0 && buy_price > 0.0 {
            ((sell_price - buy_price) - self.fee(sell_price) - self.fee(buy_price)).round()
        } else {
            0.0
        }
    }

    /// Monthly ceiling of `average_profit` when taking the whole smaller side of
    /// the market, less the fee on the total.
    pub fn potential_profit(&self, average_profit: f64, sold: f64, bought: f64) -> f64 {
        let volume = sold.min(bought);
        if volume <= 0.0 || average_profit == 0.0 {
            return 0.0;
        }
        let gross = average_profit * volume;
        (gross - self.fee(gross.abs())).round()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NpcDirection {
    /// Buy on the market, sell to an NPC.
    MarketToNpc,
    /// Buy from an NPC, sell on the market.
    NpcToMarket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcDeal {
    pub profit: f64,
    pub direction: NpcDirection,
    pub market_price: f64,
    pub npc: NpcListing,
}

impl NpcDeal {
    pub fn describe(&self, immediate: bool) -> String {
        let npc = format!(
            "{} in {} for {}",
            self.npc.name,
            self.npc.location,
            localise(self.npc.price, false)
        );
        let price = localise(self.market_price, false);
        match (self.direction, immediate) {
            (NpcDirection::MarketToNpc, true) => format!("Buy from the sell offer for {} and sell to {}.", price, npc),
            (NpcDirection::NpcToMarket, true) => format!("Buy from {} and sell to the buy offer for {}.", npc, price),
            (NpcDirection::MarketToNpc, false) => format!("Place a buy offer for {} and sell to {}.", price, npc),
            (NpcDirection::NpcToMarket, false) => format!("Buy from {} and place a sell offer for {}.", npc, price),
        }
    }
}

fn better(a: Option<NpcDeal>, b: Option<NpcDeal>) -> Option<NpcDeal> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.profit > a.profit { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Best trade that places one market offer and trades the other leg with an NPC.
/// `None` when neither direction has both prices.
pub fn npc_profit(fees: &FeeModel, sell_price: f64, buy_price: f64, meta: &ItemMetadata) -> Option<NpcDeal> {
    let to_npc = meta.best_npc_buyer().filter(|_| buy_price > 0.0).map(|npc| NpcDeal {
        profit: (npc.price - buy_price - fees.fee(buy_price)).round(),
        direction: NpcDirection::MarketToNpc,
        market_price: buy_price,
        npc: npc.clone(),
    });
    let from_npc = meta.best_npc_seller().filter(|_| sell_price > 0.0).map(|npc| NpcDeal {
        profit: (sell_price - npc.price - fees.fee(sell_price)).round(),
        direction: NpcDirection::NpcToMarket,
        market_price: sell_price,
        npc: npc.clone(),
    });
    better(to_npc, from_npc)
}

/// Best trade against offers already standing on the market. No offer is
/// placed, so no fee applies.
pub fn npc_immediate_profit(sell_price: f64, buy_price: f64, meta: &ItemMetadata) -> Option<NpcDeal> {
    let to_npc = meta.best_npc_buyer().filter(|_| sell_price > 0.0).map(|npc| NpcDeal {
        profit: npc.price - sell_price,
        direction: NpcDirection::MarketToNpc,
        market_price: sell_price,
        npc: npc.clone(),
    });
    let from_npc = meta.best_npc_seller().filter(|_| buy_price > 0.0).map(|npc| NpcDeal {
        profit: buy_price - npc.price,
        direction: NpcDirection::NpcToMarket,
        market_price: buy_price,
        npc: npc.clone(),
    });
    better(to_npc, from_npc)
}

/// The monthly figures of one world that a transfer route needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferQuote {
    pub world: String,
    pub month_average_sell: f64,
    pub month_average_buy: f64,
    pub month_sold: f64,
    pub month_bought: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRoute {
    pub from: String,
    pub to: String,
    pub average_profit: f64,
    pub potential_profit: f64,
}

impl TransferRoute {
    pub fn describe(&self) -> String {
        format!(
            "Buy on {} and sell on {}. The world transfer itself costs extra and is not included.",
            self.from, self.to
        )
    }
}

/// Buy at `from`'s average buy price, carry the goods over, sell at `to`'s average sell price.
pub fn transfer_route(fees: &FeeModel, from: &TransferQuote, to: &TransferQuote) -> TransferRoute {
    let average_profit = fees.flip_profit(to.month_average_sell, from.month_average_buy);
    let potential_profit = fees.potential_profit(average_profit, to.month_sold, from.month_bought);
    TransferRoute {
        from: from.world.clone(),
        to: to.world.clone(),
        average_profit,
        potential_profit,
    }
}
