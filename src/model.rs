use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Marker for a value the market API did not know.
pub const UNKNOWN: f64 = -1.0;

fn sentinel<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(UNKNOWN))
}

/// One item's market state on one world, as served by the market API.
/// Every numeric field that is missing or `null` becomes [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketRecord {
    pub id: u32,
    pub time: i64,

    #[serde(deserialize_with = "sentinel")]
    pub sell_offer: f64,
    #[serde(deserialize_with = "sentinel")]
    pub buy_offer: f64,

    #[serde(deserialize_with = "sentinel")]
    pub month_average_sell: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_average_buy: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_highest_sell: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_lowest_sell: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_highest_buy: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_lowest_buy: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_sold: f64,
    #[serde(deserialize_with = "sentinel")]
    pub month_bought: f64,

    #[serde(deserialize_with = "sentinel")]
    pub day_average_sell: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_average_buy: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_highest_sell: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_lowest_sell: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_highest_buy: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_lowest_buy: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_sold: f64,
    #[serde(deserialize_with = "sentinel")]
    pub day_bought: f64,

    #[serde(deserialize_with = "sentinel")]
    pub sell_offers: f64,
    #[serde(deserialize_with = "sentinel")]
    pub buy_offers: f64,
    #[serde(deserialize_with = "sentinel")]
    pub active_traders: f64,
}

impl Default for MarketRecord {
    fn default() -> Self {
        MarketRecord {
            id: 0,
            time: 0,
            sell_offer: UNKNOWN,
            buy_offer: UNKNOWN,
            month_average_sell: UNKNOWN,
            month_average_buy: UNKNOWN,
            month_highest_sell: UNKNOWN,
            month_lowest_sell: UNKNOWN,
            month_highest_buy: UNKNOWN,
            month_lowest_buy: UNKNOWN,
            month_sold: UNKNOWN,
            month_bought: UNKNOWN,
            day_average_sell: UNKNOWN,
            day_average_buy: UNKNOWN,
            day_highest_sell: UNKNOWN,
            day_lowest_sell: UNKNOWN,
            day_highest_buy: UNKNOWN,
            day_lowest_buy: UNKNOWN,
            day_sold: UNKNOWN,
            day_bought: UNKNOWN,
            sell_offers: UNKNOWN,
            buy_offers: UNKNOWN,
            active_traders: UNKNOWN,
        }
    }
}

/// A price an NPC pays for (`npc_buy`) or asks for (`npc_sell`) an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcListing {
    pub name: String,
    pub location: String,
    pub price: f64,
    #[serde(default)]
    pub currency_object_type_id: Option<u32>,
    #[serde(default)]
    pub currency_quest_flag_display_name: Option<String>,
}

impl NpcListing {
    /// Listings paid in tokens or unlocked by quests never take part in gold profit math.
    pub fn is_gold(&self) -> bool {
        self.currency_object_type_id.unwrap_or(0) == 0
            && self
                .currency_quest_flag_display_name
                .as_deref()
                .map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemMetadata {
    pub id: u32,
    pub category: String,
    pub name: String,
    pub wiki_name: Option<String>,
    pub npc_buy: Vec<NpcListing>,
    pub npc_sell: Vec<NpcListing>,
}

impl ItemMetadata {
    pub fn display_name(&self) -> &str {
        match &self.wiki_name {
            Some(wiki) if !wiki.is_empty() => wiki,
            _ => &self.name,
        }
    }

    /// Best gold price an NPC pays for this item.
    pub fn best_npc_buyer(&self) -> Option<&NpcListing> {
        self.npc_buy
            .iter()
            .filter(|l| l.is_gold() && l.price > 0.0)
            .max_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Cheapest gold price an NPC sells this item for.
    pub fn best_npc_seller(&self) -> Option<&NpcListing> {
        self.npc_sell
            .iter()
            .filter(|l| l.is_gold() && l.price > 0.0)
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

pub type MetadataIndex = HashMap<u32, ItemMetadata>;

pub fn index_metadata(items: Vec<ItemMetadata>) -> MetadataIndex {
    items.into_iter().map(|m| (m.id, m)).collect()
}

/// Game events keyed by UTC calendar day (`YYYY.MM.DD`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventCalendar {
    events: HashMap<String, Vec<String>>,
}

impl EventCalendar {
    pub fn new(events: HashMap<String, Vec<String>>) -> Self {
        EventCalendar { events }
    }

    pub fn day_key(unix_time: i64) -> Option<String> {
        DateTime::from_timestamp(unix_time, 0).map(|t| t.format("%Y.%m.%d").to_string())
    }

    pub fn events_on(&self, unix_time: i64) -> Vec<String> {
        Self::day_key(unix_time)
            .and_then(|key| self.events.get(&key).cloned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_fields_become_unknown() {
        let record: MarketRecord =
            serde_json::from_str(r#"{"id": 3031, "time": 1700000000, "sell_offer": 120, "buy_offer": null}"#).unwrap();
        assert_eq!(record.id, 3031);
        assert_eq!(record.sell_offer, 120.0);
        assert_eq!(record.buy_offer, UNKNOWN);
        assert_eq!(record.month_sold, UNKNOWN);
    }

    #[test]
    fn non_gold_listings_are_ignored() {
        let meta = ItemMetadata {
            id: 1,
            name: "dragon ham".to_string(),
            npc_buy: vec![
                NpcListing {
                    name: "Grizzly Adams".to_string(),
                    location: "Port Hope".to_string(),
                    price: 900.0,
                    currency_object_type_id: Some(22118),
                    currency_quest_flag_display_name: None,
                },
                NpcListing {
                    name: "Tom".to_string(),
                    location: "Rookgaard".to_string(),
                    price: 40.0,
                    currency_object_type_id: None,
                    currency_quest_flag_display_name: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(meta.best_npc_buyer().map(|l| l.name.as_str()), Some("Tom"));
        assert!(meta.best_npc_seller().is_none());
    }

    #[test]
    fn display_name_prefers_wiki_name() {
        let mut meta = ItemMetadata { name: "giant shimmering pearl".to_string(), ..Default::default() };
        assert_eq!(meta.display_name(), "giant shimmering pearl");
        meta.wiki_name = Some("Giant Shimmering Pearl (Brown)".to_string());
        assert_eq!(meta.display_name(), "Giant Shimmering Pearl (Brown)");
    }

    #[test]
    fn events_are_looked_up_by_utc_day() {
        let mut events = HashMap::new();
        events.insert("2024.01.01".to_string(), vec!["Double XP".to_string()]);
        let calendar = EventCalendar::new(events);
        assert_eq!(calendar.events_on(1_704_067_200 + 3600), vec!["Double XP"]);
        assert!(calendar.events_on(1_704_067_200 - 1).is_empty());
    }
}
