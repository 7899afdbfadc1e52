use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::model::{ItemMetadata, MarketRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS world_updates (
        world       TEXT PRIMARY KEY,
        last_update INTEGER NOT NULL,
        fetched_at  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS market (
        world   TEXT NOT NULL,
        item_id INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (world, item_id)
    );
    CREATE TABLE IF NOT EXISTS item_metadata (
        item_id INTEGER PRIMARY KEY,
        payload TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS history (
        world   TEXT NOT NULL,
        item_id INTEGER NOT NULL,
        time    INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (world, item_id, time)
    );
";

/// Response cache for market API payloads.
///
/// Owned by whoever fetches and handed to it by reference. A world's market is
/// stale once the API reports a newer update than the one stored, or once the
/// stored copy is older than the configured maximum age.
pub struct MarketCache {
    conn: Connection,
}

impl MarketCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "opened market cache");
        Self::with_connection(conn)
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        Self::open(&config.cache_path)
    }

    /// Stale check against the configured maximum age.
    pub fn needs_refresh(&self, config: &AnalyzerConfig, world: &str, last_known_update: i64, now: i64) -> Result<bool> {
        self.is_stale(world, last_known_update, now, config.cache_max_age_secs)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(MarketCache { conn })
    }

    pub fn last_update(&self, world: &str) -> Result<Option<(i64, i64)>> {
        let row = self
            .conn
            .query_row(
                "SELECT last_update, fetched_at FROM world_updates WHERE world = ?1",
                [world],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub fn is_stale(&self, world: &str, last_known_update: i64, now: i64, max_age_secs: i64) -> Result<bool> {
        let stale = match self.last_update(world)? {
            None => true,
            Some((stored, fetched_at)) => stored < last_known_update || now - fetched_at > max_age_secs,
        };
        Ok(stale)
    }

    /// Replaces everything cached for `world` with `records`.
    pub fn store_market(&mut self, world: &str, last_update: i64, now: i64, records: &[MarketRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM market WHERE world = ?1", [world])?;
        {
            let mut stmt = tx.prepare("INSERT INTO market (world, item_id, payload) VALUES (?1, ?2, ?3)")?;
            for record in records {
                stmt.execute(params![world, record.id, serde_json::to_string(record)?])?;
            }
        }
        tx.execute(
            "INSERT INTO world_updates (world, last_update, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(world) DO UPDATE SET last_update = excluded.last_update, fetched_at = excluded.fetched_at",
            params![world, last_update, now],
        )?;
        tx.commit()?;

        tracing::info!(world, items = records.len(), last_update, "cached world market");
        Ok(())
    }

    pub fn load_market(&self, world: &str) -> Result<Vec<MarketRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM market WHERE world = ?1 ORDER BY item_id")?;
        let payloads = stmt
            .query_map([world], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(payloads.len());
        for payload in payloads {
            records.push(serde_json::from_str(&payload)?);
        }
        Ok(records)
    }

    pub fn store_metadata(&mut self, items: &[ItemMetadata]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO item_metadata (item_id, payload) VALUES (?1, ?2)
                 ON CONFLICT(item_id) DO UPDATE SET payload = excluded.payload",
            )?;
            for item in items {
                stmt.execute(params![item.id, serde_json::to_string(item)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_metadata(&self) -> Result<Vec<ItemMetadata>> {
        let mut stmt = self.conn.prepare("SELECT payload FROM item_metadata ORDER BY item_id")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(payloads.len());
        for payload in payloads {
            items.push(serde_json::from_str(&payload)?);
        }
        Ok(items)
    }

    /// Adds history records; a record already cached for the same time is overwritten.
    pub fn store_history(&mut self, world: &str, item_id: u32, records: &[MarketRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO history (world, item_id, time, payload) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(world, item_id, time) DO UPDATE SET payload = excluded.payload",
            )?;
            for record in records {
                stmt.execute(params![world, item_id, record.time, serde_json::to_string(record)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_history(&self, world: &str, item_id: u32) -> Result<Vec<MarketRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM history WHERE world = ?1 AND item_id = ?2 ORDER BY time",
        )?;
        let payloads = stmt
            .query_map(params![world, item_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(payloads.len());
        for payload in payloads {
            records.push(serde_json::from_str(&payload)?);
        }
        Ok(records)
    }
}

/// Parses a market API payload: a JSON array of item records.
pub fn parse_market_payload(json: &str) -> Result<Vec<MarketRecord>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, time: i64, sell: f64) -> MarketRecord {
        MarketRecord {
            id,
            time,
            sell_offer: sell,
            ..Default::default()
        }
    }

    #[test]
    fn empty_cache_is_stale() {
        let cache = MarketCache::open_in_memory().unwrap();
        assert!(cache.is_stale("Antica", 0, 0, 3600).unwrap());
    }

    #[test]
    fn staleness_follows_remote_update_and_age() {
        let mut cache = MarketCache::open_in_memory().unwrap();
        cache.store_market("Antica", 1_000, 5_000, &[record(1, 1_000, 10.0)]).unwrap();

        assert!(!cache.is_stale("Antica", 1_000, 5_100, 3600).unwrap());
        assert!(cache.is_stale("Antica", 1_001, 5_100, 3600).unwrap());
        assert!(cache.is_stale("Antica", 1_000, 9_000, 3600).unwrap());
        assert!(cache.is_stale("Secura", 0, 5_100, 3600).unwrap());
    }

    #[test]
    fn storing_a_market_replaces_the_world() {
        let mut cache = MarketCache::open_in_memory().unwrap();
        cache.store_market("Antica", 1, 1, &[record(1, 1, 10.0), record(2, 1, 20.0)]).unwrap();
        cache.store_market("Antica", 2, 2, &[record(2, 2, 25.0)]).unwrap();
        cache.store_market("Secura", 2, 2, &[record(1, 2, 99.0)]).unwrap();

        let antica = cache.load_market("Antica").unwrap();
        assert_eq!(antica, vec![record(2, 2, 25.0)]);
        assert_eq!(cache.last_update("Antica").unwrap(), Some((2, 2)));
        assert_eq!(cache.load_market("Secura").unwrap().len(), 1);
    }

    #[test]
    fn history_is_returned_in_time_order() {
        let mut cache = MarketCache::open_in_memory().unwrap();
        cache.store_history("Antica", 7, &[record(7, 300, 3.0), record(7, 100, 1.0)]).unwrap();
        cache.store_history("Antica", 7, &[record(7, 200, 2.0), record(7, 300, 4.0)]).unwrap();

        let times: Vec<(i64, f64)> = cache
            .load_history("Antica", 7)
            .unwrap()
            .iter()
            .map(|r| (r.time, r.sell_offer))
            .collect();
        assert_eq!(times, vec![(100, 1.0), (200, 2.0), (300, 4.0)]);
        assert!(cache.load_history("Secura", 7).unwrap().is_empty());
    }

    #[test]
    fn metadata_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalyzerConfig {
            cache_path: dir.path().join("cache.db"),
            ..Default::default()
        };
        let path = config.cache_path.clone();
        {
            let mut cache = MarketCache::from_config(&config).unwrap();
            assert!(cache.needs_refresh(&config, "Antica", 0, 0).unwrap());
            cache
                .store_metadata(&[ItemMetadata { id: 3, name: "ham".to_string(), ..Default::default() }])
                .unwrap();
        }
        let cache = MarketCache::open(&path).unwrap();
        let items = cache.load_metadata().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "ham");
    }

    #[test]
    fn parses_payload_with_gaps() {
        let records = parse_market_payload(r#"[{"id": 1, "sell_offer": 5}, {"id": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sell_offer, -1.0);
        assert!(parse_market_payload("{").is_err());
    }
}
