//! Derived market statistics for Tibia items: flip and NPC profits, cross-world
//! aggregation with transfer routes, price trends and weekday patterns.

pub mod config;
pub mod error;
pub mod flips;
pub mod history;
pub mod loader;
pub mod market;
pub mod metric;
pub mod model;
pub mod snapshot;
pub mod stats;
pub mod weekday;
pub mod worlds;

pub use config::AnalyzerConfig;
pub use error::AnalyzerError;
pub use flips::FeeModel;
pub use history::{Dimension, Series, TimeSeries};
pub use loader::MarketCache;
pub use metric::{MetricKind, MetricValue, SiblingGroup, TrendMetricValue};
pub use model::{EventCalendar, ItemMetadata, MarketRecord, MetadataIndex};
pub use snapshot::ItemSnapshot;
pub use worlds::{WorldDirectory, WorldMetadata};
