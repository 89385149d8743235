pub mod aggregator;
pub mod models;
pub mod stats;

pub use aggregator::{group, group_for_lottery, lotteries, ResultGroup};
pub use models::{ResultRecord, Snapshot, Timestamp};
pub use stats::{summarize, StatsSummary};
