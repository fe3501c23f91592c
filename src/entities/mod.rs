//! sea-orm entities backing the inventory reporting schema.

pub mod api_call_log;
pub mod data_snapshot;
pub mod inventory_record;
pub mod inventory_snapshot;
pub mod room_type;
pub mod weekly_statistics;
pub mod weekly_statistics_snapshot;
