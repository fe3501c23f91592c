//! Domain services. Each service owns an `Arc<DbPool>` and returns `ServiceError`.

pub mod channel_manager;
pub mod comparison;
pub mod hotels;
pub mod inventory_fetch;
pub mod reports;
pub mod room_types;
pub mod snapshots;
pub mod weekly_statistics;
pub mod weekly_update;

/// Rounds a percentage to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(14.285714), 14.29);
        assert_eq!(round2(85.714285), 85.71);
        assert_eq!(round2(-3.333), -3.33);
        assert_eq!(round2(0.0), 0.0);
    }
}
