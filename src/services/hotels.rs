use std::collections::HashMap;

/// Resolves hotel ids to the display names configured for the dashboard
#[derive(Debug, Clone, Default)]
pub struct HotelDirectory {
    names: HashMap<String, String>,
}

impl HotelDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Display name for a hotel, falling back to `hotel-{id}` for unknown properties
    pub fn name_for(&self, hotel_id: &str) -> String {
        self.names
            .get(hotel_id)
            .cloned()
            .unwrap_or_else(|| format!("hotel-{}", hotel_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_hotels_get_a_generated_name() {
        let directory = HotelDirectory::new(crate::config::default_hotels());
        assert_eq!(directory.name_for("2436"), "霧繞");
        assert_eq!(directory.name_for("2799"), "霧語");
        assert_eq!(directory.name_for("9999"), "hotel-9999");
    }
}
