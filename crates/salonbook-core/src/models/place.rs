use serde::{Deserialize, Serialize};

/// A salon near the user, as shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Salon {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

impl Salon {
    pub fn address_display(&self) -> &str {
        self.address.as_deref().unwrap_or("Address unavailable")
    }
}
