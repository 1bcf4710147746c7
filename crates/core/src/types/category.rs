//! Product categories carried on cart line items.

use serde::{Deserialize, Serialize};

/// Category of a purchasable item.
///
/// The remote cart store keys its merge policy on this, so it travels with
/// every line mutation as `productType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    /// Phones, tablets, laptops - anything with a serial number.
    Device,
    /// Cases, chargers, cables and other add-ons.
    Accessory,
}

impl ProductCategory {
    /// Stable string form used in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Accessory => "accessory",
        }
    }
}
