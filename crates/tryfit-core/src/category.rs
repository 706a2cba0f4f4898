//! Garment categories for try-on requests.
//!
//! The category set is closed: requests carrying anything outside it are
//! rejected before any provider or account work happens. Categories drive
//! provider ranking tables and the prompt shape each adapter sends upstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Closed classification of garment placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Tops: shirts, jackets, sweaters.
    UpperBody,

    /// Bottoms: trousers, skirts, shorts.
    LowerBody,

    /// Full-body garments: dresses, gowns, jumpsuits.
    Dresses,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Self; 3] = [Self::UpperBody, Self::LowerBody, Self::Dresses];

    /// The wire/storage name of the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::Dresses => "dresses",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper_body" => Ok(Self::UpperBody),
            "lower_body" => Ok(Self::LowerBody),
            "dresses" => Ok(Self::Dresses),
            other => Err(CoreError::UnknownCategory {
                value: other.to_string(),
            }),
        }
    }
}
