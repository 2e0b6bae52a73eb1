//! Product category taxonomy.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The shop's three product categories.
///
/// Wire values are kebab-case (`grow-kits`), matching the remote store's
/// check constraint on the `products.category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    GrowKits,
    LiquidCultures,
    Supplies,
}

impl ProductCategory {
    /// The wire/display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GrowKits => "grow-kits",
            Self::LiquidCultures => "liquid-cultures",
            Self::Supplies => "supplies",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grow-kits" => Ok(Self::GrowKits),
            "liquid-cultures" => Ok(Self::LiquidCultures),
            "supplies" => Ok(Self::Supplies),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Error for an unrecognized category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product category: {0}")]
pub struct UnknownCategory(pub String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ProductCategory::GrowKits).unwrap(),
            "\"grow-kits\""
        );
        let back: ProductCategory = serde_json::from_str("\"liquid-cultures\"").unwrap();
        assert_eq!(back, ProductCategory::LiquidCultures);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "supplies".parse::<ProductCategory>().unwrap(),
            ProductCategory::Supplies
        );
        assert!("mystery".parse::<ProductCategory>().is_err());
    }
}
