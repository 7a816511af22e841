//! Product Model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ProductId = i64;

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clothes,
    Accessories,
    Footwear,
    Gadgets,
    Extras,
}

impl Category {
    /// Canonical storage form (lowercase name)
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clothes => "clothes",
            Category::Accessories => "accessories",
            Category::Footwear => "footwear",
            Category::Gadgets => "gadgets",
            Category::Extras => "extras",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive parse, used for the category listing route
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clothes" => Ok(Category::Clothes),
            "accessories" => Ok(Category::Accessories),
            "footwear" => Ok(Category::Footwear),
            "gadgets" => Ok(Category::Gadgets),
            "extras" => Ok(Category::Extras),
            other => Err(format!("Unknown category: {other}")),
        }
    }
}

/// Product model
///
/// Read-only reference data from the cart engine's perspective.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Fixed-point currency value, 2 fraction digits
    pub price: Decimal,
    pub category: Category,
    pub in_stock: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Category,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<Category>,
    pub in_stock: Option<bool>,
}
