use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewOrderItem<'a> {
    pub menu_item_id: Cow<'a, str>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Cow<'a, str>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewOrder<'a> {
    pub items: Vec<NewOrderItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<Cow<'a, str>>,
    pub is_takeaway: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Cow<'a, str>>,
}

impl NewOrder<'_> {
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("An order needs at least one item".to_string());
        }
        for item in &self.items {
            if item.menu_item_id.trim().is_empty() {
                return Err("Order item is missing a menu item id".to_string());
            }
            if item.quantity == 0 {
                return Err(format!(
                    "Quantity for menu item {} must be at least 1",
                    item.menu_item_id
                ));
            }
        }
        Ok(())
    }
}

/// Body for creating or replacing a menu item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MenuItemInput<'a> {
    pub name: Cow<'a, str>,
    pub description: Cow<'a, str>,
    pub price: f64,
    pub category: Cow<'a, str>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Cow<'a, str>>,
}

impl MenuItemInput<'_> {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Menu item name cannot be empty".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("Menu item category cannot be empty".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("Invalid menu item price {}", self.price));
        }
        Ok(())
    }
}

/// Filter for listing menu items.
#[derive(Debug, Clone, Default)]
pub struct MenuItemQuery<'a> {
    pub category: Option<Cow<'a, str>>,
    /// Only list items that are currently available. The backend defaults to `true`.
    pub available_only: Option<bool>,
}

impl<'a> MenuItemQuery<'a> {
    pub fn category(category: impl Into<Cow<'a, str>>) -> Self {
        Self {
            category: Some(category.into()),
            available_only: None,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(available_only) = self.available_only {
            pairs.push(("available_only", available_only.to_string()));
        }
        pairs
    }
}
