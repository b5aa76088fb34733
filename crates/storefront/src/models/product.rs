//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadline_core::{Price, ProductId, UserId};

/// Stock held for one size of a product.
///
/// `size` is optional: one-size items carry a single record without a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub material: String,
    pub color: String,
    /// Public path of the product image (`/uploads/...`), empty when none was uploaded.
    pub image_url: String,
    pub sizes: Vec<SizeStock>,
    /// Users that have this product in their favourites.
    pub favourited_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The catalog label matching `size`, compared case-insensitively, or
    /// `None` when the product does not offer it.
    ///
    /// Products that list no labelled sizes accept any selection as given.
    #[must_use]
    pub fn size_label(&self, size: &str) -> Option<String> {
        let mut labelled = self.sizes.iter().filter_map(|s| s.size.as_deref()).peekable();
        if labelled.peek().is_none() {
            return Some(size.to_owned());
        }
        labelled
            .find(|label| label.eq_ignore_ascii_case(size))
            .map(ToOwned::to_owned)
    }
}

/// Validated product fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub price: Price,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub material: String,
    pub color: String,
    pub sizes: Vec<SizeStock>,
    /// New image path. `None` keeps the current image on update and stores
    /// an empty path on create.
    pub image_url: Option<String>,
}

/// Catalog listing filter. Empty fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive exact category match.
    pub category: Option<String>,
    /// Any of these subcategories.
    pub subcategories: Vec<String>,
    /// Any of these materials.
    pub materials: Vec<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Price>,
    /// Inclusive upper price bound.
    pub max_price: Option<Price>,
}

impl ProductFilter {
    /// In-process evaluation of the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if !self.subcategories.is_empty() && !self.subcategories.contains(&product.subcategory) {
            return false;
        }
        if !self.materials.is_empty() && !self.materials.contains(&product.material) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(category: &str, subcategory: &str, material: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Basic Tee".to_owned(),
            price: price.parse().unwrap(),
            brand: "Threadline".to_owned(),
            category: category.to_owned(),
            subcategory: subcategory.to_owned(),
            description: "Cotton tee".to_owned(),
            material: material.to_owned(),
            color: "white".to_owned(),
            image_url: String::new(),
            sizes: vec![
                SizeStock {
                    size: Some("S".to_owned()),
                    quantity: 3,
                },
                SizeStock {
                    size: Some("M".to_owned()),
                    quantity: 0,
                },
            ],
            favourited_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_category_is_case_insensitive_exact() {
        let tee = product("Women", "basic-tees", "cotton", "20");
        let filter = ProductFilter {
            category: Some("women".to_owned()),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&tee));

        let filter = ProductFilter {
            category: Some("wom".to_owned()),
            ..ProductFilter::default()
        };
        assert!(!filter.matches(&tee));
    }

    #[test]
    fn test_filter_lists_and_price_bounds() {
        let tee = product("men", "basic-tees", "cotton", "20");
        let filter = ProductFilter {
            subcategories: vec!["new-arrivals".to_owned(), "basic-tees".to_owned()],
            materials: vec!["cotton".to_owned()],
            min_price: Some("20".parse().unwrap()),
            max_price: Some("20".parse().unwrap()),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&tee));

        let filter = ProductFilter {
            max_price: Some("19.99".parse().unwrap()),
            ..ProductFilter::default()
        };
        assert!(!filter.matches(&tee));
    }

    #[test]
    fn test_size_label_is_canonical() {
        let mut tee = product("men", "basic-tees", "cotton", "20");
        assert_eq!(tee.size_label("s").as_deref(), Some("S"));
        assert_eq!(tee.size_label("M").as_deref(), Some("M"));
        assert_eq!(tee.size_label("XL"), None);

        tee.sizes = vec![SizeStock {
            size: None,
            quantity: 10,
        }];
        assert_eq!(tee.size_label("anything").as_deref(), Some("anything"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let tee = product("men", "basic-tees", "cotton", "19.5");
        let json = serde_json::to_value(&tee).unwrap();
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["price"], 19.5);
        assert!(json["favouritedBy"].as_array().unwrap().is_empty());
        assert_eq!(json["sizes"][0]["size"], "S");
    }
}
