//! Seed the catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - name: Linen shirt
//!   price: 49.90
//!   brand: Threadline
//!   category: men
//!   subcategory: shirts
//!   description: Loose fit, breathable linen
//!   material: linen
//!   color: white
//!   sizes:
//!     - { size: M, quantity: 4 }
//!     - { size: L, quantity: 2 }
//!   imageUrl: /uploads/linen-shirt.jpg
//! ```
//!
//! The whole file is parsed and checked before the database is touched.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use threadline_core::Price;
use threadline_storefront::db::{PgStore, Store};
use threadline_storefront::models::{ProductDraft, SizeStock};

use super::{CliError, connect};

/// One product entry in a seed file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub price: Price,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub material: String,
    pub color: String,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<SeedProduct> for ProductDraft {
    fn from(seed: SeedProduct) -> Self {
        Self {
            name: seed.name,
            price: seed.price,
            brand: seed.brand,
            category: seed.category,
            subcategory: seed.subcategory,
            description: seed.description,
            material: seed.material,
            color: seed.color,
            sizes: seed.sizes,
            image_url: seed.image_url,
        }
    }
}

/// Parse seed entries and report entries with empty required text.
fn parse(content: &str) -> Result<(Vec<SeedProduct>, Vec<String>), CliError> {
    let products: Vec<SeedProduct> = serde_yaml::from_str(content)?;

    let problems = products
        .iter()
        .enumerate()
        .filter_map(|(index, p)| {
            let blank = [
                ("name", &p.name),
                ("brand", &p.brand),
                ("category", &p.category),
                ("subcategory", &p.subcategory),
                ("description", &p.description),
                ("material", &p.material),
                ("color", &p.color),
            ]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect::<Vec<_>>();

            (!blank.is_empty())
                .then(|| format!("entry {}: empty {}", index + 1, blank.join(", ")))
        })
        .collect();

    Ok((products, problems))
}

/// Import every product in `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// incomplete, or an insert fails.
pub async fn products(file: &Path) -> Result<(), CliError> {
    info!(path = %file.display(), "Loading products from file");

    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CliError::Io {
            path: file.display().to_string(),
            source,
        })?;
    let (products, problems) = parse(&content)?;

    if !problems.is_empty() {
        error!("Seed file validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(CliError::InvalidSeed(problems.len()));
    }

    info!(products = products.len(), "Parsed seed file");

    let store = PgStore::new(connect().await?);
    for seed in products {
        let product = store.create_product(seed.into()).await?;
        info!(product_id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Seeding complete!");
    Ok(())
}
