//! Seed the remote catalog from a YAML file.
//!
//! Reads product definitions, validates their prices parse as exact
//! currency amounts, and inserts them into the remote store's `products`
//! table with the service key. Existing rows with the same name are left
//! alone (`on_conflict=name` resolution on the store side).

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use fungal_flux_core::{Money, ProductCategory};

/// One product definition in the seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    /// Decimal string, e.g. `"24.99"` - the store column is numeric.
    pub price: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: ProductCategory,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub featured: bool,
}

/// Seed products from `file`.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, a price is not a valid amount, or the store rejects
/// the insert.
pub async fn run(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let api_url = std::env::var("COMMERCE_API_URL").map_err(|_| "COMMERCE_API_URL not set")?;
    let service_key = std::env::var("COMMERCE_SERVICE_KEY")
        .map(SecretString::from)
        .map_err(|_| "COMMERCE_SERVICE_KEY not set")?;

    let content = tokio::fs::read_to_string(file).await?;
    let products: Vec<SeedProduct> = serde_yaml::from_str(&content)?;
    info!(count = products.len(), path = %file, "parsed seed file");

    // Validate prices before touching the store
    for product in &products {
        Money::parse(&product.price)
            .map_err(|e| format!("product {:?}: bad price: {e}", product.name))?;
    }

    let client = reqwest::Client::new();
    let response = client
        .post(format!(
            "{}/rest/v1/products?on_conflict=name",
            api_url.trim_end_matches('/')
        ))
        .header("apikey", service_key.expose_secret())
        .bearer_auth(service_key.expose_secret())
        .header("Prefer", "resolution=ignore-duplicates")
        .json(&products)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("store rejected seed ({status}): {body}").into());
    }

    info!(count = products.len(), "catalog seeded");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_shape_parses() {
        let yaml = r#"
- name: "Lion's Mane Grow Kit"
  price: "24.99"
  image_url: /placeholder-mushroom.jpg
  category: grow-kits
  description: Complete Lion's Mane growing kit with pre-colonized substrate.
  stock_quantity: 25
  featured: true
- name: Sterilization Kit
  price: "45.99"
  category: supplies
  stock_quantity: 10
"#;
        let products: Vec<SeedProduct> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].category, ProductCategory::GrowKits);
        assert!(products[0].featured);
        assert!(!products[1].featured);
        assert!(Money::parse(&products[0].price).is_ok());
    }
}
