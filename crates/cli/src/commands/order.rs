//! Fetch and display one persisted order.

use secrecy::SecretString;
use tracing::info;

use fungal_flux_core::OrderId;
use fungal_flux_storefront::config::CommerceStoreConfig;
use fungal_flux_storefront::store::{CommerceStore, StoreClient};

/// Fetch order `id` and log a summary.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the id is not a
/// UUID, or the store lookup fails.
pub async fn run(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let api_url = std::env::var("COMMERCE_API_URL").map_err(|_| "COMMERCE_API_URL not set")?;
    let service_key = std::env::var("COMMERCE_SERVICE_KEY")
        .map(SecretString::from)
        .map_err(|_| "COMMERCE_SERVICE_KEY not set")?;

    let order_id: OrderId = id.parse().map_err(|_| format!("invalid order id: {id}"))?;

    let client = StoreClient::new(&CommerceStoreConfig {
        api_url,
        service_key,
    });
    let order = client.get_order(order_id).await?;

    info!(
        order_number = %order.order_number,
        status = %order.status,
        payment_status = %order.payment_status,
        total = %order.total_amount,
        items = order.items.len(),
        "order"
    );
    for item in &order.items {
        info!(
            name = %item.product_name,
            quantity = item.quantity,
            unit_price = %item.unit_price,
            line_total = %item.total_price,
            "item"
        );
    }

    Ok(())
}
