//! Model cache inspection tool
//!
//! Prints what the shared store holds for one endpoint and which device the
//! selector would route a request to.
//!
//! Usage: `model-cache <endpoint-id> [model-id] [address] [port]`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use model_cache::{CacheConfig, ModelCache, StoreBackend, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "model_cache=info,cache_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let endpoint_id = args
        .next()
        .ok_or("usage: model-cache <endpoint-id> [model-id] [address] [port]")?;
    let model_id = args.next();
    let address = args.next().unwrap_or_else(|| "local".to_string());
    let port = match args.next() {
        Some(port) => port.parse()?,
        None => cache_core::config::DEFAULT_STORE_PORT,
    };

    let config = CacheConfig {
        store: StoreConfig::new(StoreBackend::Redis, address, port),
        ..Default::default()
    };
    tracing::info!("Inspecting endpoint {} on {}", endpoint_id, config.store.endpoint());
    let cache = ModelCache::new(config)?;

    println!("== status ({})", cache.list_status_count(&endpoint_id).await?);
    for raw in cache.list_status(&endpoint_id).await? {
        let (device_id, status) = ModelCache::decode_status(&raw)?;
        println!("{}: {}", device_id, serde_json::Value::Object(status));
    }

    println!("== results ({})", cache.list_result_count(&endpoint_id).await?);
    for raw in cache.list_result(&endpoint_id).await? {
        let (device_id, result) = ModelCache::decode_result(&raw)?;
        println!("{}: {}", device_id, serde_json::Value::Object(result));
    }

    println!("== active: {}", cache.is_endpoint_active(&endpoint_id).await?);

    match cache.latest_metrics(&endpoint_id).await? {
        Some(raw) => println!("== latest metrics: {:?}", ModelCache::decode_metrics(&raw)?),
        None => println!("== latest metrics: none"),
    }

    if let Some(model_id) = model_id {
        match cache.select_idle_device(&endpoint_id, &model_id).await? {
            Some(result) => {
                let result = serde_json::Value::Object(result);
                println!("== idle device for {}: {}", model_id, result)
            }
            None => println!("== idle device for {}: none", model_id),
        }
    }

    Ok(())
}
