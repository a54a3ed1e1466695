//! Demonstration of a StoreComposer recovering stores created at runtime

use serde_json::json;
use tracing_subscriber::EnvFilter;
use wc_store::{AbortController, PersistenceOptions, Storage, StoreComposer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wc_store=info")),
        )
        .init();

    println!("=== StoreComposer Example ===\n");

    let storage = Storage::in_memory();
    let options = PersistenceOptions::new("shop").durable("stores");

    {
        let composer = StoreComposer::with_storage(
            [("settings", json!({ "currency": "EUR" }))],
            storage.clone(),
            options.clone(),
        )?;

        let controller = AbortController::new();
        composer.create_store("cart", json!({ "items": [] }))?;
        composer.subscribe_to_all(&controller.signal(), |key, current, previous| {
            println!("   [{key}] {previous} -> {current}");
        });

        println!("1. Filling the cart");
        composer
            .get_store("cart")?
            .merge(&json!({ "items": ["book", "pen"] }))?;

        println!("\n2. Creating the cart again keeps the existing store");
        let cart = composer.create_store("cart", json!({ "items": [] }))?;
        println!("   cart: {}", cart.get_current());

        for entry in composer.history() {
            println!("   audit: {:?} {} at {}", entry.kind, entry.key, entry.at);
        }
    }

    println!("\n3. Rebuilding from storage with only the default keys");
    let composer = StoreComposer::with_storage(
        [("settings", json!({ "currency": "USD" }))],
        storage,
        options,
    )?;
    for key in composer.keys() {
        println!("   {key}: {}", composer.get_store(&key)?.get_current());
    }

    Ok(())
}
