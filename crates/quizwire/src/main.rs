//! Quizwire server binary.

use std::sync::Arc;

use quizwire::QuizServer;
use quizwire_content::{FallbackGenerator, GenerationPolicy, HttpModelBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("QUIZWIRE_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let api_key = std::env::var("QUIZWIRE_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("QUIZWIRE_API_KEY is not set; quiz generation will fail");
    }

    let generator = Arc::new(FallbackGenerator::new(
        HttpModelBackend::with_default_url(api_key),
        GenerationPolicy::default(),
    ));

    let server = QuizServer::builder().bind(&addr).build(generator).await?;
    tracing::info!(%addr, "quizwire listening");
    server.run().await?;
    Ok(())
}
