use sendgrid_provider::{init_logging, serve, SendgridProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting SendGrid provider");
    serve(SendgridProvider::new()).await
}
