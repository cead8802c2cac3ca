use mock_server::MockCatalog;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let public_key = std::env::var("MARVEL_PUBLIC_KEY").unwrap_or_else(|_| "public".to_string());
    let private_key = std::env::var("MARVEL_PRIVATE_KEY").unwrap_or_else(|_| "private".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}, base url http://{addr}/v1/public");
    mock_server::run(listener, MockCatalog::seeded(&public_key, &private_key)).await
}
