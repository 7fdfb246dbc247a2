//! Sends a normal "walking" sequence and a "fall" sequence to /check_activity.

use aegis_inference::client::samples::{fall_sequence, walking_sequence};
use aegis_inference::client::{AegisClient, DEFAULT_SERVER_URL};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let server_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let client = AegisClient::new(&server_url)?;
    let mut rng = rand::thread_rng();

    println!("--- Testing with NORMAL (walking) data ---");
    let response = client.check_activity(&walking_sequence(&mut rng)).await?;
    println!("Server Response: {}", response);

    println!("\n--- Testing with ABNORMAL (fall) data ---");
    let response = client.check_activity(&fall_sequence(&mut rng)).await?;
    println!("Server Response: {}", response);

    Ok(())
}
