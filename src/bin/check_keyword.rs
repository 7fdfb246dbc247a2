//! Sends a keyword recording and a different word to /check_audio.

use aegis_inference::client::samples::load_wav_mono;
use aegis_inference::client::{AegisClient, DEFAULT_SERVER_URL};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "check_keyword")]
#[command(about = "Post two 16 kHz WAV recordings to the keyword endpoint")]
struct Args {
    /// Recording of the keyword ("go")
    keyword_file: String,

    /// Recording of some other word
    unknown_word_file: String,

    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let client = AegisClient::new(&args.server_url)?;

    println!("--- Testing with keyword file: {} ---", args.keyword_file);
    let samples = load_wav_mono(&args.keyword_file)?;
    let response = client.check_audio(&samples).await?;
    println!("Server Response: {}", response);

    println!(
        "\n--- Testing with unknown word file: {} ---",
        args.unknown_word_file
    );
    let samples = load_wav_mono(&args.unknown_word_file)?;
    let response = client.check_audio(&samples).await?;
    println!("Server Response: {}", response);

    Ok(())
}
