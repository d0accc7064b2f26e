use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use cotacao_client::{write_bid, ClientError, QuotationClient};

#[derive(Parser)]
#[command(name = "cotacao-client")]
#[command(about = "Fetches the current bid and writes it to a file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080/cotacao")]
    url: String,

    /// Local deadline for the whole request, in milliseconds.
    #[arg(short, long, default_value_t = 300)]
    timeout_ms: u64,

    #[arg(short, long, default_value = "cotacao.txt")]
    output: PathBuf,

    #[arg(short, long, default_value = "Dólar")]
    label: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = QuotationClient::new(&cli.url, Duration::from_millis(cli.timeout_ms));

    match client.fetch_bid().await {
        Ok(bid) => {
            let line = write_bid(&cli.output, &cli.label, &bid)?;
            println!("{}", line);
        }
        Err(ClientError::Timeout(after)) => {
            eprintln!("External request timeout ({}ms)", after.as_millis());
        }
        Err(ClientError::Status(status)) => {
            eprintln!("Request error. Status: {}", status);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
