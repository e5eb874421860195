use mortgage_advisor::{advisor::MortgageAdvisor, config::AdvisorConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: ask <mortgage question>");
        std::process::exit(2);
    }

    let config = AdvisorConfig::from_env();
    let advisor = MortgageAdvisor::from_config(&config)?;

    let answer = advisor.answer(&question).await;
    println!("{}", serde_json::to_string_pretty(&answer)?);

    Ok(())
}
