use wingo_core::{Harness, HarnessConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("WINGO_BASE_URL").unwrap_or_else(|_| "http://localhost:8001/api".to_string());

    let mut config = HarnessConfig::new(base_url);
    config.unique_user = true;
    config.trial_count = 5;

    let harness = Harness::http(config)?;
    println!("Running against {}...", harness.config().base_url);

    let report = harness.run().await;

    println!("\nCompleted steps: {:?}", report.completed_steps());
    if let Some(failure) = report.failure() {
        println!("Stopped at: {}", failure);
    }
    if let Some(balance) = report.balance {
        println!("Balance after deposit: {}", balance);
    }
    println!(
        "Trials: {} wins, {} losses",
        report.stats.wins, report.stats.losses
    );
    if let Some(verdict) = &report.verdict {
        println!("Verdict: {}", verdict);
    }

    println!("\nPassed: {}", report.passed);

    Ok(())
}
