use clap::Args;
use wingo_core::{evaluate as classify, AcceptanceBand, WinStats};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Number of winning bets
    #[arg(short, long)]
    pub wins: u32,

    /// Number of losing bets
    #[arg(short, long)]
    pub losses: u32,

    /// Lower bound of the acceptance band, in percent
    #[arg(long, default_value_t = 0.0)]
    pub min: f64,

    /// Upper bound of the acceptance band, in percent
    #[arg(long, default_value_t = 50.0)]
    pub max: f64,
}

pub fn evaluate(args: EvaluateArgs) -> anyhow::Result<bool> {
    let band = AcceptanceBand::new(args.min, args.max);
    band.validate()?;

    let stats = WinStats::new(args.wins, args.losses);
    let verdict = classify(&stats, &band);

    println!("📊 Game Results: {} wins, {} losses", stats.wins, stats.losses);
    if let Some(rate) = stats.win_rate_percent() {
        println!("📊 Win Rate: {:.1}%", rate);
    }

    if verdict.is_acceptable() {
        println!("✅ {}", verdict);
    } else {
        println!("❌ {}", verdict);
    }

    Ok(verdict.is_acceptable())
}
