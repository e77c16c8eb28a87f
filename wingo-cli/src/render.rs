use comfy_table::{presets::UTF8_FULL, Table};
use wingo_core::harness::StepStatus;
use wingo_core::{RunReport, StatsVerdict, Step, TrialResult};

/// Console rendering of a finished run.
pub fn render_report(report: &RunReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    for record in &report.steps {
        // the bet and win-rate steps get their own section below
        if matches!(record.step, Step::PlaceBets | Step::EvaluateWinRate) && record.is_completed() {
            continue;
        }

        match &record.status {
            StepStatus::Completed { .. } if record.step == Step::ReadBalance => {
                let balance = report.balance.unwrap_or_default();
                lines.push(format!("✅ User balance: ₹{}", balance));
            }
            StepStatus::Completed { detail: Some(detail) } => {
                lines.push(format!("✅ {} ({})", record.step, detail));
            }
            StepStatus::Completed { detail: None } => {
                lines.push(format!("✅ {}", record.step));
            }
            StepStatus::Failed(failure) => {
                lines.push(format!("❌ {}", failure));
                if failure.status.is_some() {
                    lines.push(format!("   {}", failure.message));
                }
            }
        }
    }

    if !report.trials.is_empty() {
        lines.push("\n🎮 Bet trials".to_string());
        lines.push(trial_table(report).to_string());
    }

    if let Some(verdict) = &report.verdict {
        lines.push(format!(
            "\n📊 Game Results: {} wins, {} losses",
            report.stats.wins, report.stats.losses
        ));
        if let Some(rate) = report.win_rate_percent() {
            lines.push(format!("📊 Win Rate: {:.1}%", rate));
            lines.push(format!(
                "📊 Staked ₹{}, won ₹{}, net ₹{}",
                report.payout.staked,
                report.payout.won,
                report.payout.net()
            ));
        }

        lines.push(match verdict {
            StatsVerdict::Acceptable { .. } => "✅ Game logic appears to be working".to_string(),
            StatsVerdict::OutOfBand { .. } => format!("❌ Win rate seems unusual: {}", verdict),
            StatsVerdict::NoSuccessfulBets => "❌ No successful bets".to_string(),
        });
    }

    lines.push(if report.passed {
        "\n✅ Run passed".to_string()
    } else {
        "\n❌ Run failed".to_string()
    });

    lines.join("\n") + "\n"
}

fn trial_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Bet", "Result", "Number", "Color", "Won"]);

    for trial in &report.trials {
        let row = match &trial.result {
            TrialResult::Settled(outcome) => vec![
                trial.index.to_string(),
                if trial.is_win() { "WIN" } else { "LOSS" }.to_string(),
                outcome.result_number.clone(),
                outcome.result_color.clone(),
                format!("₹{}", outcome.win_amount),
            ],
            TrialResult::Failed { kind, status, .. } => vec![
                trial.index.to_string(),
                match status {
                    Some(code) => format!("FAILED ({})", code),
                    None => format!("FAILED ({})", kind),
                },
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ],
        };
        table.add_row(row);
    }

    table
}
