use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::Path;

use feedbackloop_logging::{read_feedback_log, FeedbackRecord, FeedbackStats};

#[derive(Subcommand, Debug)]
pub enum FeedbackAction {
    /// List recorded feedback
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_feedback_command(action: FeedbackAction, feedback_file: &Path) -> Result<()> {
    let records = read_feedback_log(feedback_file)?;

    match action {
        FeedbackAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!(
                    "{}",
                    format!("No feedback found in {}.", feedback_file.display()).dimmed()
                );
            } else {
                print_feedback_table(&records);
            }
        }
        FeedbackAction::Stats { json } => {
            let stats = FeedbackStats::from_records(&records);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
    }

    Ok(())
}

fn print_feedback_table(records: &[FeedbackRecord]) {
    println!(
        "{:<20} {:<7} {:<10} {}",
        "TIMESTAMP".dimmed(),
        "RATING".dimmed(),
        "SENTIMENT".dimmed(),
        "REVIEW".dimmed(),
    );

    for r in records {
        let ts = r
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let sentiment = match r.sentiment.as_str() {
            "Positive" => r.sentiment.bright_green().to_string(),
            "Negative" => r.sentiment.bright_red().to_string(),
            "Neutral" => r.sentiment.bright_yellow().to_string(),
            _ => r.sentiment.dimmed().to_string(),
        };

        println!(
            "{:<20} {:<7} {:<10} {}",
            ts,
            format!("{}/5", r.rating),
            sentiment,
            preview(&r.review, 60)
        );
    }
}

fn print_stats(stats: &FeedbackStats) {
    println!("{}", "=== Feedback Statistics ===".bright_blue().bold());
    println!("{}  {}", "Total Entries:".dimmed(), stats.count);
    match stats.mean_rating {
        Some(mean) => println!("{}  {:.2}/5", "Mean Rating:".dimmed(), mean),
        None => println!("{}  -", "Mean Rating:".dimmed()),
    }

    if stats.count == 0 {
        return;
    }

    println!();
    println!("{}", "Ratings:".dimmed());
    for (rating, count) in stats.ratings.iter().rev() {
        println!("  {} {:<4} {}", rating, count, "#".repeat(*count).bright_blue());
    }

    println!();
    println!("{}", "Sentiment:".dimmed());
    for (label, count) in &stats.sentiments {
        println!("  {:<10} {}", label, count);
    }
}

/// Shorten to `max` characters on a char boundary
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
