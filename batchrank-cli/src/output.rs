/// Output formatting: terminal table and JSON.
use anyhow::Result;
use batchrank_core::{SessionResult, StopReason};
use serde::Serialize;

#[derive(Serialize)]
struct JsonRankedItem {
    rank: usize,
    name: String,
    score: f64,
    /// `None` when the item never got two snapshots.
    uncertainty: Option<f64>,
}

#[derive(Serialize)]
struct JsonOutput {
    items: Vec<JsonRankedItem>,
    rounds: usize,
    confidence: f64,
    stop_reason: StopReason,
}

fn format_uncertainty(u: f64) -> String {
    if u.is_finite() {
        format!("{u:.2}")
    } else {
        "inf".to_string()
    }
}

fn describe_stop(reason: StopReason) -> &'static str {
    match reason {
        StopReason::ConfidenceReached => "confidence threshold reached",
        StopReason::MaxRounds => "round limit reached",
    }
}

/// Render results as a terminal table.
pub fn render_table(result: &SessionResult, names: &[String]) -> String {
    // Find the widest item name for padding
    let name_width = result
        .rankings
        .iter()
        .map(|r| names[r.item as usize].chars().count())
        .max()
        .unwrap_or(4)
        .max(4); // at least "Item"

    let mut out = String::new();
    out.push_str(&format!(" # | {:<name_width$} |   Score | Uncertainty\n", "Item"));
    out.push_str(&format!("---|-{}-|---------|------------\n", "-".repeat(name_width)));

    for (i, r) in result.rankings.iter().enumerate() {
        out.push_str(&format!(
            "{:>2} | {:<name_width$} | {:>7.2} | {:>11}\n",
            i + 1,
            names[r.item as usize],
            r.score,
            format_uncertainty(r.uncertainty),
        ));
    }

    out.push_str(&format!(
        "\n{} items ranked across {} rounds ({}, average confidence {:.2})\n",
        result.rankings.len(),
        result.rounds_completed,
        describe_stop(result.stop_reason),
        result.confidence,
    ));
    out
}

pub fn print_table(result: &SessionResult, names: &[String]) {
    print!("{}", render_table(result, names));
}

/// Render results as pretty JSON.
pub fn render_json(result: &SessionResult, names: &[String]) -> Result<String> {
    let items: Vec<JsonRankedItem> = result
        .rankings
        .iter()
        .enumerate()
        .map(|(i, r)| JsonRankedItem {
            rank: i + 1,
            name: names[r.item as usize].clone(),
            score: r.score,
            uncertainty: r.uncertainty.is_finite().then_some(r.uncertainty),
        })
        .collect();

    let output = JsonOutput {
        items,
        rounds: result.rounds_completed,
        confidence: result.confidence,
        stop_reason: result.stop_reason,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn print_json(result: &SessionResult, names: &[String]) -> Result<()> {
    println!("{}", render_json(result, names)?);
    Ok(())
}
