use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use lotto_db::models::{DrawRecord, Wheel};
use lotto_features::windows::FeatureSet;
use lotto_stats::delay::{Delay, NumberDelay};
use lotto_stats::frequency::NumberCount;
use lotto_stats::patterns::{PatternSummary, DECADES};

use crate::import::ImportResult;

pub const DISCLAIMER: &str =
    "Lotto draws are independent random events: these figures describe the past and have no predictive power.";

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[&DrawRecord]) {
    if draws.is_empty() {
        println!("No draws to show.");
        return;
    }

    let mut table = new_table(vec!["Date", "Wheel", "Numbers"]);
    for draw in draws {
        let numbers = if draw.is_complete() {
            Cell::new(format_numbers(draw.numbers()))
        } else {
            Cell::new(format_numbers(draw.numbers())).fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(draw.date().format("%Y-%m-%d")),
            Cell::new(draw.wheel().name()),
            numbers,
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    let report = &result.report;
    println!("Import done (store v{}):", result.version);
    println!("  Rows read      : {}", report.total_rows);
    println!("  Loaded         : {}", report.loaded);
    println!("  Stored         : {}", result.stored);
    if report.rejected > 0 {
        println!("  Rejected       : {}", report.rejected);
    }
    if !report.unknown_wheels.is_empty() {
        let codes: Vec<&str> = report.unknown_wheels.iter().map(String::as_str).collect();
        println!("  Unknown wheels : {}", codes.join(", "));
    }
}

pub fn display_ranked(wheel: &Wheel, window: usize, most: &[NumberCount], least: &[NumberCount]) {
    println!("\n── {} : last {} draws ──", wheel, window);
    let mut table = new_table(vec!["#", "Most frequent", "Freq.", "Least frequent", "Freq."]);
    for i in 0..most.len().max(least.len()) {
        let cell = |c: Option<&NumberCount>, color: Color| match c {
            Some(c) => (
                Cell::new(format!("{:2}", c.number)).fg(color),
                Cell::new(c.frequency),
            ),
            None => (Cell::new(""), Cell::new("")),
        };
        let (mn, mf) = cell(most.get(i), Color::Green);
        let (ln, lf) = cell(least.get(i), Color::Red);
        table.add_row(vec![Cell::new(i + 1), mn, mf, ln, lf]);
    }
    println!("{table}");
}

pub fn display_delays(wheel: &Wheel, as_of: chrono::NaiveDate, delays: &[NumberDelay]) {
    println!("\n── {} : delays as of {} ──", wheel, as_of);
    let mut table = new_table(vec!["Number", "Delay (days)"]);
    for d in delays {
        let delay = match d.delay {
            Delay::NeverSeen => Cell::new(d.delay).fg(Color::DarkGrey),
            Delay::Days(_) => Cell::new(d.delay),
        };
        table.add_row(vec![Cell::new(format!("{:2}", d.number)), delay]);
    }
    println!("{table}");
}

fn or_none<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "—".to_string(), |v| v.to_string())
}

pub fn display_patterns(summary: &PatternSummary) {
    println!(
        "\n── {} : patterns over {} draws (window {}) ──",
        summary.wheel, summary.draws, summary.window
    );
    if summary.skipped > 0 {
        println!("  {} incomplete draws skipped", summary.skipped);
    }

    let mut splits = new_table(vec!["Split", "Odd-Even", "Low-High"]);
    for ((class, odd), (_, low)) in summary.odd_even.classes().zip(summary.low_high.classes()) {
        splits.add_row(vec![class.to_string(), odd.to_string(), low.to_string()]);
    }
    println!("{splits}");
    println!(
        "  Most common odd-even: {}   low-high: {}",
        or_none(summary.odd_even.most_common()),
        or_none(summary.low_high.most_common())
    );

    let mut pairs = new_table(vec!["Adjacent pairs", "Draws"]);
    for (n, count) in summary.adjacent_pairs.classes() {
        pairs.add_row(vec![n.to_string(), count.to_string()]);
    }
    println!("{pairs}");
    println!(
        "  Most common adjacent pairs: {}",
        or_none(summary.adjacent_pairs.most_common())
    );

    let mut decades = new_table(vec!["Decade", "Avg numbers per draw"]);
    for d in 0..DECADES {
        decades.add_row(vec![
            format!("{}-{}", d * 10 + 1, d * 10 + 10),
            format!("{:.2}", summary.decade_share[d]),
        ]);
    }
    println!("{decades}");
}

pub fn display_absent(wheel: &Wheel, latest: &DrawRecord, absent: &[u8]) {
    println!(
        "\n── {} : {} numbers absent from the draw of {} ({}) ──",
        wheel,
        absent.len(),
        latest.date(),
        format_numbers(latest.numbers())
    );
    for chunk in absent.chunks(15) {
        println!("  {}", chunk.iter().map(|n| format!("{:2}", n)).collect::<Vec<_>>().join(" "));
    }
}

pub fn display_feature_set(set: &FeatureSet) {
    println!("\n── {} : features (window {}) ──", set.wheel, set.window);
    println!("  Samples        : {}", set.len());
    println!("  Feature width  : {}", set.n_features());
    println!("  Label width    : {}", set.labels.ncols());

    let mut table = new_table(vec!["Position", "Min", "Max"]);
    for (i, (lo, hi)) in set
        .scaler
        .data_min()
        .iter()
        .zip(set.scaler.data_max().iter())
        .enumerate()
    {
        table.add_row(vec![(i + 1).to_string(), format!("{lo:.0}"), format!("{hi:.0}")]);
    }
    println!("{table}");
}

pub struct ModelReport {
    pub name: String,
    pub mse: f64,
    pub mae: f64,
    pub next: Vec<u8>,
}

pub fn display_forecast(wheel: &Wheel, train: usize, test: usize, reports: &[ModelReport]) {
    println!("\n── {} : baseline forecast ({} train / {} test samples) ──", wheel, train, test);
    let mut table = new_table(vec!["Model", "Test MSE", "Test MAE", "Next draw"]);
    for r in reports {
        table.add_row(vec![
            Cell::new(&r.name),
            Cell::new(format!("{:.4}", r.mse)),
            Cell::new(format!("{:.4}", r.mae)),
            Cell::new(format_numbers(&r.next)).fg(Color::Yellow),
        ]);
    }
    println!("{table}");
    println!("\n{}", DISCLAIMER);
}
