use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use woox::CycleReport;

use crate::error::AppError;

/// Write one cycle report to the writer.
///
/// TSV mode prints a `summary` line, one `order` line per fetched order and
/// one `point` line per series entry, or a single `error` line for a failed
/// cycle. JSON mode prints the whole report as one line.
pub fn write_report<W: Write>(
    report: &CycleReport,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), AppError> {
    if json_mode {
        serde_json::to_writer(&mut *writer, report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }

    let mut buf = String::new();

    if let Some(err) = &report.error {
        // TSV: error \t cycle \t kind \t message
        buf.push_str("error\t");
        buf.push_str(&report.cycle.to_string());
        buf.push('\t');
        buf.push_str(err.kind.as_str());
        buf.push('\t');
        push_field(&mut buf, &err.message);
        buf.push('\n');
    } else {
        // TSV: summary \t cycle \t pair \t start \t end \t orders \t total
        buf.push_str("summary\t");
        buf.push_str(&report.cycle.to_string());
        buf.push('\t');
        buf.push_str(&report.pair_filter.to_string());
        buf.push('\t');
        push_millis(&mut buf, report.window.start_ms);
        buf.push('\t');
        push_millis(&mut buf, report.window.end_ms);
        buf.push('\t');
        buf.push_str(&report.series.len().to_string());
        buf.push('\t');
        buf.push_str(&report.total_realized_pnl.to_string());
        buf.push('\n');

        // TSV: order \t created_date \t symbol \t realized_pnl
        for order in &report.orders {
            buf.push_str("order\t");
            buf.push_str(&order.created_date().to_string());
            buf.push('\t');
            push_field(&mut buf, &order.symbol);
            buf.push('\t');
            buf.push_str(&order.realized_pnl.to_string());
            buf.push('\n');
        }

        // TSV: point \t time \t cumulative_pnl
        for point in &report.series.points {
            buf.push_str("point\t");
            push_time(&mut buf, point.time);
            buf.push('\t');
            buf.push_str(&point.cumulative_pnl.to_string());
            buf.push('\n');
        }
    }

    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn push_time(buf: &mut String, time: DateTime<Utc>) {
    buf.push_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true));
}

fn push_millis(buf: &mut String, ms: i64) {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(t) => push_time(buf, t),
        None => buf.push_str(&ms.to_string()),
    }
}

/// Tabs and newlines would break the column layout.
fn push_field(buf: &mut String, text: &str) {
    buf.extend(text.chars().map(|c| if c == '\t' || c == '\n' { ' ' } else { c }));
}
