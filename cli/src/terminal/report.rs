//! Tabular rendering of a finished [`Report`].
//!
//! Produces plain lines (with colour codes) so the caller decides where they go.
//! Column widths are measured on the uncoloured text.

use std::time::Duration;

use colored::*;
use geotally_common::network::country::Attribution;
use geotally_common::network::pair::Role;
use geotally_core::distribution::{Distribution, DistributionRow};
use geotally_core::pipeline::Report;
use geotally_core::pool::AddressCountryMap;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;

const UNRESOLVED: &str = "-";

struct Cell {
    text: String,
    color: Color,
}

impl Cell {
    fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    fn blank() -> Self {
        Self::new("", colors::TEXT_DEFAULT)
    }

    fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }

    fn padded(&self, width: usize) -> String {
        let fill = " ".repeat(width.saturating_sub(self.width()));
        format!("{}{}", self.text.color(self.color), fill)
    }
}

pub struct ReportRenderer {
    trace: bool,
}

impl ReportRenderer {
    pub fn new(trace: bool) -> Self {
        Self { trace }
    }

    pub fn render(&self, report: &Report) -> Vec<String> {
        let mut lines = distribution_table(&report.distribution);
        if self.trace {
            lines.extend(trace_table(&report.mapping));
        }
        lines.push(elapsed_line(report.elapsed));
        lines
    }
}

/// Source and destination distributions side by side.
fn distribution_table(distribution: &Distribution) -> Vec<String> {
    let source = role_cells(distribution.rows(Role::Source));
    let destination = role_cells(distribution.rows(Role::Destination));
    let height = source.len().max(destination.len());

    let mut source = source.into_iter();
    let mut destination = destination.into_iter();
    let rows: Vec<Vec<Cell>> = (0..height)
        .map(|_| {
            vec![
                source.next().unwrap_or_else(Cell::blank),
                destination.next().unwrap_or_else(Cell::blank),
            ]
        })
        .collect();

    let headers = [Role::Source.to_string(), Role::Destination.to_string()];
    table(&headers, &rows)
}

/// One `COUNTRY  xx.xx %` cell per row, aligned within the role.
fn role_cells(rows: &[DistributionRow]) -> Vec<Cell> {
    let labels: Vec<&str> = rows.iter().map(|row| row.attribution.label()).collect();
    let percentages: Vec<String> = rows
        .iter()
        .map(|row| format!("{:.2}", row.rounded_percentage()))
        .collect();

    let label_width = labels.iter().map(|l| UnicodeWidthStr::width(*l)).max().unwrap_or(0);
    let pct_width = percentages.iter().map(String::len).max().unwrap_or(0);

    rows.iter()
        .zip(labels.iter().zip(percentages.iter()))
        .map(|(row, (label, pct))| {
            let fill = " ".repeat(label_width - UnicodeWidthStr::width(*label));
            let text = format!("{label}{fill}  {pct:>pct_width$} %");
            Cell::new(text, attribution_color(&row.attribution))
        })
        .collect()
}

fn attribution_color(attribution: &Attribution) -> Color {
    if attribution.is_local() {
        colors::LOCAL
    } else {
        colors::COUNTRY
    }
}

/// Every looked-up address in the order it was first seen.
fn trace_table(mapping: &AddressCountryMap) -> Vec<String> {
    let rows: Vec<Vec<Cell>> = mapping
        .iter()
        .map(|(addr, country)| {
            let country = match country {
                Some(code) => Cell::new(code.as_str(), colors::COUNTRY),
                None => Cell::new(UNRESOLVED, colors::LOCAL),
            };
            vec![Cell::new(addr.to_string(), colors::IPV4_ADDR), country]
        })
        .collect();

    table(&["IP".to_string(), "Country".to_string()], &rows)
}

fn elapsed_line(elapsed: Duration) -> String {
    format!(
        "Elapsed time: {} sec",
        format!("{:.3}", elapsed.as_secs_f64()).bold().yellow()
    )
}

fn table(headers: &[String], rows: &[Vec<Cell>]) -> Vec<String> {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(Cell::width)
                .chain(std::iter::once(UnicodeWidthStr::width(header.as_str())))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let border = |left: &str, mid: &str, right: &str| -> String {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(mid))
            .color(colors::SEPARATOR)
            .to_string()
    };
    let bar = "│".color(colors::SEPARATOR).to_string();
    let line = |cells: Vec<String>| -> String {
        let inner: Vec<String> = cells.iter().map(|c| format!(" {c} ")).collect();
        format!("{bar}{}{bar}", inner.join(bar.as_str()))
    };

    let mut lines = vec![border("┌", "┬", "┐")];
    lines.push(line(
        headers
            .iter()
            .zip(&widths)
            .map(|(header, &w)| Cell::new(header.as_str(), colors::PRIMARY).padded(w))
            .collect(),
    ));
    lines.push(border("├", "┼", "┤"));
    for row in rows {
        lines.push(line(
            row.iter().zip(&widths).map(|(cell, &w)| cell.padded(w)).collect(),
        ));
    }
    lines.push(border("└", "┴", "┘"));
    lines
}
