// BirthWindow - ui/report.rs
//
// Plain-text rendering of a session for the terminal: the slot table, the
// questions asked with their answers, and the final results.
// Pure functions over read-only models; the caller decides where text goes.

use crate::app::script::AnsweredQuestion;
use crate::core::export::slot_rows;
use crate::core::results::ResultSet;
use crate::core::timeline::Timeline;
use crate::util::constants;
use std::fmt::{Display, Write as _};

const SLOT_HEADER: [&str; 8] = [
    "#", "Start", "End", "Hour lord", "Ascendant", "Saturn", "Chiron", "Alive",
];

/// Slot table for `timeline`, followed by the window-end values if declared.
pub fn render_timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Birth window {} - {}",
        timeline.window_start(),
        timeline.window_end()
    );

    let rows: Vec<[String; 8]> = slot_rows(timeline)
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            [
                (index + 1).to_string(),
                row.start_time,
                row.end_time,
                row.hour_lord,
                row.ascendant_range,
                row.saturn_house_range,
                row.chiron_house_range,
                if row.alive { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();

    let mut widths = SLOT_HEADER.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    write_row(&mut out, &widths, &SLOT_HEADER);
    for row in &rows {
        write_row(&mut out, &widths, row);
    }

    if let (Some(endpoint), Some(span)) = (timeline.endpoint(), timeline.endpoint_span()) {
        let _ = writeln!(
            out,
            "Window end: {} rising, Saturn {}, Chiron {}",
            endpoint.ascendant, endpoint.saturn_house, endpoint.chiron_house
        );
        let _ = writeln!(
            out,
            "Last slot to window end: {} / Saturn {} / Chiron {}",
            join(&span.ascendants),
            join(&span.saturn_houses),
            join(&span.chiron_houses)
        );
    }
    out
}

fn write_row<S: AsRef<str>>(out: &mut String, widths: &[usize; 8], cells: &[S]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Every question asked, grouped under its step.
pub fn render_transcript(questions: &[AnsweredQuestion]) -> String {
    let mut out = String::new();
    let mut current_step = None;
    for question in questions {
        if current_step != Some(question.step) {
            let _ = writeln!(out, "\n== {} ==", question.step);
            current_step = Some(question.step);
        }
        let _ = writeln!(out, "[{}] {}", question.answer, question.subject);
        for text in &question.texts {
            let _ = writeln!(out, "    {text}");
        }
    }
    out
}

/// Surviving slots, likely traits, and surviving house pairs.
pub fn render_results(results: &ResultSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== Results ==");
    if results.is_empty() {
        let _ = writeln!(out, "No time slot survived the answers given.");
        return out;
    }

    let _ = writeln!(out, "Surviving slots:");
    for row in &results.surviving {
        let _ = writeln!(
            out,
            "  {} - {}  {}  ASC {}  Saturn {}  Chiron {}",
            row.start_time,
            row.end_time,
            row.hour_lord,
            empty_as_dash(&row.ascendant_range),
            row.saturn_house_range,
            row.chiron_house_range
        );
    }
    let _ = writeln!(out, "Likely ascendants: {}", or_dash(join(&results.likely_ascendants)));
    let _ = writeln!(out, "Likely hour lords: {}", or_dash(join(&results.likely_hour_lords)));
    let pairs: Vec<String> = results
        .final_pairs
        .iter()
        .map(|pair| format!("Saturn {} + Chiron {}", pair.saturn, pair.chiron))
        .collect();
    let _ = writeln!(out, "Saturn-Chiron combinations: {}", or_dash(pairs.join("; ")));
    out
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(constants::RANGE_JOIN_SEPARATOR)
}

fn empty_as_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

fn or_dash(text: String) -> String {
    if text.is_empty() {
        "-".to_string()
    } else {
        text
    }
}
