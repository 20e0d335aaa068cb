use lazy_static::lazy_static;
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::collections::HashSet;

use crate::schedule::{Assignment, Schedule, ScheduleConfig};

lazy_static! {
    // Characters XLSX forbids in worksheet names.
    static ref SHEET_NAME_FORBIDDEN: Regex = Regex::new(r"[\[\]:*?/\\]").unwrap();
}

// XLSX caps worksheet names at 31 characters.
const SHEET_NAME_MAX: usize = 31;

/// The text shown for one cell in exports: `"{subject} - {teacher}"` when a
/// teacher is assigned, the bare subject otherwise (so an empty cell exports
/// as an empty string).
fn cell_text(assignment: &Assignment) -> String {
    if assignment.teacher.is_empty() {
        assignment.subject.clone()
    } else {
        format!("{} - {}", assignment.subject, assignment.teacher)
    }
}

/// One class's table: class name row, then a header row of "Day" plus the
/// period labels, then one row per day. This layout is the contract shared
/// by every export format.
fn class_rows(
    class_index: usize,
    schedule: &Schedule,
    config: &ScheduleConfig,
) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(config.days.len() + 2);

    rows.push(vec![config.class_names[class_index].clone()]);

    let mut header = Vec::with_capacity(config.time_slots.len() + 1);
    header.push("Day".to_string());
    for slot in &config.time_slots {
        header.push(slot.label());
    }
    rows.push(header);

    for (day_index, day) in config.days.iter().enumerate() {
        let mut row = Vec::with_capacity(config.time_slots.len() + 1);
        row.push(day.clone());
        for slot_index in 0..config.time_slots.len() {
            row.push(cell_text(schedule.cell(class_index, day_index, slot_index)));
        }
        rows.push(row);
    }

    rows
}

/// Convert the timetable to CSV format
///
/// One table per class, in configured class order, separated by a blank
/// line. Values containing commas, quotes or newlines are quoted and
/// escaped.
pub fn to_csv(schedule: &Schedule, config: &ScheduleConfig) -> String {
    let mut csv_content = String::new();

    for class_index in 0..config.class_names.len() {
        if class_index > 0 {
            csv_content.push('\n');
        }
        for row in class_rows(class_index, schedule, config) {
            for (column, value) in row.iter().enumerate() {
                if column > 0 {
                    csv_content.push(',');
                }
                if value.contains(',') || value.contains('"') || value.contains('\n') {
                    let escaped = value.replace('"', "\"\"");
                    csv_content.push_str(&format!("\"{}\"", escaped));
                } else {
                    csv_content.push_str(value);
                }
            }
            csv_content.push('\n');
        }
    }

    csv_content
}

/// Convert the timetable to XLSX format
///
/// Builds one worksheet per class with the shared tabular layout and
/// text-wrap formatting on every written cell, and returns the workbook as
/// bytes ready to download.
pub fn to_xlsx(schedule: &Schedule, config: &ScheduleConfig) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let wrap = Format::new().set_text_wrap();
    let mut used_names = HashSet::new();

    for class_index in 0..config.class_names.len() {
        let mut worksheet = Worksheet::new();
        let name = sheet_name(&config.class_names[class_index], class_index, &mut used_names);
        worksheet.set_name(&name)?;

        for (r, row) in class_rows(class_index, schedule, config).iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                worksheet.write_string_with_format(r as u32, c as u16, value.as_str(), &wrap)?;
            }
        }

        workbook.push_worksheet(worksheet);
    }

    workbook.save_to_buffer()
}

/// Derives a legal, unique worksheet name from a class name: strips the
/// characters XLSX rejects, enforces the length cap, falls back to a
/// positional name for empty results and suffixes duplicates.
fn sheet_name(class_name: &str, class_index: usize, used: &mut HashSet<String>) -> String {
    let cleaned = SHEET_NAME_FORBIDDEN.replace_all(class_name, " ");
    let mut base: String = cleaned.trim().chars().take(SHEET_NAME_MAX).collect();
    if base.is_empty() {
        base = format!("Class {}", class_index + 1);
    }

    let mut candidate = base.clone();
    let mut attempt = 2;
    while !used.insert(candidate.clone()) {
        let suffix = format!(" ({})", attempt);
        let keep = SHEET_NAME_MAX.saturating_sub(suffix.chars().count());
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        attempt += 1;
    }

    candidate
}
