//! Plain-text rendering of screens for the terminal.

use std::fmt::Write;

use chrono::DateTime;
use client_core::{
    catalog::ListEntity,
    listing::{parse_timestamp, ListView},
    screens::{ListScreen, MutationNotice, ScreenStatus},
    AuthSession,
};
use shared::domain::{Assessment, DashboardStats, Quiz, QuizQuestion, Resource, UserDetails, UserSummary};

const EMPTY_CELL: &str = "-";

/// A record that can be laid out as one table row.
pub trait TableRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn text(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(EMPTY_CELL)
        .to_string()
}

/// Calendar date of a backend timestamp, or `-` when it does not parse.
pub fn date(value: Option<&str>) -> String {
    let millis = parse_timestamp(value);
    if millis == 0 {
        return EMPTY_CELL.to_string();
    }
    DateTime::from_timestamp_millis(millis)
        .map(|parsed| parsed.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| EMPTY_CELL.to_string())
}

impl TableRow for UserSummary {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "EMAIL", "STATUS", "JOINED"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            text(self.name.as_deref()),
            text(self.email.as_deref()),
            text(self.status.as_deref()),
            date(self.created_at.as_deref()),
        ]
    }
}

impl TableRow for Quiz {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "CLIENT", "STATUS", "DATE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            text(self.title.as_deref()),
            text(self.client.as_deref()),
            text(self.status.as_deref()),
            date(self.date.as_deref()),
        ]
    }
}

impl TableRow for QuizQuestion {
    const HEADERS: &'static [&'static str] = &["ID", "QUESTION", "TYPE", "OPTIONS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            text(self.prompt.as_deref()),
            text(self.question_type.as_deref()),
            self.options.len().to_string(),
        ]
    }
}

impl TableRow for Assessment {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "TITLE",
        "TYPE",
        "STATUS",
        "SUBMISSIONS",
        "AVG SCORE",
        "UPDATED",
        "CREATED",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            text(self.title.as_deref()),
            text(self.assessment_type.as_deref()),
            text(self.status.as_deref()),
            self.total_submissions
                .map(|count| count.to_string())
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
            self.average_score
                .map(|score| format!("{score:.1}%"))
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
            date(self.last_updated.as_deref()),
            date(self.created_date.as_deref()),
        ]
    }
}

impl TableRow for Resource {
    const HEADERS: &'static [&'static str] =
        &["ID", "TITLE", "CATEGORY", "TYPE", "ENGAGEMENT", "STATUS", "DATE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            text(self.title.as_deref()),
            text(self.category.as_deref()),
            text(self.resource_type.as_deref()),
            self.metric(),
            text(self.status.as_deref()),
            date(self.date.as_deref()),
        ]
    }
}

/// Left-aligned columns padded to the widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|header| header.to_string()).collect();
    push_row(&mut out, &widths, &header_cells);
    for row in rows {
        push_row(&mut out, &widths, row);
    }
    out
}

fn push_row(out: &mut String, widths: &[usize], cells: &[String]) {
    let line: Vec<String> = widths
        .iter()
        .zip(cells)
        .map(|(&width, cell)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

pub fn list_view<T: ListEntity + TableRow>(view: &ListView<T>) -> String {
    if view.records.is_empty() {
        return format!("No {} found.\n", T::PLURAL);
    }
    let rows: Vec<Vec<String>> = view.records.iter().map(|record| record.cells()).collect();
    let mut out = table(T::HEADERS, &rows);
    let _ = writeln!(
        out,
        "\nPage {} of {} ({} {})",
        view.page,
        view.total_pages,
        view.filtered_count,
        T::PLURAL
    );
    out
}

pub fn notice(notice: &MutationNotice) -> String {
    match notice {
        MutationNotice::Success(message) => format!("✓ {message}"),
        MutationNotice::Failure(message) => format!("✗ {message}"),
    }
}

pub fn screen<T: ListEntity + TableRow>(screen: &ListScreen<T>) -> String {
    let mut out = String::new();
    if let Some(current) = screen.notice() {
        let _ = writeln!(out, "{}\n", notice(current));
    }
    match screen.status() {
        // A mutation rejected before dispatch never loads the list.
        ScreenStatus::Loading if screen.notice().is_some() => {}
        ScreenStatus::Loading => out.push_str("Loading...\n"),
        ScreenStatus::Failed(message) => {
            let _ = writeln!(out, "Failed to load {}: {message}", T::PLURAL);
        }
        ScreenStatus::Ready => out.push_str(&list_view(&screen.view())),
    }
    out
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total quizzes:     {}", stats.total_quizzes);
    let _ = writeln!(out, "Total users:       {}", stats.total_users);
    let _ = writeln!(out, "Total assessments: {}", stats.total_assessments);

    out.push_str("\nRecent activity\n");
    if stats.recent_activity.is_empty() {
        out.push_str("No recent activity.\n");
    } else {
        let rows: Vec<Vec<String>> = stats
            .recent_activity
            .iter()
            .map(|entry| {
                vec![
                    entry.activity.clone(),
                    text(entry.user.as_deref()),
                    date(entry.date.as_deref()),
                ]
            })
            .collect();
        out.push_str(&table(&["ACTIVITY", "USER", "DATE"], &rows));
    }

    if !stats.system_alerts.is_empty() {
        out.push_str("\nSystem alerts\n");
        let rows: Vec<Vec<String>> = stats
            .system_alerts
            .iter()
            .map(|alert| vec![alert.title.clone(), date(alert.date.as_deref())])
            .collect();
        out.push_str(&table(&["ALERT", "DATE"], &rows));
    }
    out
}

pub fn user_details(details: &UserDetails) -> String {
    let count = |value: Option<u64>| value.map(|v| v.to_string()).unwrap_or_else(|| "0".into());
    let fields = [
        ("ID", details.id.to_string()),
        ("Name", text(details.name.as_deref())),
        ("Email", text(details.email.as_deref())),
        ("Phone", text(details.phone.as_deref())),
        ("Status", details.status().to_string()),
        ("Joined", date(details.created_at.as_deref())),
        ("Last active", date(details.updated_at.as_deref())),
        ("Quizzes taken", count(details.total_quizzes)),
        ("Assessments", count(details.total_assessments)),
        (
            "Completion rate",
            details.completion_rate.clone().unwrap_or_else(|| "0%".to_string()),
        ),
    ];
    let mut out = String::new();
    for (label, value) in fields {
        let _ = writeln!(out, "{label:<16}{value}");
    }
    out
}

pub fn session(session: &AuthSession) -> String {
    let mut out = format!("Signed in as {}", session.user.display_name());
    if let Some(email) = session.user.email.as_deref() {
        if session.user.name.is_some() {
            let _ = write!(out, " <{email}>");
        }
    }
    if let Some(role) = session.user.role.as_deref() {
        let _ = write!(out, " ({role})");
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
