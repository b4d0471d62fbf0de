use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::config::Config;
use crate::datetime::format_due;
use crate::manager::TaskRow;

/// Capability boundary for display. The core hands over view-model rows and
/// never touches the output technology directly.
pub trait Present {
    fn render(&mut self, rows: &[TaskRow]) -> anyhow::Result<()>;
}

/// The id prefix shown to (and accepted back from) the user.
pub fn short_id(id: Uuid) -> String {
    let full = id.simple().to_string();
    full[..8].to_string()
}

#[derive(Debug, Clone)]
pub struct TableRenderer {
    color: bool,
    today: NaiveDate,
}

impl TableRenderer {
    pub fn new(cfg: &Config, today: NaiveDate) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color, today })
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl Present for TableRenderer {
    #[tracing::instrument(skip(self, rows))]
    fn render(&mut self, rows: &[TaskRow]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if rows.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "St".to_string(),
            "Pri".to_string(),
            "Due".to_string(),
            "Title".to_string(),
            "Description".to_string(),
        ];

        let mut table = Vec::with_capacity(rows.len());
        for row in rows {
            let id = self.paint(&short_id(row.id), "33");

            // "x" done, "*" being edited; both can apply at once
            let mut status = String::new();
            if row.completed {
                status.push('x');
            }
            if row.editing {
                status.push('*');
            }

            let due = format_due(row.due);
            let overdue = row.due.map(|d| d < self.today).unwrap_or(false);
            let due = if overdue && !row.completed {
                self.paint(&due, "31")
            } else {
                due
            };

            let title = if row.completed {
                self.paint(&row.title, "2")
            } else {
                row.title.clone()
            };

            table.push(vec![
                id,
                status,
                row.priority.as_str().to_string(),
                due,
                title,
                row.description.clone(),
            ]);
        }

        write_table(&mut out, headers, table)?;
        Ok(())
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
