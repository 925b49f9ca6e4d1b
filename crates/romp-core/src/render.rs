use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::board::{Board, Row, Section};
use crate::calendar::MonthGrid;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

/// Leading id characters, enough to address entities interactively.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.get_bool("color").unwrap_or(true),
        }
    }

    #[tracing::instrument(skip(self, board))]
    pub fn print_board(&self, board: &Board) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for row in [Row::Top, Row::Bottom] {
            let sections = board.row(row);
            writeln!(out, "{}", self.paint(&format!("== {} row ==", row.label()), "1"))?;
            if sections.is_empty() {
                writeln!(out, "  (empty)")?;
            }
            for section in sections {
                self.print_section(&mut out, section)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn print_section<W: Write>(&self, out: &mut W, section: &Section) -> anyhow::Result<()> {
        let header = format!(
            "{} [{}]  {} open / {} total",
            section.name,
            short_id(&section.id),
            section.open_count(),
            section.todos.len()
        );
        writeln!(out, "{}", self.paint(&header, "36"))?;
        writeln!(out, "{}", "-".repeat(UnicodeWidthStr::width(header.as_str())))?;

        for todo in section.display_order() {
            let mark = if todo.completed { "[x]" } else { "[ ]" };
            let line = format!("{mark} {}  {}", short_id(&todo.id), todo.text);
            if todo.completed {
                writeln!(out, "{}", self.paint(&line, "2"))?;
            } else {
                writeln!(out, "{line}")?;
            }
        }
        Ok(())
    }

    /// Month grid with Sunday-first weekday header; inferred dates carry a
    /// `*` marker and the current day is highlighted.
    #[tracing::instrument(skip(self, grid, marked))]
    pub fn print_calendar(
        &self,
        grid: &MonthGrid,
        marked: &BTreeSet<NaiveDate>,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let title = grid.title();
        writeln!(
            out,
            "{}{}",
            " ".repeat(title_pad(&title)),
            self.paint(&title, "1")
        )?;
        writeln!(out, " Su  Mo  Tu  We  Th  Fr  Sa")?;

        for week in grid.cells().chunks(7) {
            let mut line = String::new();
            for cell in week {
                match cell {
                    None => line.push_str("    "),
                    Some(day) => {
                        let date = grid.date_of(*day);
                        let flagged = date.is_some_and(|d| marked.contains(&d));
                        let cell_text = if flagged {
                            format!("{day:>3}*")
                        } else {
                            format!("{day:>3} ")
                        };
                        if date == Some(today) {
                            line.push_str(&self.paint(&cell_text, "7"));
                        } else if flagged {
                            line.push_str(&self.paint(&cell_text, "33"));
                        } else {
                            line.push_str(&cell_text);
                        }
                    }
                }
            }
            writeln!(out, "{}", line.trim_end())?;
        }

        if !marked.is_empty() {
            writeln!(out)?;
            writeln!(out, "* date mentioned in a task")?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Seven 4-column day cells, minus the trailing space.
const CALENDAR_WIDTH: usize = 7 * 4 - 1;

fn title_pad(title: &str) -> usize {
    CALENDAR_WIDTH.saturating_sub(UnicodeWidthStr::width(title)) / 2
}

#[cfg(test)]
mod tests {
    use super::{short_id, title_pad};

    #[test]
    fn titles_center_over_the_day_grid() {
        // "August 2026" is 11 columns wide against a 27-column grid.
        assert_eq!(title_pad("August 2026"), 8);
        assert_eq!(title_pad("May 2026"), 9);
        assert_eq!(title_pad("a title far wider than any month grid"), 0);
    }

    #[test]
    fn short_ids_survive_ids_shorter_than_the_cutoff() {
        assert_eq!(short_id("sec_k3j2h1g0"), "sec_k3j2");
        assert_eq!(short_id("ab12"), "ab12");
    }
}
