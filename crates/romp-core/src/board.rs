use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two board rows a section lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Row {
    Top,
    Bottom,
}

impl Row {
    pub fn label(self) -> &'static str {
        match self {
            Row::Top => "top",
            Row::Bottom => "bottom",
        }
    }
}

/// Ids are opaque strings: we generate uuids, but anything already stored
/// (the web predecessor wrote `sec_`/`todo_`-prefixed ids) is kept verbatim.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(text: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            text: normalize_text(text),
            completed: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    pub todos: Vec<Todo>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.trim().to_string(),
            todos: vec![],
        }
    }

    /// Render order: incomplete items first, then completed, each partition
    /// ascending by creation time. The stored order is left untouched.
    pub fn display_order(&self) -> Vec<&Todo> {
        let mut ordered: Vec<&Todo> = self.todos.iter().filter(|t| !t.completed).collect();
        ordered.sort_by_key(|t| t.created_at);
        let mut done: Vec<&Todo> = self.todos.iter().filter(|t| t.completed).collect();
        done.sort_by_key(|t| t.created_at);
        ordered.extend(done);
        ordered
    }

    pub fn open_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }
}

/// The whole persisted document: two independently ordered rows of sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub sections_top: Vec<Section>,
    pub sections_bottom: Vec<Section>,
}

impl Board {
    /// The default document used when nothing has been stored yet.
    pub fn seeded() -> Self {
        Self {
            sections_top: vec![Section::new("Today"), Section::new("This Week")],
            sections_bottom: vec![Section::new("Someday")],
        }
    }

    pub fn row(&self, row: Row) -> &Vec<Section> {
        match row {
            Row::Top => &self.sections_top,
            Row::Bottom => &self.sections_bottom,
        }
    }

    pub fn row_mut(&mut self, row: Row) -> &mut Vec<Section> {
        match row {
            Row::Top => &mut self.sections_top,
            Row::Bottom => &mut self.sections_bottom,
        }
    }

    /// All sections across both rows, top row first.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections_top.iter().chain(self.sections_bottom.iter())
    }

    /// Current position of a section in the live document.
    pub fn locate_section(&self, id: &str) -> Option<(Row, usize)> {
        for row in [Row::Top, Row::Bottom] {
            if let Some(idx) = self.row(row).iter().position(|s| s.id == id) {
                return Some((row, idx));
            }
        }
        None
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections_top
            .iter_mut()
            .chain(self.sections_bottom.iter_mut())
            .find(|s| s.id == id)
    }

    /// Removes a section by id, wherever it currently sits.
    pub fn remove_section(&mut self, id: &str) -> Option<Section> {
        let (row, idx) = self.locate_section(id)?;
        Some(self.row_mut(row).remove(idx))
    }

    /// The section currently owning the given todo.
    pub fn owner_of(&self, todo_id: &str) -> Option<&Section> {
        self.sections()
            .find(|s| s.todos.iter().any(|t| t.id == todo_id))
    }

    pub fn todo_mut(&mut self, todo_id: &str) -> Option<&mut Todo> {
        self.sections_top
            .iter_mut()
            .chain(self.sections_bottom.iter_mut())
            .flat_map(|s| s.todos.iter_mut())
            .find(|t| t.id == todo_id)
    }

    /// Removes a todo from whichever section owns it.
    pub fn remove_todo(&mut self, todo_id: &str) -> Option<Todo> {
        let owner_id = self.owner_of(todo_id)?.id.clone();
        let owner = self.section_mut(&owner_id)?;
        let at = owner.todos.iter().position(|t| t.id == todo_id)?;
        Some(owner.todos.remove(at))
    }
}

/// Text normalization applied on creation and on every edit: trim, then
/// uppercase the first character. Nothing else (no forced punctuation).
pub fn normalize_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{Board, Section, Todo, normalize_text};

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn normalizes_text_on_creation() {
        let todo = Todo::new("  buy milk  ", at(0));
        assert_eq!(todo.text, "Buy milk");
        assert!(!todo.completed);
    }

    #[test]
    fn normalize_keeps_everything_after_first_char() {
        assert_eq!(normalize_text("wash the CAR."), "Wash the CAR.");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
        assert_eq!(normalize_text("étude"), "Étude");
    }

    #[test]
    fn seeded_board_has_three_sections_with_unique_ids() {
        let board = Board::seeded();
        assert_eq!(board.sections_top.len(), 2);
        assert_eq!(board.sections_bottom.len(), 1);

        let mut ids: Vec<_> = board.sections().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn display_order_puts_incomplete_before_completed() {
        let mut section = Section::new("Today");
        let mut done = Todo::new("done early", at(1));
        done.completed = true;
        let open = Todo::new("open later", at(2));
        section.todos = vec![done.clone(), open.clone()];

        let ordered: Vec<_> = section.display_order().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ordered, vec![open.id.clone(), done.id.clone()]);
        // Stored order is never rewritten by the display rule.
        assert_eq!(section.todos[0].id, done.id);
    }

    #[test]
    fn display_order_sorts_each_partition_by_creation_time() {
        let mut section = Section::new("Today");
        let b = Todo::new("b", at(20));
        let a = Todo::new("a", at(10));
        let mut d = Todo::new("d", at(40));
        d.completed = true;
        let mut c = Todo::new("c", at(30));
        c.completed = true;
        section.todos = vec![b.clone(), d.clone(), a.clone(), c.clone()];

        let ordered: Vec<_> = section.display_order().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ordered, vec![a.id, b.id, c.id, d.id]);
    }

    #[test]
    fn locate_section_scans_both_rows() {
        let board = Board::seeded();
        let bottom_id = board.sections_bottom[0].id.clone();
        assert_eq!(
            board.locate_section(&bottom_id),
            Some((super::Row::Bottom, 0))
        );
        assert_eq!(board.locate_section("sec_nothere"), None);
    }

    #[test]
    fn foreign_string_ids_are_first_class() {
        let mut board = Board::seeded();
        board.sections_top[0].id = "sec_k3j2h1g0".to_string();
        let mut todo = Todo::new("call mom", at(0));
        todo.id = "todo_9f8e7d6c".to_string();
        board.sections_top[0].todos.push(todo);

        assert_eq!(board.locate_section("sec_k3j2h1g0"), Some((super::Row::Top, 0)));
        assert_eq!(
            board.owner_of("todo_9f8e7d6c").map(|s| s.id.as_str()),
            Some("sec_k3j2h1g0")
        );
        let removed = board.remove_todo("todo_9f8e7d6c").expect("todo present");
        assert_eq!(removed.text, "Call mom");
    }
}
