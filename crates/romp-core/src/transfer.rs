use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;

/// What a drag gesture carries from start to drop. Decoded once at the
/// boundary; everything past `decode` works with typed fields only. Ids are
/// opaque strings, whatever the document happens to hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferPayload {
    /// A section being moved. `from_index` records its position within its
    /// row at drag-start time and doubles as the duplicate-fire guard.
    SectionMove {
        section_id: String,
        from_index: usize,
    },
    /// A todo being moved out of its owning section.
    ItemMove {
        todo_id: String,
        from_section_id: String,
    },
}

impl TransferPayload {
    /// Fallible boundary decode. Anything malformed is discarded here so the
    /// move logic never re-validates shape.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(err) => {
                debug!(error = %err, "discarding undecodable transfer payload");
                None
            }
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Whether a drop actually mutated the document. Only `Moved` is worth
/// persisting and re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved,
    Ignored,
}

/// Applies a drop landing on the section identified by `target_id`. Every
/// failure mode (self-drop, unknown ids, stale or duplicate payloads) leaves
/// the document untouched and reports `Ignored`.
pub fn drop_on_section(
    board: &mut Board,
    payload: &TransferPayload,
    target_id: &str,
) -> DropOutcome {
    match payload {
        TransferPayload::SectionMove {
            section_id,
            from_index,
        } => move_section(board, section_id, *from_index, target_id),
        TransferPayload::ItemMove {
            todo_id,
            from_section_id,
        } => move_item(board, todo_id, from_section_id, target_id),
    }
}

fn move_section(
    board: &mut Board,
    section_id: &str,
    from_index: usize,
    target_id: &str,
) -> DropOutcome {
    if section_id == target_id {
        debug!(%section_id, "section dropped on itself");
        return DropOutcome::Ignored;
    }

    let Some((source_row, current_index)) = board.locate_section(section_id) else {
        debug!(%section_id, "moving section no longer exists");
        return DropOutcome::Ignored;
    };
    // Stale payload (most commonly a double-fired drop): the mover has
    // already left the position recorded at drag-start.
    if current_index != from_index {
        debug!(
            %section_id,
            from_index,
            current_index,
            "section payload index is stale"
        );
        return DropOutcome::Ignored;
    }

    // Target position is read from the live document before the removal so
    // a forward move lands after the target, matching drag expectations.
    let Some((target_row, target_index)) = board.locate_section(target_id) else {
        debug!(%target_id, "target section no longer exists");
        return DropOutcome::Ignored;
    };

    let Some(moving) = board.remove_section(section_id) else {
        return DropOutcome::Ignored;
    };
    let row = board.row_mut(target_row);
    let at = target_index.min(row.len());
    row.insert(at, moving);

    debug!(
        %section_id,
        from_row = source_row.label(),
        to_row = target_row.label(),
        at,
        "section moved"
    );
    DropOutcome::Moved
}

fn move_item(
    board: &mut Board,
    todo_id: &str,
    from_section_id: &str,
    target_id: &str,
) -> DropOutcome {
    // Within-section drag reordering is not a thing; same target is a no-op.
    if from_section_id == target_id {
        debug!(%todo_id, "item dropped on its own section");
        return DropOutcome::Ignored;
    }

    let Some(target) = board.section(target_id) else {
        debug!(%target_id, "target section no longer exists");
        return DropOutcome::Ignored;
    };
    if target.todos.iter().any(|t| t.id == todo_id) {
        debug!(%todo_id, %target_id, "target already holds item; duplicate drop");
        return DropOutcome::Ignored;
    }

    let Some(source) = board.section_mut(from_section_id) else {
        debug!(%from_section_id, "source section no longer exists");
        return DropOutcome::Ignored;
    };
    let Some(at) = source.todos.iter().position(|t| t.id == todo_id) else {
        debug!(%todo_id, %from_section_id, "item no longer in source section");
        return DropOutcome::Ignored;
    };

    let todo = source.todos.remove(at);
    match board.section_mut(target_id) {
        Some(target) => {
            target.todos.push(todo);
            debug!(%todo_id, %target_id, "item moved");
            DropOutcome::Moved
        }
        None => {
            if let Some(source) = board.section_mut(from_section_id) {
                source.todos.insert(at, todo);
            }
            DropOutcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{DropOutcome, TransferPayload, drop_on_section};
    use crate::board::{Board, Row, Section, Todo};

    fn three_section_board() -> Board {
        Board {
            sections_top: vec![Section::new("A"), Section::new("B"), Section::new("C")],
            sections_bottom: vec![Section::new("D")],
        }
    }

    fn top_names(board: &Board) -> Vec<&str> {
        board.sections_top.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn dropping_first_section_on_last_shifts_the_rest_left() {
        let mut board = three_section_board();
        let a = board.sections_top[0].id.clone();
        let c = board.sections_top[2].id.clone();

        let payload = TransferPayload::SectionMove {
            section_id: a,
            from_index: 0,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &c),
            DropOutcome::Moved
        );
        assert_eq!(top_names(&board), vec!["B", "C", "A"]);
    }

    #[test]
    fn dropping_last_section_on_first_moves_it_to_the_front() {
        let mut board = three_section_board();
        let a = board.sections_top[0].id.clone();
        let c = board.sections_top[2].id.clone();

        let payload = TransferPayload::SectionMove {
            section_id: c,
            from_index: 2,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &a),
            DropOutcome::Moved
        );
        assert_eq!(top_names(&board), vec!["C", "A", "B"]);
    }

    #[test]
    fn section_self_drop_is_a_no_op() {
        let mut board = three_section_board();
        let a = board.sections_top[0].id.clone();
        let payload = TransferPayload::SectionMove {
            section_id: a.clone(),
            from_index: 0,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &a),
            DropOutcome::Ignored
        );
        assert_eq!(top_names(&board), vec!["A", "B", "C"]);
    }

    #[test]
    fn refired_section_drop_is_discarded_as_stale() {
        let mut board = three_section_board();
        let a = board.sections_top[0].id.clone();
        let c = board.sections_top[2].id.clone();

        let payload = TransferPayload::SectionMove {
            section_id: a,
            from_index: 0,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &c),
            DropOutcome::Moved
        );
        // Same payload fires again: the mover is no longer at index 0.
        assert_eq!(
            drop_on_section(&mut board, &payload, &c),
            DropOutcome::Ignored
        );
        assert_eq!(top_names(&board), vec!["B", "C", "A"]);
    }

    #[test]
    fn section_moves_across_rows() {
        let mut board = three_section_board();
        let b = board.sections_top[1].id.clone();
        let d = board.sections_bottom[0].id.clone();

        let payload = TransferPayload::SectionMove {
            section_id: b.clone(),
            from_index: 1,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &d),
            DropOutcome::Moved
        );
        assert_eq!(top_names(&board), vec!["A", "C"]);
        let bottom: Vec<_> = board
            .sections_bottom
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(bottom, vec!["B", "D"]);
        assert_eq!(board.locate_section(&b), Some((Row::Bottom, 0)));
    }

    #[test]
    fn unknown_section_ids_are_ignored() {
        let mut board = three_section_board();
        let c = board.sections_top[2].id.clone();
        let payload = TransferPayload::SectionMove {
            section_id: "sec_longgone".to_string(),
            from_index: 0,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &c),
            DropOutcome::Ignored
        );

        let a = board.sections_top[0].id.clone();
        let payload = TransferPayload::SectionMove {
            section_id: a,
            from_index: 0,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, "sec_longgone"),
            DropOutcome::Ignored
        );
        assert_eq!(top_names(&board), vec!["A", "B", "C"]);
    }

    #[test]
    fn item_moves_to_target_tail_and_duplicate_fire_is_idempotent() {
        let mut board = three_section_board();
        let todo = Todo::new("write tests", Utc::now());
        let todo_id = todo.id.clone();
        board.sections_top[0].todos.push(todo);
        let s1 = board.sections_top[0].id.clone();
        let s2 = board.sections_top[1].id.clone();

        let payload = TransferPayload::ItemMove {
            todo_id,
            from_section_id: s1,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &s2),
            DropOutcome::Moved
        );
        assert!(board.sections_top[0].todos.is_empty());
        assert_eq!(board.sections_top[1].todos.len(), 1);

        // Identical payload fires a second time.
        assert_eq!(
            drop_on_section(&mut board, &payload, &s2),
            DropOutcome::Ignored
        );
        assert_eq!(board.sections_top[1].todos.len(), 1);
    }

    #[test]
    fn item_appends_after_existing_target_items() {
        let mut board = three_section_board();
        let now = Utc::now();
        let resident = Todo::new("already here", now);
        let resident_id = resident.id.clone();
        board.sections_top[1].todos.push(resident);

        let mover = Todo::new("incoming", now);
        let mover_id = mover.id.clone();
        board.sections_top[0].todos.push(mover);

        let payload = TransferPayload::ItemMove {
            todo_id: mover_id.clone(),
            from_section_id: board.sections_top[0].id.clone(),
        };
        let target = board.sections_top[1].id.clone();
        assert_eq!(
            drop_on_section(&mut board, &payload, &target),
            DropOutcome::Moved
        );
        let order: Vec<_> = board.sections_top[1]
            .todos
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(order, vec![resident_id, mover_id]);
    }

    #[test]
    fn item_same_section_drop_is_a_no_op() {
        let mut board = three_section_board();
        let todo = Todo::new("stay put", Utc::now());
        let todo_id = todo.id.clone();
        board.sections_top[0].todos.push(todo);
        let s1 = board.sections_top[0].id.clone();

        let payload = TransferPayload::ItemMove {
            todo_id,
            from_section_id: s1.clone(),
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &s1),
            DropOutcome::Ignored
        );
        assert_eq!(board.sections_top[0].todos.len(), 1);
    }

    #[test]
    fn item_moves_across_rows() {
        let mut board = three_section_board();
        let todo = Todo::new("sink to the bottom", Utc::now());
        let todo_id = todo.id.clone();
        board.sections_top[0].todos.push(todo);
        let s1 = board.sections_top[0].id.clone();
        let d = board.sections_bottom[0].id.clone();

        let payload = TransferPayload::ItemMove {
            todo_id: todo_id.clone(),
            from_section_id: s1,
        };
        assert_eq!(
            drop_on_section(&mut board, &payload, &d),
            DropOutcome::Moved
        );
        assert_eq!(board.sections_bottom[0].todos[0].id, todo_id);
    }

    #[test]
    fn undecodable_payloads_are_discarded() {
        assert!(TransferPayload::decode("not json").is_none());
        assert!(TransferPayload::decode("{}").is_none());
        assert!(TransferPayload::decode(r#"{"kind":"section_move"}"#).is_none());
        assert!(
            TransferPayload::decode(r#"{"kind":"teleport","section_id":"x"}"#).is_none()
        );
    }

    #[test]
    fn payloads_round_trip_through_encode_decode() {
        let payload = TransferPayload::ItemMove {
            todo_id: "todo_9f8e7d6c".to_string(),
            from_section_id: "sec_k3j2h1g0".to_string(),
        };
        let raw = payload.encode().expect("encode payload");
        assert_eq!(TransferPayload::decode(&raw), Some(payload));
    }

    #[test]
    fn prefixed_string_ids_travel_through_a_drop() {
        let mut board = three_section_board();
        board.sections_top[0].id = "sec_source01".to_string();
        board.sections_top[1].id = "sec_target02".to_string();
        let mut todo = Todo::new("carry me", Utc::now());
        todo.id = "todo_carry03".to_string();
        board.sections_top[0].todos.push(todo);

        let payload = TransferPayload::decode(
            r#"{"kind":"item_move","todo_id":"todo_carry03","from_section_id":"sec_source01"}"#,
        )
        .expect("decodable payload");
        assert_eq!(
            drop_on_section(&mut board, &payload, "sec_target02"),
            DropOutcome::Moved
        );
        assert_eq!(board.sections_top[1].todos[0].id, "todo_carry03");
    }
}
