use anyhow::anyhow;
use chrono::{DateTime, Datelike, Local, Utc};
use tracing::{info, instrument, warn};

use crate::board::{Board, Row, Section, Todo, normalize_text};
use crate::calendar::{MonthGrid, parse_month_arg};
use crate::cli::Command;
use crate::config::Config;
use crate::dates;
use crate::render::{Renderer, short_id};
use crate::storage::BoardStore;
use crate::transfer::{DropOutcome, TransferPayload, drop_on_section};

/// Runs one command against the stored document: load, mutate, persist,
/// report. Persistence failure never fails the command.
#[instrument(skip(store, renderer, command))]
pub fn dispatch(store: &BoardStore, renderer: &Renderer, command: Command) -> anyhow::Result<()> {
    let now = Utc::now();
    let mut board = store.load_or_seed();

    match command {
        Command::Show => renderer.print_board(&board),
        Command::AddSection { name, row } => cmd_add_section(store, &mut board, &name, row),
        Command::RenameSection { section, name } => {
            cmd_rename_section(store, &mut board, &section, &name)
        }
        Command::DeleteSection { section } => cmd_delete_section(store, &mut board, &section),
        Command::Add { section, text } => {
            cmd_add(store, &mut board, &section, &text.join(" "), now)
        }
        Command::Toggle { todo } => cmd_toggle(store, &mut board, &todo),
        Command::Edit { todo, text } => cmd_edit(store, &mut board, &todo, &text.join(" ")),
        Command::Delete { todo } => cmd_delete(store, &mut board, &todo),
        Command::Move { todo, section } => cmd_move(store, &mut board, &todo, &section),
        Command::MoveSection { section, target } => {
            cmd_move_section(store, &mut board, &section, &target)
        }
        Command::Drop { payload, on } => cmd_drop(store, &mut board, &payload, &on),
        Command::Calendar { month, next, prev } => {
            cmd_calendar(renderer, &board, month.as_deref(), next, prev)
        }
    }
}

/// The command run when none was named, taken from `default.command`.
pub fn default_command(cfg: &Config) -> Command {
    match cfg.get("default.command").as_deref() {
        Some("calendar") => Command::Calendar {
            month: None,
            next: None,
            prev: None,
        },
        Some("show") | None => Command::Show,
        Some(other) => {
            warn!(value = other, "unrecognized default.command, using show");
            Command::Show
        }
    }
}

fn persist(store: &BoardStore, board: &Board) {
    if let Err(err) = store.save(board) {
        warn!(error = %err, "failed to persist board; continuing with in-memory state");
    }
}

#[instrument(skip(store, board))]
fn cmd_add_section(
    store: &BoardStore,
    board: &mut Board,
    name: &str,
    row: Row,
) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("section name cannot be empty"));
    }

    let section = Section::new(name);
    let id = section.id.clone();
    board.row_mut(row).push(section);
    persist(store, board);

    info!(%id, row = row.label(), "section added");
    println!("Added section '{name}' [{}] to the {} row.", short_id(&id), row.label());
    Ok(())
}

#[instrument(skip(store, board))]
fn cmd_rename_section(
    store: &BoardStore,
    board: &mut Board,
    section: &str,
    name: &str,
) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("section name cannot be empty"));
    }

    let id = resolve_section(board, section)?;
    let target = board
        .section_mut(&id)
        .ok_or_else(|| anyhow!("unknown section: {section}"))?;
    let old = std::mem::replace(&mut target.name, name.to_string());
    persist(store, board);

    println!("Renamed section '{old}' to '{name}'.");
    Ok(())
}

#[instrument(skip(store, board))]
fn cmd_delete_section(store: &BoardStore, board: &mut Board, section: &str) -> anyhow::Result<()> {
    let id = resolve_section(board, section)?;
    let removed = board
        .remove_section(&id)
        .ok_or_else(|| anyhow!("unknown section: {section}"))?;
    persist(store, board);

    println!(
        "Deleted section '{}' and {} task(s).",
        removed.name,
        removed.todos.len()
    );
    Ok(())
}

#[instrument(skip(store, board, now))]
fn cmd_add(
    store: &BoardStore,
    board: &mut Board,
    section: &str,
    text: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Err(anyhow!("task text cannot be empty"));
    }

    let id = resolve_section(board, section)?;
    let todo = Todo::new(text, now);
    let short = short_id(&todo.id);
    let line = todo.text.clone();
    let target = board
        .section_mut(&id)
        .ok_or_else(|| anyhow!("unknown section: {section}"))?;
    let section_name = target.name.clone();
    target.todos.push(todo);
    persist(store, board);

    println!("Added '{line}' [{short}] to '{section_name}'.");
    Ok(())
}

#[instrument(skip(store, board))]
fn cmd_toggle(store: &BoardStore, board: &mut Board, todo: &str) -> anyhow::Result<()> {
    let id = resolve_todo(board, todo)?;
    let task = board
        .todo_mut(&id)
        .ok_or_else(|| anyhow!("unknown task: {todo}"))?;
    task.completed = !task.completed;
    let state = if task.completed { "done" } else { "open" };
    let text = task.text.clone();
    persist(store, board);

    println!("Marked '{text}' as {state}.");
    Ok(())
}

#[instrument(skip(store, board))]
fn cmd_edit(store: &BoardStore, board: &mut Board, todo: &str, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Err(anyhow!("task text cannot be empty"));
    }

    let id = resolve_todo(board, todo)?;
    let task = board
        .todo_mut(&id)
        .ok_or_else(|| anyhow!("unknown task: {todo}"))?;
    task.text = normalize_text(text);
    let line = task.text.clone();
    persist(store, board);

    println!("Updated [{}]: {line}", short_id(&id));
    Ok(())
}

#[instrument(skip(store, board))]
fn cmd_delete(store: &BoardStore, board: &mut Board, todo: &str) -> anyhow::Result<()> {
    let id = resolve_todo(board, todo)?;
    let removed = board
        .remove_todo(&id)
        .ok_or_else(|| anyhow!("unknown task: {todo}"))?;
    persist(store, board);

    println!("Deleted '{}'.", removed.text);
    Ok(())
}

/// The explicit per-item move path: identical remove-then-append semantics
/// as a drag, routed through the same protocol.
#[instrument(skip(store, board))]
fn cmd_move(store: &BoardStore, board: &mut Board, todo: &str, section: &str) -> anyhow::Result<()> {
    let todo_id = resolve_todo(board, todo)?;
    let target_id = resolve_section(board, section)?;
    let from_section_id = board
        .owner_of(&todo_id)
        .map(|s| s.id.clone())
        .ok_or_else(|| anyhow!("unknown task: {todo}"))?;

    let payload = TransferPayload::ItemMove {
        todo_id: todo_id.clone(),
        from_section_id,
    };
    match drop_on_section(board, &payload, &target_id) {
        DropOutcome::Moved => {
            persist(store, board);
            println!("Moved task [{}].", short_id(&todo_id));
        }
        DropOutcome::Ignored => println!("Nothing to move."),
    }
    Ok(())
}

#[instrument(skip(store, board))]
fn cmd_move_section(
    store: &BoardStore,
    board: &mut Board,
    section: &str,
    target: &str,
) -> anyhow::Result<()> {
    let section_id = resolve_section(board, section)?;
    let target_id = resolve_section(board, target)?;
    let (_, from_index) = board
        .locate_section(&section_id)
        .ok_or_else(|| anyhow!("unknown section: {section}"))?;

    let payload = TransferPayload::SectionMove {
        section_id: section_id.clone(),
        from_index,
    };
    match drop_on_section(board, &payload, &target_id) {
        DropOutcome::Moved => {
            persist(store, board);
            println!("Moved section [{}].", short_id(&section_id));
        }
        DropOutcome::Ignored => println!("Nothing to move."),
    }
    Ok(())
}

/// Raw payload boundary: whatever a drag source produced lands here. Bad
/// payloads are dropped without touching the document.
#[instrument(skip(store, board, raw))]
fn cmd_drop(store: &BoardStore, board: &mut Board, raw: &str, on: &str) -> anyhow::Result<()> {
    let target_id = resolve_section(board, on)?;
    let Some(payload) = TransferPayload::decode(raw) else {
        println!("Ignored.");
        return Ok(());
    };

    match drop_on_section(board, &payload, &target_id) {
        DropOutcome::Moved => {
            persist(store, board);
            println!("Moved.");
        }
        DropOutcome::Ignored => println!("Ignored."),
    }
    Ok(())
}

#[instrument(skip(renderer, board))]
fn cmd_calendar(
    renderer: &Renderer,
    board: &Board,
    month: Option<&str>,
    next: Option<u16>,
    prev: Option<u16>,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let mut grid = match month {
        Some(raw) => parse_month_arg(raw)?,
        None => MonthGrid::for_month(today.year(), today.month())?,
    };
    if let Some(n) = next {
        grid = grid.shifted(i32::from(n))?;
    }
    if let Some(n) = prev {
        grid = grid.shifted(-i32::from(n))?;
    }

    let reference = grid
        .first_day()
        .ok_or_else(|| anyhow!("invalid month: {}-{:02}", grid.year, grid.month))?;
    let marked = dates::infer(board, reference, today);
    renderer.print_calendar(&grid, &marked, today)
}

/// Resolves a section argument: exact id, unambiguous id prefix, or exact
/// (case-insensitive) name.
fn resolve_section(board: &Board, needle: &str) -> anyhow::Result<String> {
    if board.section(needle).is_some() {
        return Ok(needle.to_string());
    }

    if !needle.is_empty() {
        let by_prefix: Vec<&str> = board
            .sections()
            .filter(|s| s.id.starts_with(needle))
            .map(|s| s.id.as_str())
            .collect();
        match by_prefix.as_slice() {
            [id] => return Ok((*id).to_string()),
            [] => {}
            _ => return Err(anyhow!("ambiguous section id prefix: {needle}")),
        }
    }

    let lowered = needle.to_lowercase();
    let by_name: Vec<&str> = board
        .sections()
        .filter(|s| s.name.to_lowercase() == lowered)
        .map(|s| s.id.as_str())
        .collect();
    match by_name.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(anyhow!("unknown section: {needle}")),
        _ => Err(anyhow!(
            "several sections are named '{needle}'; use an id prefix"
        )),
    }
}

/// Resolves a task argument: exact id or unambiguous id prefix.
fn resolve_todo(board: &Board, needle: &str) -> anyhow::Result<String> {
    if needle.is_empty() {
        return Err(anyhow!("unknown task: {needle}"));
    }
    if board.owner_of(needle).is_some() {
        return Ok(needle.to_string());
    }

    let hits: Vec<&str> = board
        .sections()
        .flat_map(|s| s.todos.iter())
        .filter(|t| t.id.starts_with(needle))
        .map(|t| t.id.as_str())
        .collect();
    match hits.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(anyhow!("unknown task: {needle}")),
        _ => Err(anyhow!("ambiguous task id prefix: {needle}")),
    }
}
