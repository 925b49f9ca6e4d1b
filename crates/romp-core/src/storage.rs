use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::board::{Board, Section};

const BOARD_FILE: &str = "board.json";

/// On-disk home of the board document: a single JSON blob.
#[derive(Debug)]
pub struct BoardStore {
    pub data_dir: PathBuf,
    pub board_path: PathBuf,
}

/// Accepts both the current two-row shape and the legacy single-group shape
/// `{ "sections": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredBoard {
    Current(Board),
    Legacy { sections: Vec<Section> },
}

impl StoredBoard {
    fn into_board(self) -> Board {
        match self {
            StoredBoard::Current(board) => board,
            StoredBoard::Legacy { sections } => {
                info!(
                    sections = sections.len(),
                    "migrating legacy single-row document"
                );
                Board {
                    sections_top: sections,
                    sections_bottom: vec![],
                }
            }
        }
    }
}

impl BoardStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let board_path = data_dir.join(BOARD_FILE);
        info!(
            data_dir = %data_dir.display(),
            board = %board_path.display(),
            "opened board store"
        );

        Ok(Self {
            data_dir,
            board_path,
        })
    }

    /// Loads the stored document. Absence, unreadable storage and corrupt
    /// blobs all come back as `None`; the caller seeds a default.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Option<Board> {
        if !self.board_path.exists() {
            debug!(file = %self.board_path.display(), "no stored board");
            return None;
        }

        let raw = match fs::read_to_string(&self.board_path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    file = %self.board_path.display(),
                    error = %err,
                    "failed reading stored board; treating as absent"
                );
                return None;
            }
        };

        match serde_json::from_str::<StoredBoard>(&raw) {
            Ok(stored) => Some(stored.into_board()),
            Err(err) => {
                warn!(
                    file = %self.board_path.display(),
                    error = %err,
                    "stored board is unparseable; treating as absent"
                );
                None
            }
        }
    }

    /// The document every command starts from: stored state if any, a
    /// freshly seeded default otherwise.
    pub fn load_or_seed(&self) -> Board {
        self.load().unwrap_or_else(|| {
            info!("seeding default board");
            Board::seeded()
        })
    }

    #[tracing::instrument(skip(self, board))]
    pub fn save(&self, board: &Board) -> anyhow::Result<()> {
        debug!(
            file = %self.board_path.display(),
            sections = board.sections().count(),
            "saving board atomically"
        );

        let dir = self
            .board_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string_pretty(board)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;

        temp.persist(&self.board_path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.board_path.display(), err))?;

        Ok(())
    }
}
