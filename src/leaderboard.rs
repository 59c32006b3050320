//! The persisted, rank-ordered set of top scores
use crate::consts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single leaderboard entry
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct ScoreRecord {
    pub(crate) name: String,
    pub(crate) score: u64,
    pub(crate) date: DateTime<Utc>,
}

/// Leaderboard records, sorted by descending score and holding at most
/// [`LEADERBOARD_CAPACITY`][consts::LEADERBOARD_CAPACITY] entries.  Records
/// with equal scores stay in the order they were added.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Vec<ScoreRecord>", into = "Vec<ScoreRecord>")]
pub(crate) struct Leaderboard(Vec<ScoreRecord>);

impl Leaderboard {
    pub(crate) fn insert(&mut self, record: ScoreRecord) {
        self.0.push(record);
        self.normalize();
    }

    /// Return the best `limit` records, with `limit` clamped to `[1,
    /// LEADERBOARD_CAPACITY]`
    pub(crate) fn top(&self, limit: usize) -> &[ScoreRecord] {
        let n = clamp_limit(limit).min(self.0.len());
        &self.0[..n]
    }

    fn normalize(&mut self) {
        self.0.sort_by(|a, b| b.score.cmp(&a.score));
        self.0.truncate(consts::LEADERBOARD_CAPACITY);
    }
}

impl From<Vec<ScoreRecord>> for Leaderboard {
    fn from(records: Vec<ScoreRecord>) -> Leaderboard {
        let mut board = Leaderboard(records);
        board.normalize();
        board
    }
}

impl From<Leaderboard> for Vec<ScoreRecord> {
    fn from(board: Leaderboard) -> Vec<ScoreRecord> {
        board.0
    }
}

pub(crate) fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, consts::LEADERBOARD_CAPACITY)
}

/// A validated score submission.  The name has already been cut down to
/// [`MAX_NAME_LEN`][consts::MAX_NAME_LEN] characters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Submission {
    name: String,
    score: u64,
}

impl Submission {
    pub(crate) fn new(name: &str, score: u64) -> Submission {
        Submission {
            name: name.chars().take(consts::MAX_NAME_LEN).collect(),
            score,
        }
    }

    /// Validate a JSON submission of the form `{"name": <string>, "score":
    /// <number>}`.  The score must be a non-negative whole number, though it
    /// may be written in float form (`40.0`, `1e2`).
    pub(crate) fn from_json(value: &Value) -> Result<Submission, InvalidPayload> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or(InvalidPayload)?;
        let score = value
            .get("score")
            .and_then(whole_number)
            .ok_or(InvalidPayload)?;
        Ok(Submission::new(name, score))
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn score(&self) -> u64 {
        self.score
    }

    pub(crate) fn into_record(self, date: DateTime<Utc>) -> ScoreRecord {
        ScoreRecord {
            name: self.name,
            score: self.score,
            date,
        }
    }
}

/// 2<sup>64</sup>, the first float too large for a `u64`
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_number(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    // The range check rejects negatives and out-of-range values, so the cast
    // is exact.
    ((0.0..U64_LIMIT).contains(&f) && f.fract() == 0.0).then_some(f as u64)
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("Invalid payload")]
pub(crate) struct InvalidPayload;

/// A leaderboard kept in a JSON file.  Every operation reads the whole file,
/// and every submission rewrites it in full.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct LeaderboardStore {
    path: PathBuf,
}

impl LeaderboardStore {
    pub(crate) fn new(path: PathBuf) -> LeaderboardStore {
        LeaderboardStore { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Create the backing file containing an empty leaderboard if it does not
    /// exist yet
    pub(crate) fn ensure_exists(&self) -> Result<(), SaveError> {
        if !self.path.exists() {
            self.save(&Leaderboard::default())?;
        }
        Ok(())
    }

    /// Read the leaderboard from disk.  A missing, unreadable, or corrupt
    /// file is treated as an empty leaderboard.  Individual records that
    /// don't fit the schema are skipped with a warning, and the rest are kept.
    pub(crate) fn load(&self) -> Leaderboard {
        match self.try_load() {
            Ok(board) => board,
            Err(e) => {
                log::warn!(
                    "{}: {:#}; treating leaderboard as empty",
                    self.path.display(),
                    anyhow::Error::new(e)
                );
                Leaderboard::default()
            }
        }
    }

    fn try_load(&self) -> Result<Leaderboard, LoadError> {
        let src = match fs_err::read(&self.path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Leaderboard::default())
            }
            Err(e) => return Err(LoadError::read(e)),
        };
        if src.iter().all(u8::is_ascii_whitespace) {
            return Ok(Leaderboard::default());
        }
        let entries =
            serde_json::from_slice::<Vec<Value>>(&src).map_err(LoadError::deserialize)?;
        let records = entries
            .into_iter()
            .enumerate()
            .filter_map(
                |(i, entry)| match serde_json::from_value::<ScoreRecord>(entry) {
                    Ok(rec) => Some(rec),
                    Err(e) => {
                        log::warn!(
                            "{}: skipping invalid leaderboard record #{i}: {e}",
                            self.path.display()
                        );
                        None
                    }
                },
            )
            .collect::<Vec<_>>();
        Ok(Leaderboard::from(records))
    }

    pub(crate) fn save(&self, board: &Leaderboard) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(SaveError::mkdir)?;
        }
        let mut src = serde_json::to_string_pretty(board).map_err(SaveError::serialize)?;
        src.push('\n');
        fs_err::write(&self.path, &src).map_err(SaveError::write)?;
        Ok(())
    }

    /// Record a score stamped with the current time, keeping only the top
    /// [`LEADERBOARD_CAPACITY`][consts::LEADERBOARD_CAPACITY] entries
    pub(crate) fn submit(&self, submission: Submission) -> Result<ScoreRecord, SaveError> {
        self.submit_at(submission, Utc::now())
    }

    pub(crate) fn submit_at(
        &self,
        submission: Submission,
        date: DateTime<Utc>,
    ) -> Result<ScoreRecord, SaveError> {
        let mut board = self.load();
        let record = submission.into_record(date);
        board.insert(record.clone());
        self.save(&board)?;
        Ok(record)
    }

    /// Return the best `limit` records, with `limit` clamped to `[1,
    /// LEADERBOARD_CAPACITY]`
    pub(crate) fn top_n(&self, limit: usize) -> Vec<ScoreRecord> {
        self.load().top(limit).to_vec()
    }
}

#[derive(Debug, Error)]
#[error("Failed to save leaderboard to disk")]
pub(crate) struct SaveError(#[source] SaveErrorSource);

impl SaveError {
    fn mkdir(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Mkdir(e))
    }

    fn serialize(e: serde_json::Error) -> Self {
        SaveError(SaveErrorSource::Serialize(e))
    }

    fn write(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Write(e))
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to create parent directories")]
    Mkdir(#[source] std::io::Error),
    #[error("failed to serialize leaderboard")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write leaderboard file")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Failed to read leaderboard from disk")]
struct LoadError(#[source] LoadErrorSource);

impl LoadError {
    fn read(e: std::io::Error) -> Self {
        LoadError(LoadErrorSource::Read(e))
    }

    fn deserialize(e: serde_json::Error) -> Self {
        LoadError(LoadErrorSource::Deserialize(e))
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to read leaderboard file")]
    Read(#[source] std::io::Error),
    #[error("failed to deserialize leaderboard")]
    Deserialize(#[source] serde_json::Error),
}
