/*!
 * Reading and writing quiz progress: per-question usage statistics, the set of
 * recently used questions, and the learner's level.
 *
 * Everything is stored as JSON text under a handful of keys in a `KeyValueStore`. The
 * store can be a directory of JSON files, a SQLite database, or plain memory.
 *
 * Reads never fail. A missing or unreadable value is logged and treated as empty, so a
 * broken store means more repeated questions rather than a broken quiz. Writes return
 * their errors to the caller, and so do updates whose read fails, so that a value that
 * could not be read is never overwritten.
 */
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::catalog::{Category, Difficulty, QuizQuestion};
use super::common::{Backend, QuizError, Result};
use super::level::{clamp_level, LevelProgress};


pub const USED_QUESTIONS_KEY: &str = "used-questions";
pub const QUESTION_STATS_KEY: &str = "question-stats";
pub const LEVEL_PROGRESS_KEY: &str = "level-progress";

const APP_DIR_NAME: &str = "versequiz";
const APP_DIR_ENV: &str = "VERSEQUIZ_DIR";
const SQLITE_FILE_NAME: &str = "progress.sqlite3";


/// Usage and accuracy of a single question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    /// Incremented exactly once each time the question is shown.
    #[serde(default)]
    pub times_used: u32,
    /// Milliseconds since the Unix epoch, or 0 if never shown.
    #[serde(default)]
    pub last_used: i64,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub total_answers: u32,
}

pub type StatsMap = HashMap<String, QuestionStats>;


impl QuestionStats {
    /// Zeroed statistics for a question that has never been shown.
    pub fn new(question: &QuizQuestion) -> Self {
        QuestionStats {
            times_used: 0,
            last_used: 0,
            difficulty: question.difficulty,
            category: question.category,
            correct_answers: 0,
            total_answers: 0,
        }
    }

    /// Fraction of answers that were correct, or `None` if never answered.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_answers > 0 {
            Some(f64::from(self.correct_answers) / f64::from(self.total_answers))
        } else {
            None
        }
    }
}


pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}


#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}


/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        FileStore { dir: dir.to_path_buf() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let mut builder = self.dir.clone();
        builder.push(format!("{}.json", key));
        builder
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path).map(Some).map_err(QuizError::Io)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(QuizError::Io)?;
        }
        fs::write(self.path(key), value).map_err(QuizError::Io)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(QuizError::Io)?;
        }
        Ok(())
    }
}


/// Stores every key as a row of a single `kv` table.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path).map_err(QuizError::Sql)?;
        SqliteStore::with_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(QuizError::Sql)?;
        SqliteStore::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .execute(
                "
            CREATE TABLE IF NOT EXISTS kv(
              key TEXT NOT NULL PRIMARY KEY CHECK(key != ''),
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
                [],
            )
            .map_err(QuizError::Sql)?;
        Ok(SqliteStore { connection })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.connection
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(QuizError::Sql)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.connection
            .execute(
                "INSERT OR REPLACE INTO kv(key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(QuizError::Sql)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.connection
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(QuizError::Sql)?;
        Ok(())
    }
}


/// Persistent record of which questions have been asked and how they went.
///
/// Updates are read-modify-write on whole JSON blobs with no locking, so two sessions
/// sharing a store can overwrite each other's changes. The last write wins.
pub struct UsageLedger<S> {
    store: S,
}

impl<S: KeyValueStore> UsageLedger<S> {
    pub fn new(store: S) -> Self {
        UsageLedger { store }
    }

    pub fn load_stats(&self) -> StatsMap {
        self.load_or_default(QUESTION_STATS_KEY)
    }

    pub fn save_stats(&mut self, stats: &StatsMap) -> Result<()> {
        // Sorted so that the stored JSON is stable between saves.
        let sorted: BTreeMap<&String, &QuestionStats> = stats.iter().collect();
        self.save(QUESTION_STATS_KEY, &sorted)
    }

    pub fn load_used_ids(&self) -> HashSet<String> {
        self.load_or_default(USED_QUESTIONS_KEY)
    }

    pub fn save_used_ids(&mut self, ids: &HashSet<String>) -> Result<()> {
        let sorted: BTreeSet<&String> = ids.iter().collect();
        self.save(USED_QUESTIONS_KEY, &sorted)
    }

    /// Add `ids` to the persisted set of used questions.
    pub fn mark_used<'a, I>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut used: HashSet<String> = self.load_for_update(USED_QUESTIONS_KEY)?;
        for id in ids {
            used.insert(id.to_string());
        }
        self.save_used_ids(&used)
    }

    /// Record that `question` was shown and answered, and return its new statistics.
    pub fn record_presentation(
        &mut self,
        question: &QuizQuestion,
        was_correct: bool,
    ) -> Result<QuestionStats> {
        self.record_presentation_at(question, was_correct, now_millis())
    }

    pub fn record_presentation_at(
        &mut self,
        question: &QuizQuestion,
        was_correct: bool,
        now: i64,
    ) -> Result<QuestionStats> {
        let mut stats: StatsMap = self.load_for_update(QUESTION_STATS_KEY)?;
        let entry = stats
            .entry(question.id.clone())
            .or_insert_with(|| QuestionStats::new(question));

        entry.times_used = entry.times_used.saturating_add(1);
        entry.last_used = now;
        entry.total_answers = entry.total_answers.saturating_add(1);
        if was_correct {
            entry.correct_answers = entry.correct_answers.saturating_add(1);
        }

        let updated = entry.clone();
        self.save_stats(&stats)?;
        Ok(updated)
    }

    /// The stored level progress, with the level clamped into range.
    pub fn load_level_progress(&self) -> LevelProgress {
        let mut progress: LevelProgress = self.load_or_default(LEVEL_PROGRESS_KEY);
        progress.level = clamp_level(progress.level);
        progress
    }

    pub fn save_level_progress(&mut self, progress: &LevelProgress) -> Result<()> {
        self.save(LEVEL_PROGRESS_KEY, progress)
    }

    /// Forget everything: usage statistics, used questions and level.
    pub fn reset(&mut self) -> Result<()> {
        for key in [USED_QUESTIONS_KEY, QUESTION_STATS_KEY, LEVEL_PROGRESS_KEY].iter() {
            self.store.remove(key)?;
        }
        info!("quiz progress has been reset");
        Ok(())
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.store.get(key) {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => value,
                Err(e) => {
                    warn!("could not parse stored '{}' ({}); using empty value", key, e);
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                warn!("could not read stored '{}' ({}); using empty value", key, e);
                T::default()
            }
        }
    }

    // Like `load_or_default`, but a failed read is returned instead of being treated
    // as empty, since the caller is about to overwrite the whole value.
    fn load_for_update<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key)? {
            Some(data) => match serde_json::from_str(&data) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("could not parse stored '{}' ({}); replacing it", key, e);
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }

    fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_string_pretty(value).map_err(QuizError::Json)?;
        self.store.set(key, &serialized)
    }
}


/// Open the ledger for the chosen backend inside `dir`.
pub fn open_ledger(
    backend: Backend,
    dir: &Path,
) -> Result<UsageLedger<Box<dyn KeyValueStore>>> {
    let store: Box<dyn KeyValueStore> = match backend {
        Backend::Json => Box::new(FileStore::new(dir)),
        Backend::Sqlite => {
            let mut path = dir.to_path_buf();
            path.push(SQLITE_FILE_NAME);
            Box::new(SqliteStore::open(&path)?)
        }
    };
    Ok(UsageLedger::new(store))
}


/// Return the path to the application directory. An explicit `dir` wins, then the
/// `VERSEQUIZ_DIR` environment variable, then the platform's data directory.
pub fn get_app_dir_path(dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = dir {
        return Some(dir.to_path_buf());
    }
    if let Some(dir) = env::var_os(APP_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    let mut dirpath = dirs::data_dir()?;
    dirpath.push(APP_DIR_NAME);
    Some(dirpath)
}


/// Return the path to the application directory, creating it if it doesn't exist.
pub fn require_app_dir_path(dir: Option<&Path>) -> Result<PathBuf> {
    let dirpath = get_app_dir_path(dir)
        .ok_or_else(|| QuizError::CannotMakeAppDir(PathBuf::from(APP_DIR_NAME)))?;
    if !dirpath.exists() {
        fs::create_dir_all(&dirpath).or(Err(QuizError::CannotMakeAppDir(dirpath.clone())))?;
    }
    Ok(dirpath)
}


pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
