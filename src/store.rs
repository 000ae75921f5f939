use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;

use crate::question::{Question, QuizSession};

/// Key holding the read-only question list.
pub const QUESTIONS_KEY: &str = "Questions";
/// Key holding the persisted [`QuizSession`].
pub const ANSWERS_KEY: &str = "UserAnswers";

/// Minimal persistent key/value capability backing the quiz.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store. Clones share the same contents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Directory-backed store writing one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("unable to create store directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(anyhow!("invalid store key: {key:?}"));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("unable to read {}", path.display()))
            }
        };
        let value = serde_json::from_str(&text)
            .with_context(|| format!("{} does not contain valid JSON", path.display()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        let text = serde_json::to_string_pretty(value)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, text)
            .with_context(|| format!("unable to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("unable to replace {}", path.display()))?;
        debug!("stored {key} at {}", path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
        }
    }
}

/// Typed access to the question list and the persisted session.
pub struct QuestionStore {
    backend: Box<dyn KeyValueStore>,
}

impl QuestionStore {
    pub fn new<S: KeyValueStore + 'static>(backend: S) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Reads the question list; `None` when the key has never been written.
    pub fn load_questions(&self) -> Result<Option<Vec<Question>>> {
        let Some(value) = self.backend.get(QUESTIONS_KEY)? else {
            return Ok(None);
        };
        let questions = serde_json::from_value(value)
            .with_context(|| format!("{QUESTIONS_KEY} is not a list of questions"))?;
        Ok(Some(questions))
    }

    pub fn save_questions(&self, questions: &[Question]) -> Result<()> {
        let value = serde_json::to_value(questions)?;
        self.backend
            .set(QUESTIONS_KEY, &value)
            .with_context(|| format!("unable to store {QUESTIONS_KEY}"))
    }

    pub fn load_session(&self) -> Result<Option<QuizSession>> {
        let Some(value) = self.backend.get(ANSWERS_KEY)? else {
            return Ok(None);
        };
        let session = serde_json::from_value(value)
            .with_context(|| format!("{ANSWERS_KEY} is not a quiz session"))?;
        Ok(Some(session))
    }

    /// Writes the whole session, replacing any previous one.
    pub fn persist_session(&self, session: &QuizSession) -> Result<()> {
        let value = serde_json::to_value(session)?;
        self.backend
            .set(ANSWERS_KEY, &value)
            .with_context(|| format!("unable to store {ANSWERS_KEY}"))
    }

    pub fn clear_session(&self) -> Result<()> {
        self.backend
            .remove(ANSWERS_KEY)
            .with_context(|| format!("unable to remove {ANSWERS_KEY}"))
    }
}
