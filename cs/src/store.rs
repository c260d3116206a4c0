//! Core ConversationStore implementation

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Unique identifier for a conversation thread (caller-supplied)
pub type ThreadId = String;

/// Role of a message within a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model, as persisted on the
/// assistant message that carried it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Call id assigned by the model
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

/// A single persisted message
///
/// Messages are immutable once appended; their order within a thread file is
/// the conversation order fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    /// For tool messages, the call id this result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Append timestamp (unix ms)
    pub at: i64,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create a plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Create an assistant message carrying tool-call requests
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRecord>) -> Self {
        let mut msg = Self::new(ChatRole::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool result message tagged with its call id
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(ChatRole::Tool, content);
        msg.tool_call_id = Some(call_id.into());
        msg
    }
}

/// The conversation store
///
/// One JSONL file per thread under a base directory. Appends take an
/// exclusive advisory lock on the thread file, so concurrent writers to the
/// same thread serialize; writers to different threads are independent.
pub struct ConversationStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl ConversationStore {
    /// Open or create a conversation store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened conversation store");
        Ok(Self { base_path })
    }

    /// Append messages to the end of a thread, creating it if absent
    ///
    /// Upsert semantics: there is no separate "create thread" operation.
    /// Existing messages are never reordered or rewritten.
    pub fn append(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<()> {
        validate_thread_id(thread_id)?;
        if messages.is_empty() {
            return Ok(());
        }

        let path = self.thread_path(thread_id);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open thread file: {}", path.display()))?;

        fs2::FileExt::lock_exclusive(&file).context("Failed to lock thread file")?;
        let result = Self::write_messages(&file, messages);
        if let Err(e) = fs2::FileExt::unlock(&file) {
            warn!(thread_id, error = %e, "Failed to unlock thread file");
        }
        result?;

        debug!(thread_id, count = messages.len(), "Appended messages");
        Ok(())
    }

    fn write_messages(mut file: &fs::File, messages: &[ChatMessage]) -> Result<()> {
        for msg in messages {
            let line = serde_json::to_string(msg).context("Failed to serialize message")?;
            writeln!(file, "{}", line).context("Failed to append message")?;
        }
        file.sync_data().context("Failed to sync thread file")?;
        Ok(())
    }

    /// Read the full ordered history of a thread
    ///
    /// Returns an empty vec for an unknown thread - that is the expected
    /// state before the first append, not an error. Lines that fail to
    /// decode are skipped with a warning so one bad record cannot hide the
    /// rest of the history.
    pub fn history(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        validate_thread_id(thread_id)?;

        let path = self.thread_path(thread_id);
        if !path.exists() {
            debug!(thread_id, "history: unknown thread");
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path).context(format!("Failed to open thread file: {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut messages = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read thread file")?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ChatMessage>(&line) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    warn!(thread_id, lineno, error = %e, "Skipping undecodable message line");
                }
            }
        }

        debug!(thread_id, count = messages.len(), "history: loaded");
        Ok(messages)
    }

    /// List all known thread ids
    ///
    /// Every thread ever appended to appears exactly once.
    pub fn thread_ids(&self) -> Result<Vec<ThreadId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.base_path).context("Failed to read store directory")? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && path.extension().map(|e| e == "jsonl").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        info!(count = ids.len(), "Listed threads");
        Ok(ids)
    }

    fn thread_path(&self, thread_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", thread_id))
    }
}

/// Thread ids name files on disk, so anything that could traverse the
/// store directory is rejected up front.
fn validate_thread_id(thread_id: &str) -> Result<()> {
    if thread_id.is_empty() {
        return Err(eyre::eyre!("Thread id must not be empty"));
    }
    if thread_id.contains('/') || thread_id.contains('\\') || thread_id.contains("..") {
        return Err(eyre::eyre!("Invalid thread id: {}", thread_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_then_history_preserves_order() {
        let temp = TempDir::new().unwrap();
        let store = ConversationStore::open(temp.path()).unwrap();

        store.append("t1", &[ChatMessage::user("first")]).unwrap();
        store
            .append("t1", &[ChatMessage::assistant("second"), ChatMessage::user("third")])
            .unwrap();

        let history = store.history("t1").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
        assert_eq!(history[2].content, "third");
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].role, ChatRole::Assistant);
    }

    #[test]
    fn test_history_of_unknown_thread_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = ConversationStore::open(temp.path()).unwrap();

        let history = store.history("never-seen").unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_thread_ids_distinct() {
        let temp = TempDir::new().unwrap();
        let store = ConversationStore::open(temp.path()).unwrap();

        store.append("a", &[ChatMessage::user("1")]).unwrap();
        store.append("b", &[ChatMessage::user("2")]).unwrap();
        store.append("a", &[ChatMessage::user("3")]).unwrap();

        let mut ids = store.thread_ids().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_tool_call_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = ConversationStore::open(temp.path()).unwrap();

        let calls = vec![ToolCallRecord {
            id: "call_1".to_string(),
            name: "read_file".to_string(),
            arguments: serde_json::json!({"path": "src/main.rs"}),
        }];
        store
            .append(
                "t",
                &[
                    ChatMessage::assistant_with_calls("", calls),
                    ChatMessage::tool("call_1", "{\"status\":\"success\",\"data\":\"fn main() {}\"}"),
                ],
            )
            .unwrap();

        let history = store.history("t").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].tool_calls.len(), 1);
        assert_eq!(history[0].tool_calls[0].name, "read_file");
        assert_eq!(history[1].role, ChatRole::Tool);
        assert_eq!(history[1].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_bad_line_does_not_truncate_history() {
        let temp = TempDir::new().unwrap();
        let store = ConversationStore::open(temp.path()).unwrap();

        store.append("t", &[ChatMessage::user("before")]).unwrap();

        // Corrupt the file with a non-JSON line, then append more.
        let path = temp.path().join("t.jsonl");
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        drop(file);

        store.append("t", &[ChatMessage::user("after")]).unwrap();

        let history = store.history("t").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "before");
        assert_eq!(history[1].content, "after");
    }

    #[test]
    fn test_traversal_thread_id_rejected() {
        let temp = TempDir::new().unwrap();
        let store = ConversationStore::open(temp.path()).unwrap();

        assert!(store.append("../escape", &[ChatMessage::user("x")]).is_err());
        assert!(store.history("a/b").is_err());
        assert!(store.append("", &[ChatMessage::user("x")]).is_err());
    }
}
