//! ChatStore - append-only per-thread conversation log
//!
//! Persists the message history of agent conversations. Each thread is an
//! ordered, immutable sequence of messages; appends create the thread on
//! first use and never rewrite what is already there.
//!
//! # Architecture
//!
//! ```text
//! .chatstore/
//! ├── {thread_id}.jsonl    # one message per line, append-only
//! └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chatstore::{ChatMessage, ConversationStore};
//!
//! let store = ConversationStore::open(".chatstore")?;
//! store.append("thread-1", &[ChatMessage::user("hello")])?;
//! let history = store.history("thread-1")?;
//! ```

mod store;

pub use store::{ChatMessage, ChatRole, ConversationStore, ThreadId, ToolCallRecord};
