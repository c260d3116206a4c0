//! AgentEngine - executes one conversational turn against the model

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatstore::{ChatMessage, ChatRole, ConversationStore, ToolCallRecord};
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient, Message, StopReason};
use crate::tools::{CommandPolicy, ToolContext, ToolExecutor, UserPrompterRef};

/// Default cap on model round-trips within one user turn
const DEFAULT_MAX_TURNS: u32 = 16;

/// Default generation budget per completion
const DEFAULT_MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = "You are a coding assistant operating on the user's project directory. \
    Use the available tools to inspect and modify files, run commands, and answer questions about the code. \
    All paths you pass to tools are resolved relative to the working directory; you cannot reach outside it. \
    Never run commands that could harm the host system, such as privilege escalation or destructive filesystem operations. \
    When a tool returns an error envelope, read the message, adjust your approach, and try again rather than giving up. \
    Prefer small, verifiable steps. When the task is done, reply with a concise summary of what you did.";

/// Configuration for the agent loop
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Confinement root all tools operate under
    pub root: PathBuf,

    /// Maximum model round-trips per user turn
    pub max_turns: u32,

    /// Token budget per completion
    pub max_tokens: u32,

    /// Policy applied to `run_command`
    pub command_policy: Arc<CommandPolicy>,

    /// Timeout for `run_command`
    pub command_timeout: Duration,

    /// Deadline for `ask_user`
    pub ask_user_timeout: Duration,
}

impl AgentConfig {
    /// Config with defaults, rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            max_turns: DEFAULT_MAX_TURNS,
            max_tokens: DEFAULT_MAX_TOKENS,
            command_policy: Arc::new(CommandPolicy::default()),
            command_timeout: Duration::from_millis(120_000),
            ask_user_timeout: Duration::from_millis(300_000),
        }
    }
}

/// Drives the conversation for a thread: model call, tool dispatch, repeat
///
/// The engine is stateless between turns. All conversation state lives in
/// the store; each message is persisted before the next model call, so a
/// crash mid-turn loses at most the in-flight completion.
pub struct AgentEngine {
    llm: Arc<dyn LlmClient>,
    tools: ToolExecutor,
    store: Arc<ConversationStore>,
    config: AgentConfig,
    prompter: Option<UserPrompterRef>,
}

impl AgentEngine {
    /// Create a new engine over the given client, tools, and store
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolExecutor, store: Arc<ConversationStore>, config: AgentConfig) -> Self {
        debug!(root = ?config.root, max_turns = config.max_turns, "AgentEngine::new: called");
        Self {
            llm,
            tools,
            store,
            config,
            prompter: None,
        }
    }

    /// Set the prompter answering `ask_user` questions
    pub fn with_prompter(mut self, prompter: UserPrompterRef) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Access the underlying conversation store
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Run one user turn to completion and return the final assistant text
    ///
    /// Tool failures are fed back to the model inside the loop; only model
    /// and store failures abort the turn.
    pub async fn run_turn(&self, thread_id: &str, query: &str) -> eyre::Result<String> {
        info!(thread_id, query_len = query.len(), "Starting turn");

        self.store.append(thread_id, &[ChatMessage::user(query)])?;

        let mut messages = to_model_messages(&self.store.history(thread_id)?);
        let tool_defs = self.tools.definitions();
        let tool_ctx = self.tool_context(thread_id);

        for turn in 1..=self.config.max_turns {
            debug!(thread_id, turn, max_turns = self.config.max_turns, "run_turn: model call");

            let request = CompletionRequest {
                system_prompt: SYSTEM_PROMPT.to_string(),
                messages: messages.clone(),
                tools: tool_defs.clone(),
                max_tokens: self.config.max_tokens,
            };

            let response = self.llm.complete(request).await?;
            debug!(thread_id, turn, stop_reason = ?response.stop_reason, "run_turn: response received");

            match response.stop_reason {
                StopReason::EndTurn | StopReason::StopSequence => {
                    let text = response.content.unwrap_or_default();
                    self.store.append(thread_id, &[ChatMessage::assistant(&text)])?;
                    info!(thread_id, turn, "Turn complete");
                    return Ok(text);
                }
                StopReason::ToolUse => {
                    self.handle_tool_use(thread_id, &response, &tool_ctx, &mut messages).await?;
                }
                StopReason::MaxTokens => {
                    warn!(thread_id, turn, "Completion truncated at token budget");
                    let partial = response.content.unwrap_or_default();
                    self.store.append(thread_id, &[ChatMessage::assistant(&partial)])?;
                    messages.push(Message::assistant(partial));
                    messages.push(Message::user(
                        "Continue from where you left off. Your previous response was truncated.",
                    ));
                }
            }
        }

        Err(eyre::eyre!(
            "Turn limit ({}) reached without a final response",
            self.config.max_turns
        ))
    }

    /// Execute the requested tools, persist both sides, extend the history
    async fn handle_tool_use(
        &self,
        thread_id: &str,
        response: &CompletionResponse,
        tool_ctx: &ToolContext,
        messages: &mut Vec<Message>,
    ) -> eyre::Result<()> {
        debug!(thread_id, tool_count = response.tool_calls.len(), "handle_tool_use: called");

        let records: Vec<ToolCallRecord> = response
            .tool_calls
            .iter()
            .map(|call| ToolCallRecord {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.input.clone(),
            })
            .collect();
        let assistant_text = response.content.clone().unwrap_or_default();
        self.store
            .append(thread_id, &[ChatMessage::assistant_with_calls(&assistant_text, records)])?;

        let mut assistant_blocks = Vec::new();
        if !assistant_text.is_empty() {
            assistant_blocks.push(ContentBlock::text(&assistant_text));
        }
        for call in &response.tool_calls {
            assistant_blocks.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            });
        }
        messages.push(Message::assistant_blocks(assistant_blocks));

        let results = self.tools.execute_all(&response.tool_calls, tool_ctx).await;

        let mut result_blocks = Vec::new();
        let mut result_messages = Vec::new();
        for (call_id, result) in &results {
            if result.is_error {
                debug!(thread_id, %call_id, "handle_tool_use: tool returned error envelope");
            }
            let envelope = result.envelope_json().to_string();
            result_messages.push(ChatMessage::tool(call_id, &envelope));
            result_blocks.push(ContentBlock::tool_result(call_id, envelope, result.is_error));
        }
        self.store.append(thread_id, &result_messages)?;
        messages.push(Message::user_blocks(result_blocks));

        Ok(())
    }

    fn tool_context(&self, thread_id: &str) -> ToolContext {
        let mut ctx = ToolContext::new(self.config.root.clone(), thread_id.to_string())
            .with_command_policy(self.config.command_policy.clone())
            .with_command_timeout(self.config.command_timeout)
            .with_ask_user_timeout(self.config.ask_user_timeout);
        if let Some(prompter) = &self.prompter {
            ctx = ctx.with_prompter(prompter.clone());
        }
        ctx
    }
}

/// Convert persisted history into the model's message shape
///
/// Tool results become user-role tool_result blocks, mirroring how they
/// were presented when first produced, so resumed threads replay the same
/// conversation the model saw live.
fn to_model_messages(history: &[ChatMessage]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len());

    for msg in history {
        match msg.role {
            ChatRole::User => messages.push(Message::user(&msg.content)),
            ChatRole::Assistant => {
                if msg.tool_calls.is_empty() {
                    messages.push(Message::assistant(&msg.content));
                } else {
                    let mut blocks = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::text(&msg.content));
                    }
                    for call in &msg.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.arguments.clone(),
                        });
                    }
                    messages.push(Message::assistant_blocks(blocks));
                }
            }
            ChatRole::Tool => {
                let call_id = msg.tool_call_id.clone().unwrap_or_default();
                let is_error = serde_json::from_str::<serde_json::Value>(&msg.content)
                    .map(|v| v["status"] == "error")
                    .unwrap_or(false);
                let block = ContentBlock::tool_result(call_id, &msg.content, is_error);
                // Consecutive tool results collapse into one user message
                if let Some(Message {
                    content: crate::llm::MessageContent::Blocks(blocks),
                    role: crate::llm::Role::User,
                }) = messages.last_mut()
                {
                    blocks.push(block);
                } else {
                    messages.push(Message::user_blocks(vec![block]));
                }
            }
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::ToolCall;
    use tempfile::tempdir;

    fn engine_with(responses: Vec<CompletionResponse>, root: PathBuf, store_dir: &std::path::Path) -> AgentEngine {
        let llm = Arc::new(MockLlmClient::new(responses));
        let store = Arc::new(ConversationStore::open(store_dir).unwrap());
        AgentEngine::new(llm, ToolExecutor::standard(), store, AgentConfig::new(root))
    }

    #[tokio::test]
    async fn test_turn_with_final_text_only() {
        let work = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let engine = engine_with(
            vec![MockLlmClient::final_text("Hi there")],
            work.path().to_path_buf(),
            storage.path(),
        );

        let result = engine.run_turn("t1", "hello").await.unwrap();

        assert_eq!(result, "Hi there");
        let history = engine.store().history("t1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[1].content, "Hi there");
    }

    #[tokio::test]
    async fn test_turn_with_tool_call_writes_file_and_persists_four_messages() {
        let work = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let engine = engine_with(
            vec![
                MockLlmClient::tool_calls(vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "create_and_write_file".to_string(),
                    input: serde_json::json!({"path": "hello.txt", "content": "hello world"}),
                }]),
                MockLlmClient::final_text("Created hello.txt for you."),
            ],
            work.path().to_path_buf(),
            storage.path(),
        );

        let result = engine.run_turn("t1", "make hello.txt").await.unwrap();

        assert_eq!(result, "Created hello.txt for you.");
        assert_eq!(
            std::fs::read_to_string(work.path().join("hello.txt")).unwrap(),
            "hello world"
        );

        let history = engine.store().history("t1").unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[1].tool_calls.len(), 1);
        assert_eq!(history[1].tool_calls[0].name, "create_and_write_file");
        assert_eq!(history[2].role, ChatRole::Tool);
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert!(history[2].content.contains("\"status\":\"success\""));
        assert_eq!(history[3].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_failed_tool_feeds_error_envelope_back() {
        let work = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::new(vec![
            MockLlmClient::tool_calls(vec![ToolCall {
                id: "call_1".to_string(),
                name: "run_command".to_string(),
                input: serde_json::json!({"command": "false"}),
            }]),
            MockLlmClient::final_text("The command failed."),
        ]));
        let store = Arc::new(ConversationStore::open(storage.path()).unwrap());
        let engine = AgentEngine::new(
            llm.clone(),
            ToolExecutor::standard(),
            store,
            AgentConfig::new(work.path().to_path_buf()),
        );

        let result = engine.run_turn("t1", "run false").await.unwrap();
        assert_eq!(result, "The command failed.");

        // The second model call must carry the error envelope
        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        let last_msg = requests[1].messages.last().unwrap();
        match &last_msg.content {
            crate::llm::MessageContent::Blocks(blocks) => match &blocks[0] {
                ContentBlock::ToolResult { content, is_error, .. } => {
                    assert!(*is_error);
                    assert!(content.contains("\"status\":\"error\""));
                    assert!(content.contains("Exit code: 1"));
                }
                other => panic!("expected tool result block, got {:?}", other),
            },
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_abort_turn() {
        let work = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let engine = engine_with(
            vec![
                MockLlmClient::tool_calls(vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "teleport".to_string(),
                    input: serde_json::json!({}),
                }]),
                MockLlmClient::final_text("That tool does not exist."),
            ],
            work.path().to_path_buf(),
            storage.path(),
        );

        let result = engine.run_turn("t1", "teleport me").await.unwrap();
        assert_eq!(result, "That tool does not exist.");

        let history = engine.store().history("t1").unwrap();
        let tool_msg = history.iter().find(|m| m.role == ChatRole::Tool).unwrap();
        assert!(tool_msg.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_turn_limit_aborts_with_error() {
        let work = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let always_call = || {
            MockLlmClient::tool_calls(vec![ToolCall {
                id: "c".to_string(),
                name: "get_system_info".to_string(),
                input: serde_json::json!({}),
            }])
        };
        let llm = Arc::new(MockLlmClient::new(vec![always_call(), always_call(), always_call()]));
        let store = Arc::new(ConversationStore::open(storage.path()).unwrap());
        let mut config = AgentConfig::new(work.path().to_path_buf());
        config.max_turns = 2;
        let engine = AgentEngine::new(llm, ToolExecutor::standard(), store, config);

        let result = engine.run_turn("t1", "loop forever").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Turn limit"));
    }

    #[tokio::test]
    async fn test_resumed_thread_replays_prior_history() {
        let work = tempdir().unwrap();
        let storage = tempdir().unwrap();

        {
            let engine = engine_with(
                vec![MockLlmClient::final_text("First answer")],
                work.path().to_path_buf(),
                storage.path(),
            );
            engine.run_turn("t1", "first question").await.unwrap();
        }

        let llm = Arc::new(MockLlmClient::new(vec![MockLlmClient::final_text("Second answer")]));
        let store = Arc::new(ConversationStore::open(storage.path()).unwrap());
        let engine = AgentEngine::new(
            llm.clone(),
            ToolExecutor::standard(),
            store,
            AgentConfig::new(work.path().to_path_buf()),
        );
        engine.run_turn("t1", "second question").await.unwrap();

        // The request for the second turn must include the whole prior thread
        let requests = llm.requests();
        assert_eq!(requests[0].messages.len(), 3);
    }

    #[test]
    fn test_to_model_messages_groups_consecutive_tool_results() {
        let history = vec![
            ChatMessage::user("q"),
            ChatMessage::assistant_with_calls(
                "",
                vec![
                    ToolCallRecord {
                        id: "a".to_string(),
                        name: "check_file_exists".to_string(),
                        arguments: serde_json::json!({"path": "x"}),
                    },
                    ToolCallRecord {
                        id: "b".to_string(),
                        name: "check_file_exists".to_string(),
                        arguments: serde_json::json!({"path": "y"}),
                    },
                ],
            ),
            ChatMessage::tool("a", "{\"status\":\"success\",\"data\":true}"),
            ChatMessage::tool("b", "{\"status\":\"error\",\"message\":\"nope\"}"),
        ];

        let messages = to_model_messages(&history);

        assert_eq!(messages.len(), 3);
        match &messages[2].content {
            crate::llm::MessageContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                match &blocks[1] {
                    ContentBlock::ToolResult { is_error, .. } => assert!(*is_error),
                    other => panic!("expected tool result, got {:?}", other),
                }
            }
            other => panic!("expected blocks, got {:?}", other),
        }
    }
}
