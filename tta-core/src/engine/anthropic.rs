//! Narrative engine backed by the Claude Messages API.

use super::{EngineConfig, EngineError, EngineRequest, EngineResponse, NarrativeEngine};
use async_trait::async_trait;
use claude::{Claude, Message, Request};
use tracing::{debug, warn};

/// How many transcript entries are quoted back to the model.
const HISTORY_WINDOW: usize = 12;

/// The AI game master.
pub struct ClaudeEngine {
    client: Claude,
    config: EngineConfig,
}

impl ClaudeEngine {
    /// Create an engine around an existing client.
    pub fn new(client: Claude, config: EngineConfig) -> Self {
        let client = match config.model {
            Some(ref model) => client.with_model(model.clone()),
            None => client,
        };
        Self { client, config }
    }

    /// Create an engine from the ANTHROPIC_API_KEY environment variable.
    ///
    /// An unset or blank key is [`claude::Error::NoApiKey`].
    pub fn from_env(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_key(claude::api_key_from_env()?, config)
    }

    /// Create an engine for an explicit API key.
    pub fn with_key(api_key: impl Into<String>, config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Claude::with_timeout(api_key, config.timeout)?;
        Ok(Self::new(client, config.clone()))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    async fn try_run(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        let mut api_request = Request::new(vec![Message::user(build_user_prompt(request))])
            .with_system(build_system_prompt())
            .with_max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            api_request = api_request.with_temperature(temperature);
        }

        let response = self.client.complete(api_request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "engine reply received"
        );
        parse_reply(&response.text())
    }
}

#[async_trait]
impl NarrativeEngine for ClaudeEngine {
    async fn run(&mut self, request: &EngineRequest) -> EngineResponse {
        match self.try_run(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, command = %request.command, "engine degraded");
                EngineResponse::degraded(&e)
            }
        }
    }

    fn name(&self) -> &str {
        "claude"
    }
}

fn build_system_prompt() -> String {
    let mut prompt = String::new();
    prompt.push_str(include_str!("prompts/engine_base.txt"));
    prompt.push_str("\n\n");
    prompt.push_str(include_str!("prompts/output_format.txt"));
    prompt
}

fn build_user_prompt(request: &EngineRequest) -> String {
    let state = serde_json::to_string_pretty(&request.game_state).unwrap_or_default();
    let graph = if request.graph_nodes.is_empty() {
        serde_json::to_string_pretty(&request.graph_node_labels).unwrap_or_default()
    } else {
        request
            .graph_nodes
            .iter()
            .map(|node| format!("- {} ({})", node.label, node.id))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut prompt = String::new();
    prompt.push_str("FILE CONTEXT (The Codebase):\n");
    prompt.push_str(&request.file_context);
    prompt.push_str("\n\nCURRENT STATE (Dolt DB):\n");
    prompt.push_str(&state);
    prompt.push_str("\n\nKNOWLEDGE GRAPH (Neo4j):\n");
    prompt.push_str(&graph);

    let start = request.transcript_history.len().saturating_sub(HISTORY_WINDOW);
    let recent = &request.transcript_history[start..];
    if !recent.is_empty() {
        prompt.push_str("\n\nRECENT TRANSCRIPT:\n");
        for entry in recent {
            prompt.push_str(&format!("[{}] {}\n", entry.kind.name(), entry.content));
        }
    }

    prompt.push_str(&format!("\n\nUSER INPUT:\n\"{}\"", request.command));
    prompt
}

/// Pull the JSON object out of a model reply, tolerating code fences and
/// surrounding prose.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_reply(text: &str) -> Result<EngineResponse, EngineError> {
    let json = extract_json(text).ok_or(EngineError::MissingJson)?;
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NodeRef;
    use crate::world::{GameState, LogEntry};

    fn request() -> EngineRequest {
        EngineRequest {
            command: "attack goblin".to_string(),
            game_state: GameState::new(20, 20, "Dark Forest (Edge)"),
            graph_node_labels: vec!["Player".to_string(), "Goblin Scout".to_string()],
            graph_nodes: vec![
                NodeRef {
                    id: "player".to_string(),
                    label: "Player".to_string(),
                },
                NodeRef {
                    id: "npc1".to_string(),
                    label: "Goblin Scout".to_string(),
                },
            ],
            file_context: "\n--- START OF FILE combat.py ---\ndef attack(): pass\n--- END OF FILE combat.py ---\n"
                .to_string(),
            transcript_history: vec![LogEntry::neural("A goblin watches you.")],
        }
    }

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"narrative\": \"x\", \"trace\": \"y\"}\n```";
        assert_eq!(
            extract_json(reply),
            Some("{\"narrative\": \"x\", \"trace\": \"y\"}")
        );
        assert_eq!(extract_json("no braces"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(
            parse_reply("I cannot do that."),
            Err(EngineError::MissingJson)
        ));
        assert!(matches!(
            parse_reply("{\"narrative\": 3}"),
            Err(EngineError::Malformed(_))
        ));

        let ok = parse_reply("{\"narrative\": \"Steel rings.\", \"trace\": \"> roll\"}").unwrap();
        assert_eq!(ok.narrative, "Steel rings.");
    }

    #[test]
    fn test_user_prompt_sections() {
        let prompt = build_user_prompt(&request());
        assert!(prompt.contains("--- START OF FILE combat.py ---"));
        assert!(prompt.contains("\"maxHp\": 20"));
        assert!(prompt.contains("- Goblin Scout (npc1)"));
        assert!(prompt.contains("- Player (player)"));
        assert!(prompt.contains("[neural] A goblin watches you."));
        assert!(prompt.ends_with("USER INPUT:\n\"attack goblin\""));
    }

    #[test]
    fn test_user_prompt_without_ids_lists_labels() {
        let mut request = request();
        request.graph_nodes.clear();
        let prompt = build_user_prompt(&request);
        assert!(prompt.contains("\"Goblin Scout\""));
        assert!(!prompt.contains("(npc1)"));
    }

    #[test]
    fn test_system_prompt_names_output_fields() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("TTA-Solo Engine"));
        for field in ["narrative", "trace", "stateUpdates", "newNodes", "newLinks", "commitMessage"] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_degrades() {
        let client = Claude::with_timeout("test-key", std::time::Duration::from_millis(200))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let mut engine = ClaudeEngine::new(client, EngineConfig::default());

        let response = engine.run(&request()).await;
        assert_eq!(response.narrative, super::super::DEGRADED_NARRATIVE);
        assert!(response.trace.starts_with("[ERROR] "));
    }
}
