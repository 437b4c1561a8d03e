use crate::database::MongoDB;
use crate::services::medicine_service;
use crate::utils::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on tool round-trips per chat request. The model normally needs
/// one lookup; the bound stops a misbehaving model from looping forever.
const MAX_TOOL_ROUNDS: usize = 4;

const TEMPERATURE: f32 = 0.6;
const MAX_TOKENS: u32 = 1000;

const SYSTEM_PROMPT: &str = "\
You are MediBot, a professional, empathetic, and factual virtual medical assistant. \
Your purpose is to help users understand medicines safely and accurately.

Your capabilities:
- Retrieve and present detailed medicine information from the database.
- Use the available tools (read_medicines, read_medicine_by_name) to get data before replying.
- Explain a medicine's composition, uses, side effects, and reviews clearly.
- Answer queries conversationally and reassuringly without medical jargon.

Response guidelines:
1. When a user asks about a medicine, always check the database using \
read_medicine_by_name. If found, summarize the medicine name, composition, \
uses, side effects, and review percentages in a warm, professional tone.
2. If not found in the database, politely inform the user that the medicine \
isn't listed and suggest checking the spelling or consulting a pharmacist.
3. Do not make diagnoses, dosage recommendations, or medical prescriptions.

Always maintain a calm, reassuring, and helpful tone.";

lazy_static::lazy_static! {
    static ref HTTP_CLIENT: reqwest::Client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client");
}

fn get_llm_base_url() -> String {
    std::env::var("LLM_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn get_llm_model() -> String {
    std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string())
}

fn get_llm_api_key() -> Result<String, AppError> {
    std::env::var("LLM_API_KEY")
        .or_else(|_| std::env::var("GEMINI_API_KEY"))
        .map_err(|_| AppError::LlmError("LLM_API_KEY not configured".to_string()))
}

// ===== OpenAI-compatible wire types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self { role: "system".to_string(), content: Some(content.to_string()), tool_calls: None, tool_call_id: None }
    }

    fn user(content: &str) -> Self {
        Self { role: "user".to_string(), content: Some(content.to_string()), tool_calls: None, tool_call_id: None }
    }

    fn tool_result(tool_call_id: &str, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String, // JSON-encoded argument object
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    tools: serde_json::Value,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ===== Tools =====

/// Function declarations for the two medicine lookup tools.
pub fn tool_definitions() -> serde_json::Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "read_medicines",
                "description": "Fetch all medicines from the database.",
                "parameters": {
                    "type": "object",
                    "properties": {},
                    "required": []
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "read_medicine_by_name",
                "description": "Fetch a medicine by its name (case-insensitive exact match).",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Name of the medicine to look up"
                        }
                    },
                    "required": ["name"]
                }
            }
        }
    ])
}

fn parse_name_argument(arguments: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(arguments)
        .ok()?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

async fn execute_tool(db: &MongoDB, name: &str, arguments: &str) -> String {
    let payload = match name {
        "read_medicines" => medicine_service::read_medicines(db).await,
        "read_medicine_by_name" => match parse_name_argument(arguments) {
            Some(medicine_name) => {
                medicine_service::read_medicine_by_name(db, &medicine_name).await
            }
            None => {
                log::warn!("⚠️ read_medicine_by_name called without a 'name' argument");
                medicine_service::ToolPayload {
                    data: json!({}),
                    error: true,
                    message: "Missing required argument 'name'".to_string(),
                }
            }
        },
        other => {
            log::warn!("⚠️ Model requested unknown tool: {}", other);
            medicine_service::ToolPayload {
                data: json!({}),
                error: true,
                message: format!("Unknown tool '{}'", other),
            }
        }
    };

    serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())
}

// ===== Agent run =====

async fn chat_completion(
    api_key: &str,
    messages: &[ChatMessage],
) -> Result<ChatMessage, AppError> {
    let url = format!("{}/chat/completions", get_llm_base_url());

    let request = ChatCompletionRequest {
        model: get_llm_model(),
        messages: messages.to_vec(),
        tools: tool_definitions(),
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };

    let response = HTTP_CLIENT
        .post(&url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| AppError::LlmError(format!("LLM request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::LlmError(format!(
            "LLM API returned {}: {}",
            status, body
        )));
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| AppError::LlmError(format!("Failed to parse LLM response: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| AppError::LlmError("LLM response contained no choices".to_string()))
}

/// Run the medical chat agent: send the conversation to the model and
/// resolve tool calls against the medicines collection until the model
/// produces a final answer.
pub async fn run_chat(db: &MongoDB, user_input: &str) -> Result<String, AppError> {
    let api_key = get_llm_api_key()?;

    let mut messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_input),
    ];

    for round in 0..=MAX_TOOL_ROUNDS {
        let reply = chat_completion(&api_key, &messages).await?;

        let tool_calls = match &reply.tool_calls {
            Some(calls) if !calls.is_empty() => calls.clone(),
            _ => {
                return reply
                    .content
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| {
                        AppError::LlmError("LLM returned an empty response".to_string())
                    });
            }
        };

        if round == MAX_TOOL_ROUNDS {
            log::warn!("⚠️ Tool round limit reached, returning last content");
            return reply
                .content
                .filter(|c| !c.is_empty())
                .ok_or_else(|| AppError::LlmError("Tool round limit exceeded".to_string()));
        }

        log::info!("🔁 Tool round {}: {} call(s)", round + 1, tool_calls.len());

        messages.push(reply);
        for call in &tool_calls {
            let result = execute_tool(db, &call.function.name, &call.function.arguments).await;
            messages.push(ChatMessage::tool_result(&call.id, result));
        }
    }

    // Loop always returns from within; kept for the type checker
    Err(AppError::LlmError("Tool round limit exceeded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions_shape() {
        let tools = tool_definitions();
        let tools = tools.as_array().unwrap();
        assert_eq!(tools.len(), 2);

        let names: Vec<&str> = tools
            .iter()
            .map(|t| t["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["read_medicines", "read_medicine_by_name"]);

        // read_medicine_by_name requires its 'name' argument
        assert_eq!(tools[1]["function"]["parameters"]["required"][0], "name");
    }

    #[test]
    fn test_parse_name_argument() {
        assert_eq!(
            parse_name_argument(r#"{"name": "Dolo 650"}"#).as_deref(),
            Some("Dolo 650")
        );
        assert_eq!(parse_name_argument(r#"{}"#), None);
        assert_eq!(parse_name_argument("not json"), None);
        assert_eq!(parse_name_argument(r#"{"name": 42}"#), None);
    }

    #[test]
    fn test_tool_message_serialization() {
        let msg = ChatMessage::tool_result("call_123", "{\"Error\":false}".to_string());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_123");
        // Unused optional fields are omitted from the wire format
        assert!(value.get("tool_calls").is_none());
    }

    #[test]
    fn test_assistant_tool_call_deserialization() {
        let json = r#"{
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "read_medicine_by_name", "arguments": "{\"name\":\"Dolo 650\"}"}
            }]
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "read_medicine_by_name");
        assert_eq!(
            parse_name_argument(&calls[0].function.arguments).as_deref(),
            Some("Dolo 650")
        );
    }
}
