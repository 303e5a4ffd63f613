//! Scripted doubles for the model and store seams.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use growthstack_common::gemini::{
    ContentModel, GeminiError, GenerateContentRequest, GenerateContentResponse,
};
use growthstack_common::store::KeyValueStore;

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        true
    }
}

/// A model that replays a fixed reply sequence and records every request.
/// Panics on a call past the end of the script.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<GenerateContentResponse, GeminiError>>>,
    pub requests: Mutex<Vec<(String, GenerateContentRequest)>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<GenerateContentResponse, GeminiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentModel for ScriptedModel {
    async fn generate(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("model called more times than scripted")
    }
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    serde_json::from_value(serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    }))
    .unwrap()
}

pub fn grounded_response(text: &str, chunks: serde_json::Value) -> GenerateContentResponse {
    serde_json::from_value(serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"text": text}]},
            "groundingMetadata": {"groundingChunks": chunks}
        }]
    }))
    .unwrap()
}
