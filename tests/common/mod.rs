#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use recipe_intake::embeddings::Embedder;
use recipe_intake::providers::{CompletionOptions, LlmProvider};
use recipe_intake::url_to_text::fetchers::{DocumentFetcher, FetchedDocument};
use recipe_intake::url_to_text::guard::HostResolver;
use recipe_intake::{BoxError, PersistedRecipe, RecipeInsert, RecipeIntake, RecipeStore};

/// Text-generation fake: JSON-mode calls are answered by system prompt,
/// text-mode calls (translation) from a queue.
#[derive(Default)]
pub struct ScriptedProvider {
    json: Mutex<HashMap<&'static str, String>>,
    text: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, system_prompt: &'static str, reply: &str) -> Self {
        self.json.lock().unwrap().insert(system_prompt, reply.to_string());
        self
    }

    pub fn then_text(self, reply: &str) -> Self {
        self.text.lock().unwrap().push_back(reply.to_string());
        self
    }

    pub fn calls_to(&self, system_prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(prompt, _)| prompt == system_prompt)
            .count()
    }

    pub fn user_contents(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: CompletionOptions,
    ) -> Result<String, BoxError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_content.to_string()));

        if options.json_mode {
            self.json
                .lock()
                .unwrap()
                .get(system_prompt)
                .cloned()
                .ok_or_else(|| "no scripted reply for this prompt".into())
        } else {
            self.text
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| "no scripted text reply left".into())
        }
    }
}

/// Resolves every host to the same addresses.
pub struct StaticResolver(pub Vec<IpAddr>);

impl StaticResolver {
    pub fn public() -> Self {
        Self(vec!["93.184.216.34".parse().unwrap()])
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, _host: &str, _port: u16) -> Result<Vec<IpAddr>, BoxError> {
        Ok(self.0.clone())
    }
}

/// Serves canned pages by URL and counts requests.
#[derive(Default)]
pub struct PageFetcher {
    pages: HashMap<String, String>,
    requests: AtomicUsize,
}

impl PageFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, BoxError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(match self.pages.get(url) {
            Some(body) => FetchedDocument {
                status: 200,
                body: body.clone(),
                final_url: url.to_string(),
            },
            None => FetchedDocument {
                status: 404,
                body: String::new(),
                final_url: url.to_string(),
            },
        })
    }
}

/// Storage fake with per-collection read and write grants.
pub struct RecordingStore {
    pub identity: Option<String>,
    pub default_collection: Option<String>,
    pub readable: Vec<String>,
    pub writable: Vec<String>,
    pub inserts: Mutex<Vec<RecipeInsert>>,
}

impl RecordingStore {
    pub fn new(user: &str) -> Self {
        Self {
            identity: Some(user.to_string()),
            default_collection: None,
            readable: Vec::new(),
            writable: Vec::new(),
            inserts: Mutex::new(Vec::new()),
        }
    }

    pub fn can_read(mut self, collection: &str) -> Self {
        self.readable.push(collection.to_string());
        self
    }

    pub fn can_write(mut self, collection: &str) -> Self {
        self.writable.push(collection.to_string());
        self
    }

    pub fn with_default(mut self, collection: &str) -> Self {
        self.default_collection = Some(collection.to_string());
        self
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.lock().unwrap().len()
    }
}

#[async_trait]
impl RecipeStore for RecordingStore {
    async fn insert_recipe(&self, payload: RecipeInsert) -> Result<PersistedRecipe, BoxError> {
        let mut inserts = self.inserts.lock().unwrap();
        inserts.push(payload.clone());
        Ok(PersistedRecipe {
            id: format!("recipe-{}", inserts.len()),
            draft: payload.draft,
            owner_user_id: payload.owner_user_id,
            group_id: payload.group_id,
            embedding: payload.embedding,
            created_at: "2026-10-14T12:00:00Z".to_string(),
            updated_at: "2026-10-14T12:00:00Z".to_string(),
        })
    }

    async fn check_read_access(&self, _user_id: &str, collection_id: &str) -> Result<bool, BoxError> {
        Ok(self.readable.iter().any(|c| c == collection_id))
    }

    async fn check_write_access(&self, _user_id: &str, collection_id: &str) -> Result<bool, BoxError> {
        Ok(self.writable.iter().any(|c| c == collection_id))
    }

    async fn resolve_default_collection(&self, _user_id: &str) -> Result<Option<String>, BoxError> {
        Ok(self.default_collection.clone())
    }

    async fn authenticated_identity(&self) -> Result<Option<String>, BoxError> {
        Ok(self.identity.clone())
    }
}

/// Returns a constant vector, or always fails.
pub struct FakeEmbedder {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("embedding service unavailable".into());
        }
        Ok(vec![0.25; 4])
    }

    fn dimensions(&self) -> usize {
        4
    }
}

pub fn intake(provider: Arc<ScriptedProvider>, fetcher: Arc<PageFetcher>) -> RecipeIntake {
    RecipeIntake::builder()
        .provider(provider)
        .fetcher(fetcher)
        .resolver(Arc::new(StaticResolver::public()))
        .build()
        .unwrap()
}
