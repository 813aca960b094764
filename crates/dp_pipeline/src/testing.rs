//! Stub collaborators for pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use dp_cache::{CacheHandle, MemoryStore};
use dp_core::{
    ContentSource, Error, Paper, Result, SpeechSynthesizer, TextGenerator,
};

use crate::{Pipeline, PipelineOptions};

/// A conversation response as the generation service returns it.
pub const CONVERSATION_JSON: &str = r#"{"conversation":[{"speaker":"Brian","text":"Welcome back."},{"speaker":"Jenny","text":"Glad to be here."}]}"#;

#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn papers(count: usize) -> Vec<Paper> {
    (1..=count)
        .map(|n| Paper {
            title: format!("Paper {n}"),
            url: format!("https://hf.co/papers/{n}"),
            abstract_text: Some(format!("Abstract of paper {n}.")),
            published_at: Utc::now(),
        })
        .collect()
}

pub struct StubSource {
    papers: Vec<Paper>,
    failure: Option<String>,
    pub calls: CallCounter,
}

#[async_trait]
impl ContentSource for StubSource {
    async fn fetch_papers(&self) -> Result<Vec<Paper>> {
        self.calls.bump();
        match &self.failure {
            Some(message) => Err(Error::Scraping(message.clone())),
            None => Ok(self.papers.clone()),
        }
    }
}

/// Replays a script of responses, then falls back to a fixed response (or an
/// error when none is configured). Records every prompt it sees.
pub struct StubGenerator {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: Option<String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub calls: CallCounter,
}

impl StubGenerator {
    pub fn always(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response.to_string()),
            prompts: Arc::default(),
            calls: CallCounter::default(),
        }
    }

    pub fn scripted(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            prompts: Arc::default(),
            calls: CallCounter::default(),
        }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.bump();
        self.prompts.lock().unwrap().push(prompt.to_string());
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::Generation(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| Error::Generation("stub script exhausted".to_string())),
        }
    }
}

/// Returns a distinct audio segment per call and records `(voice, text)`
/// pairs in call order.
pub struct StubSynthesizer {
    failure: Option<String>,
    pub requests: Arc<Mutex<Vec<(String, String)>>>,
    pub calls: CallCounter,
}

impl StubSynthesizer {
    pub fn ok() -> Self {
        Self {
            failure: None,
            requests: Arc::default(),
            calls: CallCounter::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::ok()
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        self.calls.bump();
        if let Some(message) = &self.failure {
            return Err(Error::Synthesis(message.clone()));
        }
        self.requests
            .lock()
            .unwrap()
            .push((voice.to_string(), text.to_string()));
        Ok(format!("[{voice}|{text}]").into_bytes())
    }
}

pub struct PipelineBuilder {
    source: Arc<StubSource>,
    generator: Arc<StubGenerator>,
    synthesizer: Arc<StubSynthesizer>,
    cache: CacheHandle,
    memory: Option<Arc<MemoryStore>>,
    options: PipelineOptions,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            source: Arc::new(StubSource {
                papers: papers(2),
                failure: None,
                calls: CallCounter::default(),
            }),
            generator: Arc::new(StubGenerator::always(CONVERSATION_JSON)),
            synthesizer: Arc::new(StubSynthesizer::ok()),
            cache: CacheHandle::disabled(),
            memory: None,
            options: PipelineOptions {
                papers_url: "https://hf.co/papers".to_string(),
                site_url: "https://dailypapers.dev".to_string(),
                ..PipelineOptions::default()
            },
        }
    }

    pub fn papers(mut self, papers: Vec<Paper>) -> Self {
        self.source = Arc::new(StubSource {
            papers,
            failure: None,
            calls: CallCounter::default(),
        });
        self
    }

    pub fn failing_source(mut self, message: &str) -> Self {
        self.source = Arc::new(StubSource {
            papers: Vec::new(),
            failure: Some(message.to_string()),
            calls: CallCounter::default(),
        });
        self
    }

    pub fn generator(mut self, generator: StubGenerator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn synthesizer(mut self, synthesizer: StubSynthesizer) -> Self {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    pub fn max_papers(mut self, max_papers: usize) -> Self {
        self.options.max_papers = max_papers;
        self
    }

    pub fn with_memory_cache(mut self) -> Self {
        let store = Arc::new(MemoryStore::new());
        self.cache = CacheHandle::new(store.clone(), Duration::from_secs(600));
        self.memory = Some(store);
        self
    }

    pub fn cache(mut self, cache: CacheHandle) -> Self {
        self.cache = cache;
        self
    }

    pub fn source_calls(&self) -> CallCounter {
        self.source.calls.clone()
    }

    pub fn generator_calls(&self) -> CallCounter {
        self.generator.calls.clone()
    }

    pub fn synthesizer_calls(&self) -> CallCounter {
        self.synthesizer.calls.clone()
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.generator.prompts.clone()
    }

    pub fn synthesis_requests(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        self.synthesizer.requests.clone()
    }

    pub fn memory_store(&self) -> Option<Arc<MemoryStore>> {
        self.memory.clone()
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(
            self.source,
            self.generator,
            self.synthesizer,
            self.cache,
            self.options,
        )
    }
}
