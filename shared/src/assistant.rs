//! Query pipeline: route, dispatch to a handler, adapt for the citizen.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::accessibility::AccessibilityAdapter;
use crate::complaint::ComplaintHandler;
use crate::corpus::{load_policies, load_profiles};
use crate::document::DocumentVerifier;
use crate::embedding::{BedrockEmbedder, Embedder, HashingEmbedder, SentenceEmbedder};
use crate::index::PolicyIndex;
use crate::llm::{Gateway, TextGenerator};
use crate::models::{Plan, PolicyDocument, ProfileTable, QueryRequest, ResponseBody, ResponsePayload, Tool};
use crate::rag::RetrievalEngine;
use crate::router::IntentRouter;
use crate::{Config, Result};

/// Answers citizen queries end to end.
///
/// Holds no per-request state; one instance serves concurrent queries.
pub struct CivicAssistant {
    router: IntentRouter,
    complaints: ComplaintHandler,
    retrieval: RetrievalEngine,
    documents: DocumentVerifier,
    adapter: AccessibilityAdapter,
    profiles: ProfileTable,
}

impl CivicAssistant {
    /// Wire every component to the same generator.
    pub fn new(generator: Arc<dyn TextGenerator>, index: Arc<PolicyIndex>, profiles: ProfileTable) -> Self {
        Self {
            router: IntentRouter::new(generator.clone()),
            complaints: ComplaintHandler::new(generator.clone()),
            retrieval: RetrievalEngine::new(index, generator.clone()),
            documents: DocumentVerifier::new(),
            adapter: AccessibilityAdapter::new(generator),
            profiles,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.retrieval = self.retrieval.with_top_k(top_k);
        self
    }

    /// Load the corpus and profiles, pick the gateway and embedder, and build the index.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(Gateway::from_config(config).await);
        let policies = load_policies(&config.policies_path)?;
        let profiles = load_profiles(&config.citizen_profiles_path)?;

        let fallback: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(config.embedding_dimensions));
        let index = build_index(policies, configured_embedder(config).await, fallback).await?;

        Ok(Self::new(generator, Arc::new(index), profiles).with_top_k(config.retrieval_top_k))
    }

    /// Handle one query. Never fails: unexpected errors become an error payload.
    pub async fn handle(&self, request: &QueryRequest) -> ResponsePayload {
        info!(
            citizen_id = request.citizen_id.as_deref().unwrap_or("-"),
            language = %request.language,
            "Received query"
        );

        match self.process(request).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Error processing query");
                ResponsePayload::error(&e)
            }
        }
    }

    async fn process(&self, request: &QueryRequest) -> Result<ResponsePayload> {
        let plan = self.router.route(&request.query).await;
        info!(tool = %plan.tool, "Routed query");

        let body = self.dispatch(&plan).await?;

        let profile = request
            .citizen_id
            .as_deref()
            .and_then(|id| self.profiles.get(id));
        Ok(self.adapter.adapt(body, profile).await)
    }

    /// Run the handler selected by `plan`.
    pub async fn dispatch(&self, plan: &Plan) -> Result<ResponseBody> {
        match plan.tool {
            Tool::Complaint => Ok(self.complaints.process(&plan.input).await),
            Tool::Policy => self.retrieval.answer(&plan.input).await,
            Tool::Document => Ok(self.documents.verify(&plan.input)),
        }
    }
}

/// Semantic embedder selected by configuration: Bedrock Titan when a model id
/// is set, else the local sentence model.
async fn configured_embedder(config: &Config) -> Option<Arc<dyn Embedder>> {
    if let Some(model_id) = &config.bedrock_embedding_model_id {
        let sdk_config = config.aws_sdk_config().await;
        return Some(Arc::new(BedrockEmbedder::new(
            aws_sdk_bedrockruntime::Client::new(&sdk_config),
            model_id.clone(),
            config.embedding_dimensions,
        )));
    }

    let name = config.sentence_model.as_deref()?;
    match SentenceEmbedder::new(name, config.embedding_cache_dir.clone()) {
        Ok(embedder) => Some(Arc::new(embedder)),
        Err(e) => {
            warn!(error = %e, "Sentence model unavailable, using hashing embedder");
            None
        }
    }
}

/// Build the index with `primary`, or with `fallback` when there is no
/// primary embedder or it fails.
async fn build_index(
    policies: Vec<PolicyDocument>,
    primary: Option<Arc<dyn Embedder>>,
    fallback: Arc<dyn Embedder>,
) -> Result<PolicyIndex> {
    let index = match primary {
        Some(embedder) => match PolicyIndex::build(policies.clone(), embedder).await {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "Semantic embeddings unavailable, using hashing embedder");
                PolicyIndex::build(policies, fallback).await?
            }
        },
        None => PolicyIndex::build(policies, fallback).await?,
    };

    info!(documents = index.len(), dimension = index.dimension(), "Indexed policies");
    Ok(index)
}
