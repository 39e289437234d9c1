//! Shared library for the CivicNexus query functions.
//!
//! This crate provides the query pipeline (intent routing, complaint filing,
//! grounded policy answers, accessibility rewriting) and the common
//! configuration, error and HTTP utilities used by the Lambda functions.

pub mod accessibility;
pub mod assistant;
pub mod complaint;
pub mod config;
pub mod corpus;
pub mod decode;
pub mod document;
pub mod embedding;
pub mod error;
pub mod http;
pub mod index;
pub mod llm;
pub mod models;
pub mod rag;
pub mod router;
pub mod secrets;

#[cfg(test)]
mod testing;

pub use accessibility::AccessibilityAdapter;
pub use assistant::CivicAssistant;
pub use complaint::ComplaintHandler;
pub use config::Config;
pub use decode::Decoded;
pub use document::DocumentVerifier;
pub use embedding::{BedrockEmbedder, Embedder, HashingEmbedder, SentenceEmbedder};
pub use error::{Error, Result};
pub use index::{PolicyIndex, SearchHit};
pub use llm::{Gateway, GatewayMode, OfflineResponder, TextGenerator};
pub use models::{
    CitizenProfile, Department, LiteracyLevel, Plan, PolicyDocument, ProfileTable, QueryRequest,
    ResponseBody, ResponsePayload, Tool, Urgency,
};
pub use rag::RetrievalEngine;
pub use router::IntentRouter;
pub use secrets::{get_secret, resolve_api_key};
