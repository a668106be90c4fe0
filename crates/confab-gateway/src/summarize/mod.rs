//! Summarization pipeline: aggregates per-meeting responses, calls the LLM
//! with a strict JSON contract, and reconstructs a trusted summary (spec §4.6).

pub mod llm;
pub mod orchestrator;

pub use llm::{LlmClient, ReqwestLlmClient, StubLlmClient};
pub use orchestrator::SummaryOrchestrator;
