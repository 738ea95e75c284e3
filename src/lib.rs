//! SmartQA — banking FAQ matcher and retrieval-augmented answer service.
//!
//! - **core** — configuration and the application error type.
//! - **bootstrap** — logger initialisation.
//! - **llm** — language-model providers used by the RAG service.
//! - **subsystems** — knowledge store, FAQ engine, RAG, settings, history
//!   and the comms channels that expose them.

pub mod bootstrap;
pub mod core;
pub mod llm;
pub mod subsystems;

pub use crate::bootstrap::logger;
pub use crate::core::{config, error};
