//! Subsystem modules for the SmartQA service.

pub mod comms;
pub mod history;
pub mod knowledge;
pub mod qa;
pub mod rag;
pub mod runtime;
pub mod settings;
