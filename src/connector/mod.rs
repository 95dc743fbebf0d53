//! # Connector Layer
//!
//! External integrations implementing domain and application interfaces:
//! - Embedding generation (mock and ONNX Runtime providers)
//! - Storage (DuckDB for repositories, chunk tables, the graph, and vectors)
//! - Parsing (Tree-sitter for multi-language AST extraction)
//! - LLM chat (Anthropic Messages API / LM Studio)

pub mod adapter;

pub use adapter::*;
