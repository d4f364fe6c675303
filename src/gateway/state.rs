use std::sync::Arc;

use crate::engine::QueryEngine;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct HandlerState {
    pub engine: Arc<QueryEngine>,

    /// Which generator backs the engine (`"llm"` or `"template"`), reported by `/ready`.
    pub generator_mode: &'static str,
}

impl HandlerState {
    pub fn new(engine: Arc<QueryEngine>, generator_mode: &'static str) -> Self {
        Self {
            engine,
            generator_mode,
        }
    }
}
