use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The gate was closed (shutdown) before a slot was granted.
    #[error("concurrency gate is closed")]
    Closed,
}
