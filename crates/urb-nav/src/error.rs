//! Navigation error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("bad magic in graph file (expected {expected})")]
    BadMagic { expected: &'static str },

    #[error("graph file truncated: header promises {expected} nodes, read {got}")]
    ShortRead { expected: u32, got: u32 },

    #[error("graph header is inconsistent: {0}")]
    BadHeader(String),

    #[error("node {node}: dangling link to node {target}")]
    DanglingLink { node: u32, target: u32 },

    #[error("node {node}: invalid {field} value {value}")]
    BadField {
        node:  u32,
        field: &'static str,
        value: u32,
    },

    #[error("semaphore index {idx} out of range [1, {max})")]
    SemaphoreIndex { idx: i64, max: usize },

    #[error("semaphore {idx}: impossible times total={total} green={green}")]
    SemaphoreTimes { idx: usize, total: i64, green: i64 },

    #[error("graph build error: {0}")]
    Build(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NavResult<T> = Result<T, NavError>;
