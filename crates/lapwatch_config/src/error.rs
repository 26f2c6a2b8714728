use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown CPU clock `{0}` (expected `process` or `thread`)")]
    UnknownCpuClock(String),

    #[error("invalid flag value `{0}` (expected true/false, 1/0, yes/no, on/off)")]
    InvalidFlag(String),
}
