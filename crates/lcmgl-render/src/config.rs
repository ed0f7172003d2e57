pub const DEFAULT_MAX_STACK_DEPTH: usize = 64;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

pub const MAX_STACK_DEPTH_ENV: &str = "LCMGL_MAX_STACK_DEPTH";
pub const QUEUE_CAPACITY_ENV: &str = "LCMGL_INGEST_QUEUE_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

/// Limits applied to a single decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_stack_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
        }
    }
}

impl DecoderConfig {
    pub fn new(max_stack_depth: usize) -> Result<Self, ConfigError> {
        if max_stack_depth == 0 {
            return Err(ConfigError::Zero {
                field: "max_stack_depth",
            });
        }
        Ok(Self { max_stack_depth })
    }

    /// Deepest allowed nesting of push opcodes. A buffer may reach this depth;
    /// one more push fails.
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Defaults, overridden by `LCMGL_MAX_STACK_DEPTH` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        match lookup(MAX_STACK_DEPTH_ENV) {
            Some(raw) => Self::new(parse_positive(MAX_STACK_DEPTH_ENV, &raw)?),
            None => Ok(Self::default()),
        }
    }
}

/// Sizing of the queue between the messaging thread and the render thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl IngestConfig {
    pub fn new(queue_capacity: usize) -> Result<Self, ConfigError> {
        if queue_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "queue_capacity",
            });
        }
        Ok(Self { queue_capacity })
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Defaults, overridden by `LCMGL_INGEST_QUEUE_CAPACITY` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        match lookup(QUEUE_CAPACITY_ENV) {
            Some(raw) => Self::new(parse_positive(QUEUE_CAPACITY_ENV, &raw)?),
            None => Ok(Self::default()),
        }
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: raw.to_owned(),
        }),
    }
}
