use serde::{Deserialize, Serialize};

/// A token count, newtype'd so call sites can't mix it up with turn/step
/// counts or other plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TokenCount(i64);

impl TokenCount {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0.max(0) as u64
    }
}

/// A model's effective context window, in tokens.
///
/// Wraps the raw `u64` limit so usage-ratio/zone checks live in one place
/// instead of being recomputed ad hoc at every presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLimit(u64);

impl ContextLimit {
    pub const WARNING_RATIO: f64 = 0.6;
    pub const DANGER_RATIO: f64 = 0.8;

    pub fn new(limit: u64) -> Self {
        Self(limit)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn usage_ratio(&self, usage: TokenCount) -> f64 {
        if self.0 == 0 {
            return 0.0;
        }
        usage.as_u64() as f64 / self.0 as f64
    }

    pub fn is_exceeded(&self, usage: TokenCount) -> bool {
        usage.as_u64() > self.0
    }

    pub fn is_danger_zone(&self, usage: TokenCount) -> bool {
        self.usage_ratio(usage) >= Self::DANGER_RATIO
    }

    pub fn is_warning_zone(&self, usage: TokenCount) -> bool {
        self.usage_ratio(usage) >= Self::WARNING_RATIO
    }
}

/// Input tokens that were not served from any cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FreshInput(pub i32);

/// Input tokens written into the provider's prompt cache this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheCreation(pub i32);

/// Input tokens served from the provider's prompt cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheRead(pub i32);

/// Output (generated) tokens, including reasoning and tool-call tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Output(pub i32);

/// Token usage attached to a single assembled step.
///
/// Kept as a raw breakdown rather than a single total so streaming updates
/// can be merged with max-based semantics per field (see
/// `obscope_engine::session::stats::merge_usage`) instead of summed, which
/// would double-count cumulative provider reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContextWindowUsage {
    pub fresh_input: FreshInput,
    pub cache_creation: CacheCreation,
    pub cache_read: CacheRead,
    pub output: Output,
}

impl ContextWindowUsage {
    pub fn from_raw(fresh_input: i32, cache_creation: i32, cache_read: i32, output: i32) -> Self {
        Self {
            fresh_input: FreshInput(fresh_input),
            cache_creation: CacheCreation(cache_creation),
            cache_read: CacheRead(cache_read),
            output: Output(output),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fresh_input.0 == 0
            && self.cache_creation.0 == 0
            && self.cache_read.0 == 0
            && self.output.0 == 0
    }

    pub fn input_tokens(&self) -> i32 {
        self.fresh_input.0 + self.cache_creation.0 + self.cache_read.0
    }

    pub fn output_tokens(&self) -> i32 {
        self.output.0
    }

    pub fn total_tokens(&self) -> TokenCount {
        TokenCount::new((self.input_tokens() + self.output_tokens()) as i64)
    }
}
