//! Configuration surface for a [`crate::context::ProtocolContext`].

/// Hard cap on `payload_length` a context will accept, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4096;

/// Default generic operation timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 5000;

/// Default interval between outbound heartbeats, in milliseconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u32 = 5000;

/// Default deadline for a command to receive its response, in milliseconds.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u32 = 5000;

/// Default number of reconnect attempts before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Per-context configuration.
///
/// `flags` and `memory_pool_size` are advisory: this implementation does
/// not pool memory or interpret reserved flag bits itself, but carries them
/// so a caller embedding this runtime can use them as hints.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Reserved for future use; carried but not interpreted.
    pub flags: u32,
    /// Advisory hint for a caller-managed buffer pool's capacity.
    pub memory_pool_size: usize,
    /// Opaque bytes handed back unchanged alongside every emitted action's
    /// originating context; this runtime never inspects its contents.
    pub user_data: Option<Vec<u8>>,
    /// Hard cap on accepted `payload_length`, in bytes.
    pub max_message_size: usize,
    /// Generic operation timeout, in milliseconds.
    pub timeout_ms: u32,
    /// Whether the client orchestrator should reconnect after disconnect.
    pub reconnect: bool,
    /// Maximum reconnect attempts before giving up.
    pub max_retries: u32,
    /// Interval between outbound heartbeats, in milliseconds.
    pub heartbeat_interval_ms: u32,
    /// Deadline for a command to receive its response, in milliseconds.
    pub response_timeout_ms: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            flags: 0,
            memory_pool_size: 0,
            user_data: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reconnect: true,
            max_retries: DEFAULT_MAX_RETRIES,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        }
    }
}
