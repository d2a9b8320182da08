//! Process-wide defaults read once from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `VARSINK_BUFFER_SIZE` | 131072 | Buffer size for freshly opened files (0 disables) |
//! | `VARSINK_CREATE_MD5` | false | Write a `.md5` sidecar next to file outputs |
//! | `VARSINK_USE_ASYNC_IO` | false | Add `UseAsyncIo` to every new builder's options |
//! | `VARSINK_ASYNC_QUEUE_SIZE` | 2000 | Capacity of the async forwarding queue |
//!
//! Values are read the first time [`Defaults::global`] is called; later changes
//! to the environment are not observed.

use std::sync::OnceLock;

/// Default buffer size for file outputs (128 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Default capacity of the async forwarding queue
pub const DEFAULT_ASYNC_QUEUE_SIZE: usize = 2000;

/// Environment-derived defaults applied to new builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Buffer size for freshly opened files; 0 disables buffering
    pub buffer_size: usize,
    /// Whether to write a checksum sidecar for file outputs
    pub create_md5: bool,
    /// Whether new builders start with `UseAsyncIo`
    pub use_async_io: bool,
    /// Capacity of the async forwarding queue
    pub async_queue_size: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            create_md5: false,
            use_async_io: false,
            async_queue_size: DEFAULT_ASYNC_QUEUE_SIZE,
        }
    }
}

static GLOBAL: OnceLock<Defaults> = OnceLock::new();

impl Defaults {
    /// Defaults for this process, read from the environment on first use
    pub fn global() -> &'static Defaults {
        GLOBAL.get_or_init(|| Defaults::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build defaults from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let fallback = Defaults::default();
        let async_queue_size = parse_or("VARSINK_ASYNC_QUEUE_SIZE", &lookup, fallback.async_queue_size);
        Self {
            buffer_size: parse_or("VARSINK_BUFFER_SIZE", &lookup, fallback.buffer_size),
            create_md5: parse_flag_or("VARSINK_CREATE_MD5", &lookup, fallback.create_md5),
            use_async_io: parse_flag_or("VARSINK_USE_ASYNC_IO", &lookup, fallback.use_async_io),
            async_queue_size: async_queue_size.max(1),
        }
    }
}

fn parse_or<F>(key: &str, lookup: &F, fallback: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            fallback
        }),
        None => fallback,
    }
}

fn parse_flag_or<F>(key: &str, lookup: &F, fallback: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => true,
        Some("0") | Some("false") | Some("FALSE") | Some("no") => false,
        Some(other) => {
            log::warn!("Ignoring {}={:?}: expected true or false", key, other);
            fallback
        }
        None => fallback,
    }
}
