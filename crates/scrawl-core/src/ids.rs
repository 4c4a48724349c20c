/// Source of identifiers and per-element nonces for synthesized elements.
///
/// Values are opaque: callers may rely on uniqueness only.
pub trait IdSource {
    fn next_id(&mut self) -> String;
    /// Positive 31-bit value for `seed` / `versionNonce`.
    fn next_nonce(&mut self) -> i64;
    /// Unix time in milliseconds for the `updated` attribute.
    fn timestamp_ms(&mut self) -> i64;
}

/// Random identifiers (UUID v4, simple form) and nonces derived from fresh UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdSource for IdGenerator {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn next_nonce(&mut self) -> i64 {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) & 0x7fff_ffff;
        i64::from(raw.max(1))
    }

    fn timestamp_ms(&mut self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Counter-driven ids, `<prefix>-<n>`, used by the scene DSL.
///
/// A single counter drives ids, seeds, nonces and timestamps, so output is reproducible for a
/// fixed start time. Both [`CounterIds::next_with_prefix`] and [`CounterIds::timestamp_ms`]
/// advance it.
#[derive(Debug, Clone)]
pub struct CounterIds {
    counter: i64,
    start_ms: i64,
}

impl CounterIds {
    pub fn new(start_ms: i64) -> Self {
        Self {
            counter: 1,
            start_ms,
        }
    }

    pub fn next_with_prefix(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.counter);
        self.counter += 1;
        id
    }

    pub fn seed(&self) -> i64 {
        self.counter
    }

    pub fn version_nonce(&self) -> i64 {
        self.counter + 100
    }

    /// Start time plus the counter; advances the counter.
    pub fn timestamp_ms(&mut self) -> i64 {
        let ts = self.start_ms + self.counter;
        self.counter += 1;
        ts
    }
}
