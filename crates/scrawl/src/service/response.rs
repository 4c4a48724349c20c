use serde_json::json;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const NO_STORE: &str = "no-store";
pub const APPLICATION_JSON: &str = "application/json";

/// Transport-neutral HTTP response: status, headers and raw body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl RenderResponse {
    pub fn image(mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                (CONTENT_TYPE, mime_type.to_string()),
                (CACHE_CONTROL, NO_STORE.to_string()),
            ],
            body: bytes,
        }
    }

    /// `{ "error": message }` with the given status.
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            headers: vec![
                (CONTENT_TYPE, APPLICATION_JSON.to_string()),
                (CACHE_CONTROL, NO_STORE.to_string()),
            ],
            body: json!({ "error": message }).to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `error` field of a JSON error body.
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        value.get("error")?.as_str().map(str::to_string)
    }
}
