// Runtime configuration: properties file plus environment fallback.

use std::collections::HashMap;
use std::path::Path;

use secrecy::SecretString;

use crate::error::Error;

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when the config file does not name one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Maximum number of retained conversation entries.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Properties file consulted at startup, overridable via `GEMCHAT_CONFIG`.
pub const CONFIG_FILE: &str = "config.properties";

/// Environment fallback for the API secret when the file has no `key` entry.
pub const KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Timeouts applied to every outbound call, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatTimeout {
    /// Connection timeout (default: 10.0).
    pub connect: f64,
    /// Total request timeout (default: 120.0).
    pub request: f64,
    /// Per-chunk read timeout while streaming the body (default: 30.0).
    pub stream_read: f64,
}

impl Default for ChatTimeout {
    fn default() -> Self {
        Self {
            connect: 10.0,
            request: 120.0,
            stream_read: 30.0,
        }
    }
}

/// Immutable process-wide settings, loaded once before the session starts.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Opaque API secret carried on every request.
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    /// Context window bound `H` for the conversation buffer.
    pub history_limit: usize,
    pub timeout: ChatTimeout,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

impl Settings {
    /// Load from the default config file location, honoring `GEMCHAT_CONFIG`.
    pub fn load_default() -> Result<Self, Error> {
        let path = std::env::var("GEMCHAT_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
        Self::load(path)
    }

    /// Load from an explicit properties file path.
    ///
    /// A missing file is tolerated (the key may still come from the
    /// environment); a missing `key` entry with no environment fallback is a
    /// fatal configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut map = match std::fs::read_to_string(path) {
            Ok(text) => parse_properties(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(Error::configuration(format!(
                    "cannot read config file {}: {err}",
                    path.display()
                )))
            }
        };
        if !map.contains_key("key") {
            if let Ok(key) = std::env::var(KEY_ENV_VAR) {
                map.insert("key".to_string(), key);
            }
        }
        Self::from_map(&map)
    }

    /// Build settings from already-parsed properties.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, Error> {
        let api_key = map
            .get("key")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "missing API key: add a `key` entry to {CONFIG_FILE} or set {KEY_ENV_VAR}"
                ))
            })?
            .clone();

        let timeout = ChatTimeout {
            connect: parse_value(map, "connect_timeout")?.unwrap_or(ChatTimeout::default().connect),
            request: parse_value(map, "request_timeout")?.unwrap_or(ChatTimeout::default().request),
            stream_read: parse_value(map, "stream_read_timeout")?
                .unwrap_or(ChatTimeout::default().stream_read),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: map
                .get("base_url")
                .cloned()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: map
                .get("model")
                .cloned()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            history_limit: parse_value(map, "history")?.unwrap_or(DEFAULT_HISTORY_LIMIT),
            timeout,
            temperature: parse_value(map, "temperature")?,
            top_p: parse_value(map, "top_p")?,
            top_k: parse_value(map, "top_k")?,
            max_output_tokens: parse_value(map, "max_output_tokens")?,
        })
    }
}

/// Parse an optional entry, failing fast on a malformed value.
fn parse_value<T: std::str::FromStr>(
    map: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, Error> {
    match map.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::configuration(format!("invalid value for `{key}`: {raw:?}"))),
    }
}

/// Parse a key-value properties file.
///
/// Lines are `key=value` or `key: value`; blank lines and lines starting
/// with `#` or `!` are skipped. Keys and values are trimmed.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some(sep) = line.find(['=', ':']) {
            let key = line[..sep].trim();
            let value = line[sep + 1..].trim();
            if !key.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}
