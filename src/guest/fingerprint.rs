//! Semi-persistent device fingerprint used to bind a guest's quota
//! record to one browser profile.
//!
//! This is not a cryptographic identifier. Everything here is
//! controlled by the client and trivially spoofed.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::json;

const USER_AGENT_MAX_CHARS: usize = 100;

pub trait FingerprintSource {
    fn fingerprint(&self) -> String;
}

/// Device, display and locale signals a fingerprint is derived from.
#[derive(Clone, Debug, Serialize)]
pub struct FingerprintSignals {
    pub screen_width: u32,
    pub screen_height: u32,
    pub timezone: String,
    pub language: String,
    pub platform: String,
    /// Data URL of a canvas rendering. `None` when canvas rendering
    /// isn't available.
    pub canvas: Option<String>,
    pub user_agent: String,
}

impl FingerprintSignals {
    /// Signals for a guest session driven from this machine's
    /// environment rather than a browser.
    pub fn from_host() -> Self {
        let timezone = std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string());
        let language = std::env::var("LANG")
            .ok()
            .and_then(|lang| lang.split('.').next().map(|s| s.replace('_', "-")))
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| "en-US".to_string());
        Self {
            screen_width: 0,
            screen_height: 0,
            timezone,
            language,
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            canvas: None,
            user_agent: format!("multichat-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FingerprintSource for FingerprintSignals {
    fn fingerprint(&self) -> String {
        let user_agent: String = self.user_agent.chars().take(USER_AGENT_MAX_CHARS).collect();
        let mut value = json!({
            "screen": format!("{}x{}", self.screen_width, self.screen_height),
            "timezone": self.timezone,
            "language": self.language,
            "platform": self.platform,
            "userAgent": user_agent,
        });
        if let Some(canvas) = &self.canvas {
            value["canvas"] = json!(canvas);
        }
        STANDARD.encode(value.to_string())
    }
}

/// A fixed fingerprint, handy when the identity is already known.
#[derive(Clone, Debug)]
pub struct StaticFingerprint(pub String);

impl FingerprintSource for StaticFingerprint {
    fn fingerprint(&self) -> String {
        self.0.clone()
    }
}
