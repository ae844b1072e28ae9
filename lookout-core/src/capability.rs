//! Client media capability detection.
//!
//! The transport resolver needs exactly one fact about the connecting client:
//! whether it can feed fragmented media to a video element (Media Source
//! Extensions, including the vendor-managed variant shipped by mobile
//! WebKit). Clients that can feature-detect report that directly; for plain
//! HTTP clients the capability is classified from the User-Agent string.

use serde::{Deserialize, Serialize};

/// Browser families with distinct media capability profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserFamily {
    Chromium,
    Firefox,
    Safari,
    /// WebKit on iOS/iPadOS devices, where every browser shares the system engine.
    MobileWebkit,
    Unknown,
}

/// Media playback capabilities of a connecting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilities {
    /// Whether the client supports MSE-style fragmented media playback.
    pub supports_mse: bool,
    /// The client's User-Agent string, kept for diagnostics.
    #[serde(default)]
    pub user_agent: String,
}

impl Default for MediaCapabilities {
    fn default() -> Self {
        // No information means no MSE, the conservative branch.
        Self {
            supports_mse: false,
            user_agent: String::new(),
        }
    }
}

impl MediaCapabilities {
    /// Capabilities as reported by a client that ran feature detection itself.
    pub fn reported(supports_mse: bool) -> Self {
        Self {
            supports_mse,
            user_agent: String::new(),
        }
    }

    /// Classifies capabilities from a User-Agent string.
    ///
    /// Desktop browsers all ship MSE. Mobile WebKit only counts as
    /// MSE-capable from the release that introduced the managed media source
    /// variant; older builds and unrecognized engines fall back to no MSE.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let supports_mse = match BrowserFamily::detect(user_agent) {
            BrowserFamily::Chromium | BrowserFamily::Firefox | BrowserFamily::Safari => true,
            BrowserFamily::MobileWebkit => has_managed_media_source(user_agent),
            BrowserFamily::Unknown => false,
        };

        Self {
            supports_mse,
            user_agent: user_agent.to_string(),
        }
    }
}

impl BrowserFamily {
    /// Detects the browser family from a User-Agent string.
    pub fn detect(user_agent: &str) -> Self {
        let user_agent = user_agent.to_lowercase();

        // iOS devices first: their User-Agents also contain "safari".
        if user_agent.contains("iphone") || user_agent.contains("ipad") {
            Self::MobileWebkit
        } else if user_agent.contains("chrome") || user_agent.contains("edg") {
            Self::Chromium
        } else if user_agent.contains("firefox") {
            Self::Firefox
        } else if user_agent.contains("safari") {
            Self::Safari
        } else {
            Self::Unknown
        }
    }
}

/// Managed media source shipped in mobile WebKit 17.1.
const MANAGED_MSE_MAJOR: u32 = 17;
const MANAGED_MSE_MINOR: u32 = 1;

fn has_managed_media_source(user_agent: &str) -> bool {
    match webkit_version(user_agent) {
        Some((major, minor)) => {
            major > MANAGED_MSE_MAJOR || (major == MANAGED_MSE_MAJOR && minor >= MANAGED_MSE_MINOR)
        }
        None => false,
    }
}

/// Extracts the "Version/x.y" token mobile WebKit advertises.
fn webkit_version(user_agent: &str) -> Option<(u32, u32)> {
    let token = user_agent
        .split_whitespace()
        .find_map(|part| part.strip_prefix("Version/"))?;

    let mut numbers = token.split('.');
    let major = numbers.next()?.parse().ok()?;
    let minor = numbers.next().and_then(|n| n.parse().ok()).unwrap_or(0);
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15";
    const IOS_17_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const IOS_16_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_family_detection() {
        assert_eq!(BrowserFamily::detect(CHROME_UA), BrowserFamily::Chromium);
        assert_eq!(BrowserFamily::detect(FIREFOX_UA), BrowserFamily::Firefox);
        assert_eq!(BrowserFamily::detect(SAFARI_UA), BrowserFamily::Safari);
        assert_eq!(BrowserFamily::detect(IOS_17_UA), BrowserFamily::MobileWebkit);
        assert_eq!(BrowserFamily::detect("curl/8.4.0"), BrowserFamily::Unknown);
    }

    #[test]
    fn test_desktop_browsers_support_mse() {
        assert!(MediaCapabilities::from_user_agent(CHROME_UA).supports_mse);
        assert!(MediaCapabilities::from_user_agent(FIREFOX_UA).supports_mse);
        assert!(MediaCapabilities::from_user_agent(SAFARI_UA).supports_mse);
    }

    #[test]
    fn test_mobile_webkit_needs_managed_media_source() {
        assert!(MediaCapabilities::from_user_agent(IOS_17_UA).supports_mse);
        assert!(!MediaCapabilities::from_user_agent(IOS_16_UA).supports_mse);
    }

    #[test]
    fn test_unknown_client_is_conservative() {
        assert!(!MediaCapabilities::from_user_agent("curl/8.4.0").supports_mse);
        assert!(!MediaCapabilities::from_user_agent("").supports_mse);
        assert!(!MediaCapabilities::default().supports_mse);
    }

    #[test]
    fn test_reported_capabilities_pass_through() {
        assert!(MediaCapabilities::reported(true).supports_mse);
        assert!(!MediaCapabilities::reported(false).supports_mse);
    }

    #[test]
    fn test_webkit_version_parsing() {
        assert_eq!(webkit_version(IOS_17_UA), Some((17, 1)));
        assert_eq!(webkit_version(IOS_16_UA), Some((16, 6)));
        assert_eq!(webkit_version("curl/8.4.0"), None);
    }
}
