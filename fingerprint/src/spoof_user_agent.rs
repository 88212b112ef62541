use crate::AgentOs;

/// One entry of the Client Hints `userAgentData.brands` / `fullVersionList`
/// array.
#[derive(Debug, Clone)]
pub struct BrandEntry {
    pub brand: String,
    pub version: String,
}

/// High-entropy Client Hints values reported by `navigator.userAgentData`
/// and the `Sec-CH-UA-*` request headers, kept consistent with the UA
/// string and the claimed platform.
#[derive(Debug, Clone)]
pub struct HighEntropyUaData {
    pub architecture: &'static str,
    pub bitness: &'static str,
    pub model: &'static str,
    pub platform: &'static str,
    pub platform_version: &'static str,
    pub full_version_list: Vec<BrandEntry>,
}

/// Extract the `Chrome/<version>` token from a user-agent string.
fn chrome_version(user_agent: &str) -> &str {
    user_agent
        .split("Chrome/")
        .nth(1)
        .and_then(|rest| rest.split(' ').next())
        .unwrap_or("")
}

pub fn build_high_entropy_data(user_agent: &str, os: AgentOs) -> HighEntropyUaData {
    let version = chrome_version(user_agent).to_string();
    let major = version.split('.').next().unwrap_or("").to_string();

    let (architecture, bitness, model, platform_version) = match os {
        AgentOs::Android => ("", "64", "Pixel 7", "13.0.0"),
        AgentOs::Windows => ("x86", "64", "", "15.0.0"),
        AgentOs::Mac => ("arm", "64", "", "14.4.0"),
        AgentOs::Linux => ("x86", "64", "", ""),
        AgentOs::Unknown => ("", "", "", ""),
    };

    HighEntropyUaData {
        architecture,
        bitness,
        model,
        platform: os.ua_platform(),
        platform_version,
        full_version_list: vec![
            BrandEntry {
                brand: "Not/A)Brand".into(),
                version: "8.0.0.0".into(),
            },
            BrandEntry {
                brand: "Chromium".into(),
                version: version.clone(),
            },
            BrandEntry {
                brand: "Google Chrome".into(),
                version,
            },
        ]
        .into_iter()
        .map(|mut e| {
            if e.brand == "Chromium" || e.brand == "Google Chrome" {
                e.version = format!("{major}.0.0.0", major = major);
            }
            e
        })
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_chrome_version() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
        assert_eq!(chrome_version(ua), "124.0.0.0");
    }

    #[test]
    fn mac_platform_is_consistent() {
        let data = build_high_entropy_data("Chrome/124.0.0.0", AgentOs::Mac);
        assert_eq!(data.platform, "macOS");
    }
}
