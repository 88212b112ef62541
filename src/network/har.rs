//! HAR Recorder: subscribes to the Monitor and, for each
//! `loadingFinished`, emits a HAR 1.2 `entry` built from the request
//! record's timestamps. Supplements spec.md; fresh typed reimplementation
//! of `examples/original_source/kuromi_browser/network/har.py`'s dict
//! building.

use serde::Serialize;

use super::monitor::{NetworkMonitor, RequestRecord};

#[derive(Debug, Clone, Serialize)]
pub struct HarHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarQueryParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarPostData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarRequest {
    pub method: String,
    pub url: String,
    #[serde(rename = "httpVersion")]
    pub http_version: String,
    pub cookies: Vec<serde_json::Value>,
    pub headers: Vec<HarHeader>,
    #[serde(rename = "queryString")]
    pub query_string: Vec<HarQueryParam>,
    #[serde(rename = "postData", skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
    #[serde(rename = "headersSize")]
    pub headers_size: i64,
    #[serde(rename = "bodySize")]
    pub body_size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarContent {
    pub size: i64,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarResponse {
    pub status: i64,
    #[serde(rename = "statusText")]
    pub status_text: String,
    #[serde(rename = "httpVersion")]
    pub http_version: String,
    pub cookies: Vec<serde_json::Value>,
    pub headers: Vec<HarHeader>,
    pub content: HarContent,
    #[serde(rename = "redirectURL")]
    pub redirect_url: String,
    #[serde(rename = "headersSize")]
    pub headers_size: i64,
    #[serde(rename = "bodySize")]
    pub body_size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarTimings {
    pub send: f64,
    pub wait: f64,
    pub receive: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarEntry {
    #[serde(rename = "startedDateTime")]
    pub started_date_time: String,
    pub time: f64,
    pub request: HarRequest,
    pub response: HarResponse,
    pub cache: serde_json::Value,
    pub timings: HarTimings,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarCreator {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarBrowser {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarLog {
    pub version: String,
    pub creator: HarCreator,
    pub browser: HarBrowser,
    pub entries: Vec<HarEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarDocument {
    pub log: HarLog,
}

pub struct HarRecorder;

impl HarRecorder {
    /// Builds a HAR 1.2 document from every closed request record the
    /// Monitor holds. Records with no response (still in-flight, or a
    /// failed request) are skipped — a HAR entry requires a response.
    pub fn build(monitor: &NetworkMonitor) -> HarDocument {
        let entries = monitor
            .get_requests(None)
            .into_iter()
            .filter_map(Self::entry_for)
            .collect();

        HarDocument {
            log: HarLog {
                version: "1.2".to_string(),
                creator: HarCreator {
                    name: "kuromi-browser-core".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                browser: HarBrowser {
                    name: "Chromium".to_string(),
                    version: String::new(),
                },
                entries,
            },
        }
    }

    fn entry_for(record: RequestRecord) -> Option<HarEntry> {
        let response = record.response.clone()?;
        let wait_ms = record
            .response_timestamp
            .map(|t| (t - record.timestamp) * 1000.0)
            .unwrap_or(0.0)
            .max(0.0);

        let query_string = url::Url::parse(&record.url)
            .map(|parsed| {
                parsed
                    .query_pairs()
                    .map(|(name, value)| HarQueryParam {
                        name: name.into_owned(),
                        value: value.into_owned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let post_data = record.post_data.as_ref().map(|text| HarPostData {
            mime_type: record
                .headers
                .get("Content-Type")
                .cloned()
                .unwrap_or_default(),
            text: text.clone(),
        });

        let redirect_url = response
            .headers
            .get("Location")
            .cloned()
            .unwrap_or_default();

        Some(HarEntry {
            started_date_time: format_timestamp(record.timestamp),
            time: wait_ms,
            request: HarRequest {
                method: record.method,
                url: record.url,
                http_version: "HTTP/1.1".to_string(),
                cookies: Vec::new(),
                headers: record
                    .headers
                    .iter()
                    .map(|(name, value)| HarHeader {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
                query_string,
                post_data,
                headers_size: -1,
                body_size: record.post_data.map(|d| d.len() as i64).unwrap_or(0),
            },
            response: HarResponse {
                status: response.status,
                status_text: String::new(),
                http_version: "HTTP/1.1".to_string(),
                cookies: Vec::new(),
                headers: response
                    .headers
                    .iter()
                    .map(|(name, value)| HarHeader {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
                content: HarContent {
                    size: -1,
                    mime_type: response.mime_type,
                },
                redirect_url,
                headers_size: -1,
                body_size: -1,
            },
            cache: serde_json::json!({}),
            timings: HarTimings {
                send: 0.0,
                wait: wait_ms,
                receive: 0.0,
            },
        })
    }
}

/// CDP request timestamps are monotonic-clock seconds, not wall-clock —
/// there is no reliable way to recover an absolute `startedDateTime` from
/// them alone, so this renders the raw timestamp rather than fabricating a
/// calendar date.
fn format_timestamp(timestamp: f64) -> String {
    format!("{timestamp:.6}")
}
