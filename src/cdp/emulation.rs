use serde::Serialize;

use super::{Method, MethodId};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDeviceMetricsOverrideParams {
    pub width: i64,
    pub height: i64,
    pub device_scale_factor: f64,
    pub mobile: bool,
}
impl Method for SetDeviceMetricsOverrideParams {
    fn identifier(&self) -> MethodId {
        "Emulation.setDeviceMetricsOverride".into()
    }
}
impl super::Command for SetDeviceMetricsOverrideParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTimezoneOverrideParams {
    pub timezone_id: String,
}
impl Method for SetTimezoneOverrideParams {
    fn identifier(&self) -> MethodId {
        "Emulation.setTimezoneOverride".into()
    }
}
impl super::Command for SetTimezoneOverrideParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLocaleOverrideParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}
impl Method for SetLocaleOverrideParams {
    fn identifier(&self) -> MethodId {
        "Emulation.setLocaleOverride".into()
    }
}
impl super::Command for SetLocaleOverrideParams {
    type Response = serde_json::Value;
}
