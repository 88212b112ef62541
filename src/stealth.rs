//! Stealth Patcher (§4.9): makes a session consistent with a fingerprint
//! profile before any page script runs. The corpus of opaque JS templates
//! lives in `kuromi_fingerprint`; this module is the mechanism that wires
//! them into CDP (`Page.addScriptToEvaluateOnNewDocument`, `Emulation.*`,
//! `Network.*`) and adds the handful of overrides the corpus doesn't cover
//! (`navigator.platform`, `screen.*`, `Intl.DateTimeFormat`).

use std::sync::Arc;

use kuromi_fingerprint::spoof_user_agent::build_high_entropy_data;
use kuromi_fingerprint::spoof_viewport::Viewport;
use kuromi_fingerprint::spoof_webgl::GpuProfile;
use kuromi_fingerprint::{build_stealth_script, wrap_eval_script, AgentOs, Tier};

use crate::cdp::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use crate::cdp::network::{
    SetExtraHttpHeadersParams, SetUserAgentOverrideParams, UserAgentBrandVersion,
    UserAgentMetadata,
};
use crate::cdp::page::AddScriptToEvaluateOnNewDocumentParams;
use crate::error::Result;
use crate::session::Session;

/// A fully-resolved identity to present to a page: stealth tier, claimed
/// platform, UA string, and the handful of values that must stay mutually
/// consistent with it.
#[derive(Debug, Clone)]
pub struct FingerprintProfile {
    pub tier: Tier,
    pub os: AgentOs,
    pub user_agent: String,
    pub viewport: Viewport,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub extra_headers: Vec<(String, String)>,
}

impl FingerprintProfile {
    pub fn new(tier: Tier, os: AgentOs, user_agent: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            tier,
            os,
            user_agent: user_agent.into(),
            viewport,
            timezone: None,
            locale: None,
            extra_headers: Vec::new(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    fn timezone_id(&self) -> String {
        self.timezone
            .clone()
            .unwrap_or_else(|| self.os.default_timezone().to_string())
    }

    fn locale_tag(&self) -> String {
        self.locale
            .clone()
            .unwrap_or_else(|| self.os.default_locale().to_string())
    }

    /// Checks the UA-vs-platform consistency rule spec.md §4.9 requires:
    /// an "mac"/"windows"/"linux" token in the UA string must agree with
    /// the platform this profile would report. Mirrors the validation in
    /// the original fingerprint generator, ported to plain pattern checks.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        let ua = self.user_agent.to_lowercase();
        let platform = self.os.navigator_platform();
        let claims_mac = ua.contains("mac os") || ua.contains("macintosh");
        let claims_windows = ua.contains("windows");
        let claims_linux = ua.contains("linux") && !ua.contains("android");

        if claims_mac && self.os != AgentOs::Mac {
            return Err(format!(
                "user agent claims macOS but profile os is {:?} (platform {platform})",
                self.os
            ));
        }
        if claims_windows && self.os != AgentOs::Windows {
            return Err(format!(
                "user agent claims Windows but profile os is {:?} (platform {platform})",
                self.os
            ));
        }
        if claims_linux && !matches!(self.os, AgentOs::Linux | AgentOs::Android) {
            return Err(format!(
                "user agent claims Linux but profile os is {:?} (platform {platform})",
                self.os
            ));
        }
        Ok(())
    }
}

/// JS override for `navigator.platform` / `screen.*`, the two surfaces the
/// `kuromi_fingerprint` corpus leaves untouched because they depend on the
/// caller's chosen viewport rather than a fixed template.
fn platform_and_screen_script(profile: &FingerprintProfile) -> String {
    let platform = profile.os.navigator_platform();
    let width = profile.viewport.width;
    let height = profile.viewport.height;
    format!(
        r#"const p='{platform}';Object.defineProperty(Navigator.prototype,'platform',{{get:()=>p,configurable:true}});const sv={{width:{width},height:{height},availWidth:{width},availHeight:{height}}};for(const k in sv){{Object.defineProperty(Screen.prototype,k,{{get:()=>sv[k],configurable:true}});}}"#,
        platform = platform,
        width = width,
        height = height,
    )
}

/// JS override for `Intl.DateTimeFormat.prototype.resolvedOptions`, so the
/// JS-visible timezone/locale agree with `Emulation.setTimezoneOverride`/
/// `setLocaleOverride` even before the first CDP round-trip completes.
fn intl_script(timezone: &str, locale: &str) -> String {
    format!(
        r#"const ro=Intl.DateTimeFormat.prototype.resolvedOptions;Object.defineProperty(Intl.DateTimeFormat.prototype,'resolvedOptions',{{value:function(...a){{const o=ro.apply(this,a);o.timeZone='{tz}';o.locale='{loc}';return o}},configurable:true}});"#,
        tz = timezone,
        loc = locale,
    )
}

pub struct StealthPatcher;

impl StealthPatcher {
    /// Applies `profile` to `session`: the pre-navigation JS prelude plus
    /// every CDP-level override the prelude can't reach. Idempotent per
    /// session — domain enables go through `Session::mark_enabled`, and
    /// each override is simply resent if called again with the same or a
    /// new profile.
    pub async fn apply(session: &Arc<Session>, profile: &FingerprintProfile) -> Result<()> {
        if session.mark_enabled("Page") {
            session.execute(crate::cdp::page::EnableParams {}).await?;
        }

        let gpu = GpuProfile::for_os(profile.os);
        let mut script = build_stealth_script(profile.tier, profile.os, &gpu);
        if profile.tier.stealth() {
            script.push('\n');
            script.push_str(&wrap_eval_script(&platform_and_screen_script(profile)));
            script.push('\n');
            script.push_str(&wrap_eval_script(&intl_script(
                &profile.timezone_id(),
                &profile.locale_tag(),
            )));
        }
        if !script.is_empty() {
            session
                .execute(AddScriptToEvaluateOnNewDocumentParams { source: script })
                .await?;
        }

        session
            .execute(SetDeviceMetricsOverrideParams {
                width: profile.viewport.width as i64,
                height: profile.viewport.height as i64,
                device_scale_factor: profile.viewport.device_scale_factor.unwrap_or(1.0),
                mobile: profile.viewport.emulating_mobile,
            })
            .await?;

        session
            .execute(SetTimezoneOverrideParams {
                timezone_id: profile.timezone_id(),
            })
            .await?;

        session
            .execute(SetLocaleOverrideParams {
                locale: Some(profile.locale_tag()),
            })
            .await?;

        let high_entropy = build_high_entropy_data(&profile.user_agent, profile.os);
        session
            .execute(SetUserAgentOverrideParams {
                user_agent: profile.user_agent.clone(),
                accept_language: Some(profile.locale_tag()),
                user_agent_metadata: Some(UserAgentMetadata {
                    brands: high_entropy
                        .full_version_list
                        .iter()
                        .map(|e| UserAgentBrandVersion {
                            brand: e.brand.clone(),
                            version: e.version.clone(),
                        })
                        .collect(),
                    full_version_list: high_entropy
                        .full_version_list
                        .into_iter()
                        .map(|e| UserAgentBrandVersion {
                            brand: e.brand,
                            version: e.version,
                        })
                        .collect(),
                    platform: high_entropy.platform.to_string(),
                    platform_version: high_entropy.platform_version.to_string(),
                    architecture: high_entropy.architecture.to_string(),
                    model: high_entropy.model.to_string(),
                    mobile: profile.viewport.emulating_mobile,
                    bitness: high_entropy.bitness.to_string(),
                }),
            })
            .await?;

        if !profile.extra_headers.is_empty() {
            session
                .execute(SetExtraHttpHeadersParams {
                    headers: profile.extra_headers.iter().cloned().collect(),
                })
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuromi_fingerprint::spoof_viewport::Viewport;

    #[test]
    fn mac_ua_with_linux_os_fails_consistency() {
        let profile = FingerprintProfile::new(
            Tier::Full,
            AgentOs::Linux,
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Chrome/124.0.0.0",
            Viewport::default(),
        );
        assert!(profile.check_consistency().is_err());
    }

    #[test]
    fn matching_ua_and_os_pass_consistency() {
        let profile = FingerprintProfile::new(
            Tier::Full,
            AgentOs::Windows,
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/124.0.0.0",
            Viewport::default(),
        );
        assert!(profile.check_consistency().is_ok());
    }

    #[test]
    fn intl_script_embeds_timezone_and_locale() {
        let script = intl_script("America/New_York", "en-US");
        assert!(script.contains("America/New_York"));
        assert!(script.contains("en-US"));
    }
}
