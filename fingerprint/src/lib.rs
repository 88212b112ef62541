pub mod configs;
pub mod spoof_mouse_movement;
pub mod spoof_user_agent;
pub mod spoof_viewport;
pub mod spoof_webgl;
pub mod spoofs;

pub use configs::{AgentOs, Tier};

/// Assemble the JS prelude injected before any page script runs, composed
/// from the template constants in [`spoofs`] and [`spoof_webgl`] according
/// to the requested stealth tier and platform.
pub fn build_stealth_script(tier: Tier, os: AgentOs, gpu: &spoof_webgl::GpuProfile) -> String {
    if !tier.stealth() {
        return String::new();
    }

    let mut parts = vec![
        spoofs::HIDE_WEBDRIVER,
        spoofs::HIDE_CHROME,
        spoofs::NAVIGATOR_SCRIPT,
    ];

    if tier != Tier::BasicNoWebgl {
        parts.push(match os {
            AgentOs::Mac => spoof_webgl::HIDE_WEBGL_MAC,
            _ => spoof_webgl::HIDE_WEBGL,
        });
    }

    if matches!(tier, Tier::Mid | Tier::Full) {
        parts.push(spoofs::PLUGIN_AND_MIMETYPE_SPOOF);
        parts.push(spoofs::SPOOF_PERMISSIONS_QUERY);
    }

    let mut script: String = parts.join("\n");

    if tier == Tier::Full {
        script.push('\n');
        script.push_str(&spoofs::canvas_noise_script(gpu.noise_seed));
        script.push('\n');
        script.push_str(&spoofs::audio_noise_script(gpu.noise_seed));
    }

    wrap_eval_script(&script)
}

/// Wrap a JS source fragment as a self-invoking function, matching the form
/// every template constant in [`spoofs`] already uses for its own body.
pub fn wrap_eval_script(source: &str) -> String {
    format!("(()=>{{{}}})();", source)
}
