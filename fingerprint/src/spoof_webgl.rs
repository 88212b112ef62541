/// UNMASKED_VENDOR_WEBGL / UNMASKED_RENDERER_WEBGL pair drawn from a
/// specific GPU family, used to keep the WebGL identity consistent with the
/// claimed platform (see [`crate::AgentOs`]).
#[derive(Debug, Clone)]
pub struct GpuProfile {
    pub vendor: &'static str,
    pub renderer: &'static str,
    /// Seed shared with the canvas/audio noise injectors so repeated
    /// fingerprinting attempts against the same profile observe the same
    /// (still noisy) values.
    pub noise_seed: u64,
}

impl GpuProfile {
    pub fn for_os(os: crate::AgentOs) -> Self {
        match os {
            crate::AgentOs::Mac => Self {
                vendor: "Google Inc. (Apple)",
                renderer: "ANGLE (Apple, ANGLE Metal Renderer: Apple M1 Max, Unspecified Version)",
                noise_seed: 0,
            },
            _ => Self {
                vendor: "Google Inc. (NVIDIA)",
                renderer: "ANGLE (NVIDIA, NVIDIA GeForce GTX 1050 Direct3D11 vs_5_0 ps_5_0, D3D11-27.21.14.5671)",
                noise_seed: 0,
            },
        }
    }

    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }
}

pub const HIDE_WEBGL: &str = r#"const v='Google Inc. (NVIDIA)',r='ANGLE (NVIDIA, NVIDIA GeForce GTX 1050 Direct3D11 vs_5_0 ps_5_0, D3D11-27.21.14.5671)',f=p=>p===37445?v:p===37446?r:null;for(const k of['WebGLRenderingContext','WebGL2RenderingContext']){const o=globalThis[k]?.prototype?.getParameter;if(o){Object.defineProperty(globalThis[k].prototype,'getParameter',{value:function(p){const spoof=f(p);return spoof??o.call(this,p);},configurable:true});}}"#;

pub const HIDE_WEBGL_MAC: &str = r#"const v='Google Inc. (Apple)',r='ANGLE (Apple, ANGLE Metal Renderer: Apple M1 Max, Unspecified Version)',f=p=>p===37445?v:p===37446?r:null;for(const k of['WebGLRenderingContext','WebGL2RenderingContext']){const o=globalThis[k]?.prototype?.getParameter;if(o){Object.defineProperty(globalThis[k].prototype,'getParameter',{value:function(p){const spoof=f(p);return spoof??o.call(this,p);},configurable:true});}}"#;
