use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: Option<f64>,
    pub emulating_mobile: bool,
    pub is_landscape: bool,
    pub has_touch: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        }
    }
}

impl Viewport {
    pub fn set_mobile(mut self, mobile: bool) -> Self {
        self.emulating_mobile = mobile;
        self.has_touch = mobile;
        self
    }

    pub fn set_landscape(mut self, landscape: bool) -> Self {
        self.is_landscape = landscape;
        self
    }

    pub fn set_touch(mut self, touch: bool) -> Self {
        self.has_touch = touch;
        self
    }

    pub fn set_scale_factor(mut self, factor: Option<f64>) -> Self {
        self.device_scale_factor = factor;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

pub fn randomize_viewport(device: &DeviceType) -> Viewport {
    randomize_viewport_rng(device, &mut rand::rng())
}

pub fn randomize_viewport_rng(device: &DeviceType, rng: &mut impl Rng) -> Viewport {
    match device {
        DeviceType::Mobile => Viewport {
            width: rng.random_range(320..=480),
            height: rng.random_range(480..=800),
            device_scale_factor: Some(2.0),
            emulating_mobile: true,
            is_landscape: false,
            has_touch: true,
        },
        DeviceType::Tablet => Viewport {
            width: rng.random_range(600..=800),
            height: rng.random_range(800..=1200),
            device_scale_factor: Some(2.0),
            emulating_mobile: true,
            is_landscape: false,
            has_touch: true,
        },
        DeviceType::Desktop => Viewport {
            width: rng.random_range(1024..=1920),
            height: rng.random_range(768..=1080),
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        },
    }
}

/// Pick a device type weighted toward desktop (matches real-world traffic
/// mix more closely than a uniform choice) and randomize its viewport.
pub fn get_random_viewport() -> Viewport {
    get_random_viewport_rng(&mut rand::rng())
}

pub fn get_random_viewport_rng(rng: &mut impl Rng) -> Viewport {
    let device = match rng.random_range(0..5) {
        0 => DeviceType::Mobile,
        1 => DeviceType::Tablet,
        _ => DeviceType::Desktop,
    };
    randomize_viewport_rng(&device, rng)
}
