#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    #[default]
    Basic,
    BasicNoWebgl,
    Mid,
    Full,
    /// No stealth patching at all.
    None,
}

impl Tier {
    pub fn stealth(&self) -> bool {
        !matches!(self, Tier::None)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AgentOs {
    #[default]
    Linux,
    Mac,
    Windows,
    Android,
    Unknown,
}

impl AgentOs {
    /// Platform string a `navigator.platform`/`userAgentData.platform`
    /// consistent with this OS would report.
    pub fn navigator_platform(&self) -> &'static str {
        match self {
            AgentOs::Mac => "MacIntel",
            AgentOs::Windows => "Win32",
            AgentOs::Linux => "Linux x86_64",
            AgentOs::Android => "Linux armv8l",
            AgentOs::Unknown => "",
        }
    }

    pub fn ua_platform(&self) -> &'static str {
        match self {
            AgentOs::Mac => "macOS",
            AgentOs::Windows => "Windows",
            AgentOs::Linux => "Linux",
            AgentOs::Android => "Android",
            AgentOs::Unknown => "",
        }
    }

    /// A plausible IANA timezone for this platform's default locale.
    pub fn default_timezone(&self) -> &'static str {
        match self {
            AgentOs::Mac | AgentOs::Windows | AgentOs::Linux => "America/New_York",
            AgentOs::Android => "America/Los_Angeles",
            AgentOs::Unknown => "UTC",
        }
    }

    pub fn default_locale(&self) -> &'static str {
        "en-US"
    }
}
