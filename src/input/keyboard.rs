//! §4.6 Input Synthesis: keyboard. Per-character `keyDown`/`keyUp` timing
//! approximating human typing cadence, plus occasional typo-and-correct
//! bursts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lazy_static::lazy_static;
use rand::Rng;

use crate::cdp::input::{DispatchKeyEventParams, KeyEventType};
use crate::error::Result;
use crate::session::Session;

/// Characters per minute used to derive the base inter-keystroke delay.
pub const DEFAULT_CPM: f64 = 300.0;
pub const MIN_DELAY_MS: f64 = 20.0;
pub const MAX_DELAY_MS: f64 = 300.0;
pub const HOLD_MIN_MS: u64 = 20;
pub const HOLD_MAX_MS: u64 = 80;
pub const TYPO_PROBABILITY: f64 = 0.02;
const WORD_BOUNDARY_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
struct KeyDef {
    key: &'static str,
    code: &'static str,
    vk: i64,
    text: Option<&'static str>,
}

macro_rules! key {
    ($key:expr, $code:expr, $vk:expr) => {
        KeyDef { key: $key, code: $code, vk: $vk, text: None }
    };
    ($key:expr, $code:expr, $vk:expr, $text:expr) => {
        KeyDef { key: $key, code: $code, vk: $vk, text: Some($text) }
    };
}

static NAMED_KEYS: phf::Map<&'static str, KeyDef> = phf::phf_map! {
    "Enter" => key!("Enter", "Enter", 13, "\r"),
    "Tab" => key!("Tab", "Tab", 9),
    "Escape" => key!("Escape", "Escape", 27),
    "Backspace" => key!("Backspace", "Backspace", 8),
    "Delete" => key!("Delete", "Delete", 46),
    "ArrowLeft" => key!("ArrowLeft", "ArrowLeft", 37),
    "ArrowUp" => key!("ArrowUp", "ArrowUp", 38),
    "ArrowRight" => key!("ArrowRight", "ArrowRight", 39),
    "ArrowDown" => key!("ArrowDown", "ArrowDown", 40),
    "Home" => key!("Home", "Home", 36),
    "End" => key!("End", "End", 35),
    "PageUp" => key!("PageUp", "PageUp", 33),
    "PageDown" => key!("PageDown", "PageDown", 34),
    "Space" => key!("Space", "Space", 32, " "),
    "Shift" => key!("Shift", "ShiftLeft", 16),
    "Control" => key!("Control", "ControlLeft", 17),
    "Alt" => key!("Alt", "AltLeft", 18),
    "Meta" => key!("Meta", "MetaLeft", 91),
    "F1" => key!("F1", "F1", 112),
    "F2" => key!("F2", "F2", 113),
    "F3" => key!("F3", "F3", 114),
    "F4" => key!("F4", "F4", 115),
    "F5" => key!("F5", "F5", 116),
    "F6" => key!("F6", "F6", 117),
    "F7" => key!("F7", "F7", 118),
    "F8" => key!("F8", "F8", 119),
    "F9" => key!("F9", "F9", 120),
    "F10" => key!("F10", "F10", 121),
    "F11" => key!("F11", "F11", 122),
    "F12" => key!("F12", "F12", 123),
};

fn resolve_alias(name: &str) -> &str {
    match name {
        "Ctrl" => "Control",
        "Esc" => "Escape",
        other => other,
    }
}

fn resolve_named(name: &str) -> Option<KeyDef> {
    NAMED_KEYS.get(resolve_alias(name)).copied()
}

/// `None` for a key that isn't a modifier.
fn modifier_bit(name: &str) -> Option<i64> {
    use crate::cdp::input::modifiers::{ALT, CTRL, META, SHIFT};
    match resolve_alias(name) {
        "Alt" => Some(ALT),
        "Control" => Some(CTRL),
        "Meta" => Some(META),
        "Shift" => Some(SHIFT),
        _ => None,
    }
}

/// Derives `{key, code, windowsVirtualKeyCode, text}` for a single
/// printable character from letter/digit heuristics.
fn resolve_char(ch: char) -> KeyDef {
    let upper = ch.to_ascii_uppercase();
    if upper.is_ascii_alphabetic() {
        let code: &'static str = CODE_LETTERS[(upper as u8 - b'A') as usize];
        let vk = upper as i64;
        return KeyDef {
            key: "",
            code,
            vk,
            text: None,
        }
        .with_text(ch);
    }
    if ch.is_ascii_digit() {
        let code: &'static str = CODE_DIGITS[(ch as u8 - b'0') as usize];
        return KeyDef {
            key: "",
            code,
            vk: ch as i64,
            text: None,
        }
        .with_text(ch);
    }
    KeyDef {
        key: "",
        code: "Unidentified",
        vk: ch as i64,
        text: None,
    }
    .with_text(ch)
}

impl KeyDef {
    fn with_text(mut self, ch: char) -> Self {
        self.key = CHAR_STRINGS.get(&ch).copied().unwrap_or("");
        self.text = Some(CHAR_STRINGS.get(&ch).copied().unwrap_or(""));
        self
    }
}

const CODE_LETTERS: [&str; 26] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK", "KeyL",
    "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV", "KeyW", "KeyX",
    "KeyY", "KeyZ",
];
const CODE_DIGITS: [&str; 10] = [
    "Digit0", "Digit1", "Digit2", "Digit3", "Digit4", "Digit5", "Digit6", "Digit7", "Digit8",
    "Digit9",
];

lazy_static! {
    /// QWERTY physical position (row, column) used to compute
    /// `key_distance_on_QWERTY` between consecutive keystrokes.
    static ref QWERTY_POSITIONS: std::collections::HashMap<char, (f64, f64)> = {
        let rows = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];
        let mut map = std::collections::HashMap::new();
        for (row_idx, row) in rows.iter().enumerate() {
            let offset = row_idx as f64 * 0.5;
            for (col_idx, ch) in row.chars().enumerate() {
                map.insert(ch, (row_idx as f64, col_idx as f64 + offset));
            }
        }
        map
    };

    static ref CHAR_STRINGS: std::collections::HashMap<char, &'static str> = {
        // Leaked once at process start; bounded by the printable-ASCII set,
        // so this never grows.
        let mut map = std::collections::HashMap::new();
        for ch in (0x20u8..=0x7eu8).map(|b| b as char) {
            let s: &'static str = Box::leak(ch.to_string().into_boxed_str());
            map.insert(ch, s);
        }
        map
    };
}

fn qwerty_distance(a: char, b: char) -> f64 {
    let (a, b) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
    match (QWERTY_POSITIONS.get(&a), QWERTY_POSITIONS.get(&b)) {
        (Some((r1, c1)), Some((r2, c2))) => ((r1 - r2).powi(2) + (c1 - c2).powi(2)).sqrt(),
        _ => 0.0,
    }
}

fn adjacent_key(ch: char) -> Option<char> {
    let lower = ch.to_ascii_lowercase();
    let pos = *QWERTY_POSITIONS.get(&lower)?;
    let mut best: Option<(char, f64)> = None;
    for (&c, &p) in QWERTY_POSITIONS.iter() {
        if c == lower {
            continue;
        }
        let dist = ((pos.0 - p.0).powi(2) + (pos.1 - p.1).powi(2)).sqrt();
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((c, dist));
        }
    }
    best.map(|(c, _)| if ch.is_uppercase() { c.to_ascii_uppercase() } else { c })
}

/// Per-page keyboard synthesizer; owns nothing but the CPM setting and
/// the last character typed, used to derive `key_distance_on_QWERTY`.
pub struct Keyboard {
    cpm: f64,
    /// `f64` bits, so the probability can be toggled at runtime through a
    /// shared `&Keyboard` (e.g. `Page::keyboard()`) without rebuilding it.
    typo_probability_bits: AtomicU64,
    last_char: Mutex<Option<char>>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            cpm: DEFAULT_CPM,
            typo_probability_bits: AtomicU64::new(TYPO_PROBABILITY.to_bits()),
            last_char: Mutex::new(None),
        }
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cpm(cpm: f64) -> Self {
        Self {
            cpm,
            ..Self::default()
        }
    }

    /// Overrides the per-character typo-injection probability (§4.6).
    /// `0.0` disables typo injection entirely, so `type_text` always
    /// matches its input character-for-character (§8 property 8).
    pub fn with_typo_probability(self, probability: f64) -> Self {
        self.typo_probability_bits
            .store(probability.to_bits(), Ordering::Relaxed);
        self
    }

    /// Shorthand for `with_typo_probability(0.0)`.
    pub fn without_typos(self) -> Self {
        self.with_typo_probability(0.0)
    }

    /// Runtime equivalent of `with_typo_probability`, for a `Keyboard`
    /// already shared behind a `Page` or other `&self` handle.
    pub fn set_typo_probability(&self, probability: f64) {
        self.typo_probability_bits
            .store(probability.to_bits(), Ordering::Relaxed);
    }

    fn typo_probability(&self) -> f64 {
        f64::from_bits(self.typo_probability_bits.load(Ordering::Relaxed))
    }

    async fn dispatch_char(&self, session: &Session, def: &KeyDef, rng: &mut impl Rng) -> Result<()> {
        self.dispatch_char_with_modifiers(session, def, 0, rng).await
    }

    async fn dispatch_char_with_modifiers(
        &self,
        session: &Session,
        def: &KeyDef,
        modifiers: i64,
        rng: &mut impl Rng,
    ) -> Result<()> {
        session
            .execute(DispatchKeyEventParams {
                event_type: KeyEventType::KeyDown,
                key: Some(def.key.to_string()),
                code: Some(def.code.to_string()),
                text: def.text.map(str::to_string),
                windows_virtual_key_code: Some(def.vk),
                modifiers: Some(modifiers),
            })
            .await?;
        if def.text.is_some() {
            session
                .execute(DispatchKeyEventParams {
                    event_type: KeyEventType::Char,
                    key: Some(def.key.to_string()),
                    code: Some(def.code.to_string()),
                    text: def.text.map(str::to_string),
                    windows_virtual_key_code: Some(def.vk),
                    modifiers: Some(modifiers),
                })
                .await?;
        }
        tokio::time::sleep(std::time::Duration::from_millis(
            rng.random_range(HOLD_MIN_MS..=HOLD_MAX_MS),
        ))
        .await;
        session
            .execute(DispatchKeyEventParams {
                event_type: KeyEventType::KeyUp,
                key: Some(def.key.to_string()),
                code: Some(def.code.to_string()),
                text: None,
                windows_virtual_key_code: Some(def.vk),
                modifiers: Some(modifiers),
            })
            .await?;
        Ok(())
    }

    fn delay_for(&self, ch: char, rng: &mut impl Rng) -> std::time::Duration {
        let base = 60_000.0 / self.cpm;
        let last = *self.last_char.lock().unwrap();
        let distance = last.map(|prev| qwerty_distance(prev, ch)).unwrap_or(0.0);
        let mut delay = base * rng.random_range(0.7..=1.5) * (1.0 + 0.05 * distance);

        if ch == ' ' && rng.random_bool(WORD_BOUNDARY_PROBABILITY) {
            delay += rng.random_range(100.0..=500.0);
        }
        if matches!(ch, '.' | '!' | '?') {
            delay += rng.random_range(200.0..=500.0);
        }

        delay = delay.clamp(MIN_DELAY_MS, 3.0 * MAX_DELAY_MS);
        std::time::Duration::from_secs_f64(delay / 1000.0)
    }

    /// Types `text` one character at a time, with probability
    /// [`TYPO_PROBABILITY`] of emitting an adjacent key, a `Backspace`,
    /// then the intended key instead of typing it directly.
    pub async fn type_text(&self, session: &Session, text: &str) -> Result<()> {
        let mut rng = rand::rng();
        for ch in text.chars() {
            tokio::time::sleep(self.delay_for(ch, &mut rng)).await;

            if rng.random_bool(self.typo_probability()) {
                if let Some(typo) = adjacent_key(ch) {
                    self.dispatch_char(session, &resolve_char(typo), &mut rng).await?;
                    tokio::time::sleep(self.delay_for(typo, &mut rng)).await;
                    self.press_named(session, "Backspace").await?;
                }
            }

            self.dispatch_char(session, &resolve_char(ch), &mut rng).await?;
            *self.last_char.lock().unwrap() = Some(ch);
        }
        Ok(())
    }

    /// Presses a named key (e.g. `"Enter"`, `"Ctrl"`, `"F7"`); aliases are
    /// resolved before lookup in the named-key table.
    pub async fn press_named(&self, session: &Session, name: &str) -> Result<()> {
        let mut rng = rand::rng();
        match resolve_named(name) {
            Some(def) => self.dispatch_char(session, &def, &mut rng).await,
            None if name.chars().count() == 1 => {
                let ch = name.chars().next().unwrap();
                self.dispatch_char(session, &resolve_char(ch), &mut rng).await
            }
            None => Err(crate::error::CdpError::msg(format!("unknown key name {name:?}"))),
        }
    }

    /// Holds every key but the last as a modifier, presses the last key
    /// with the accumulated modifier mask, then releases all of them in
    /// reverse order — e.g. `shortcut(session, &["Control", "a"])` for
    /// select-all.
    pub async fn shortcut(&self, session: &Session, keys: &[&str]) -> Result<()> {
        let Some((&last, modifier_names)) = keys.split_last() else {
            return Ok(());
        };
        let mut rng = rand::rng();
        let mut held = Vec::with_capacity(modifier_names.len());
        let mut mask = 0i64;

        for &name in modifier_names {
            let def = resolve_named(name)
                .ok_or_else(|| crate::error::CdpError::msg(format!("unknown modifier key {name:?}")))?;
            session
                .execute(DispatchKeyEventParams {
                    event_type: KeyEventType::KeyDown,
                    key: Some(def.key.to_string()),
                    code: Some(def.code.to_string()),
                    text: None,
                    windows_virtual_key_code: Some(def.vk),
                    modifiers: Some(mask),
                })
                .await?;
            mask |= modifier_bit(name).unwrap_or(0);
            held.push(def);
        }

        let last_def = resolve_named(last).unwrap_or_else(|| resolve_char(last.chars().next().unwrap_or(' ')));
        self.dispatch_char_with_modifiers(session, &last_def, mask, &mut rng)
            .await?;

        for def in held.into_iter().rev() {
            session
                .execute(DispatchKeyEventParams {
                    event_type: KeyEventType::KeyUp,
                    key: Some(def.key.to_string()),
                    code: Some(def.code.to_string()),
                    text: None,
                    windows_virtual_key_code: Some(def.vk),
                    modifiers: Some(mask),
                })
                .await?;
            mask &= !modifier_bit(def.key).unwrap_or(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_typos_zeroes_the_injection_probability() {
        let kb = Keyboard::new().without_typos();
        assert_eq!(kb.typo_probability(), 0.0);
        let default_kb = Keyboard::new();
        assert_eq!(default_kb.typo_probability(), TYPO_PROBABILITY);

        default_kb.set_typo_probability(0.0);
        assert_eq!(default_kb.typo_probability(), 0.0);
    }

    #[test]
    fn aliases_resolve_before_lookup() {
        assert!(resolve_named("Ctrl").is_some());
        assert!(resolve_named("Esc").is_some());
        assert_eq!(resolve_named("Esc").unwrap().code, "Escape");
    }

    #[test]
    fn printable_chars_derive_code_from_letter_heuristics() {
        let def = resolve_char('a');
        assert_eq!(def.code, "KeyA");
        assert_eq!(def.text.unwrap(), "a");
        let digit = resolve_char('5');
        assert_eq!(digit.code, "Digit5");
    }

    #[test]
    fn adjacent_key_is_a_real_qwerty_neighbor() {
        let adj = adjacent_key('g').unwrap();
        assert!(qwerty_distance('g', adj) < 1.5);
    }
}
