//! §4.6 Input Synthesis: mouse. Wraps
//! [`kuromi_fingerprint::spoof_mouse_movement::BezierMouse`] to produce
//! dispatch sequences that approximate human movement and click timing.

use std::sync::Mutex;

use kuromi_fingerprint::spoof_mouse_movement::BezierMouse;
use rand::Rng;

use crate::cdp::input::{DispatchMouseEventParams, MouseButton, MouseEventType};
use crate::error::Result;
use crate::session::Session;

const PRE_PRESS_MIN_MS: u64 = 30;
const PRE_PRESS_MAX_MS: u64 = 80;
const HOLD_MIN_MS: u64 = 50;
const HOLD_MAX_MS: u64 = 120;
const INTER_CLICK_MIN_MS: u64 = 80;
const INTER_CLICK_MAX_MS: u64 = 150;

/// Tracks the last known cursor position so successive gestures chain
/// realistically instead of each starting from `(0, 0)`.
pub struct Mouse {
    position: Mutex<(f64, f64)>,
}

impl Default for Mouse {
    fn default() -> Self {
        Self {
            position: Mutex::new((0.0, 0.0)),
        }
    }
}

impl Mouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> (f64, f64) {
        *self.position.lock().unwrap()
    }

    fn set_current(&self, pos: (f64, f64)) {
        *self.position.lock().unwrap() = pos;
    }

    /// Moves the cursor from its last known position to `(x, y)` along a
    /// Bézier path, dispatching one `mouseMoved` per sampled point.
    pub async fn move_to(&self, session: &Session, x: f64, y: f64) -> Result<()> {
        let start = self.current();
        let mut rng = rand::rng();
        let path = BezierMouse::generate_path(start, (x, y), false, &mut rng);
        for point in &path {
            if point.delay_ms > 0.0 {
                tokio::time::sleep(std::time::Duration::from_secs_f64(point.delay_ms / 1000.0)).await;
            }
            session
                .execute(DispatchMouseEventParams {
                    event_type: MouseEventType::MouseMoved,
                    x: point.x,
                    y: point.y,
                    button: None,
                    click_count: None,
                    modifiers: None,
                })
                .await?;
        }
        self.set_current((x, y));
        Ok(())
    }

    /// Moves to `(x, y)` then dispatches `mousePressed`/`mouseReleased`
    /// with the click timing profile from §4.6.
    pub async fn click_at(&self, session: &Session, x: f64, y: f64, click_count: i64) -> Result<()> {
        self.move_to(session, x, y).await?;
        let mut rng = rand::rng();

        for click in 1..=click_count {
            tokio::time::sleep(std::time::Duration::from_millis(
                rng.random_range(PRE_PRESS_MIN_MS..=PRE_PRESS_MAX_MS),
            ))
            .await;
            session
                .execute(DispatchMouseEventParams {
                    event_type: MouseEventType::MousePressed,
                    x,
                    y,
                    button: Some(MouseButton::Left),
                    click_count: Some(click),
                    modifiers: None,
                })
                .await?;

            tokio::time::sleep(std::time::Duration::from_millis(
                rng.random_range(HOLD_MIN_MS..=HOLD_MAX_MS),
            ))
            .await;
            session
                .execute(DispatchMouseEventParams {
                    event_type: MouseEventType::MouseReleased,
                    x,
                    y,
                    button: Some(MouseButton::Left),
                    click_count: Some(click),
                    modifiers: None,
                })
                .await?;

            if click != click_count {
                tokio::time::sleep(std::time::Duration::from_millis(
                    rng.random_range(INTER_CLICK_MIN_MS..=INTER_CLICK_MAX_MS),
                ))
                .await;
            }
        }
        Ok(())
    }
}
