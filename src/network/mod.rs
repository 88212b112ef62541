//! §4.8 Network Layer: a passive Monitor and an active Interceptor share
//! one session.

pub mod har;
pub mod interceptor;
pub mod monitor;

pub use har::HarRecorder;
pub use interceptor::{InterceptRule, RequestInterceptor};
pub use monitor::NetworkMonitor;

/// Simple `*`-wildcard glob, shared by the Monitor's `get_requests`/
/// `wait_for_*` filters and the Interceptor's rule matching.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(part) {
                return false;
            }
            rest = &rest[part.len()..];
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}
