/// Milliseconds elapsed on a monotonic clock since the first call in this process
#[cfg(not(target_arch = "wasm32"))]
pub fn monotonic_ms() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u64
}

/// Milliseconds since page load, from the browser's performance clock
#[cfg(target_arch = "wasm32")]
pub fn monotonic_ms() -> u64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| perf.now() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_never_goes_back() {
        let first = monotonic_ms();
        let second = monotonic_ms();
        assert!(second >= first);
    }
}
