//! Pseudo-exponential expansion of byte-coded durations.
//!
//! User-facing time parameters (envelope stages, LFO rates, fades) are
//! single bytes. Mapping them linearly to ticks would waste most of the
//! range on inaudibly similar long times, so the code is expanded
//! piecewise: short times resolve finely, long times coarsely.

/// Longest expanded duration, `expand_ticks(255)`.
pub const MAX_TICKS: u16 = 2411;

/// Expand a byte-coded duration into an absolute count of update ticks.
///
/// result = t, plus `(t - 96) << 2` above 96, plus `(t - 160) << 4`
/// above 160. Integer shifts only — the timing must be bit-for-bit
/// reproducible across builds. Range 1..=2411.
///
/// Code 0 is reserved to mean "instantaneous / stage skipped"; callers
/// check for zero before computing a step and never pass it here.
pub fn expand_ticks(t: u8) -> u16 {
    debug_assert!(t != 0, "duration code 0 means skipped and must not be expanded");
    let mut ticks = t as u16;
    if t > 96 {
        ticks += (t as u16 - 96) << 2;
    }
    if t > 160 {
        ticks += (t as u16 - 160) << 4;
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_below_first_knee() {
        assert_eq!(expand_ticks(1), 1);
        assert_eq!(expand_ticks(50), 50);
        assert_eq!(expand_ticks(96), 96);
    }

    #[test]
    fn first_knee_adds_quadruple_excess() {
        assert_eq!(expand_ticks(97), 97 + 4);
        assert_eq!(expand_ticks(160), 160 + (64 << 2));
    }

    #[test]
    fn second_knee_adds_sixteenfold_excess() {
        assert_eq!(expand_ticks(161), 161 + (65 << 2) + (1 << 4));
    }

    #[test]
    fn full_scale_is_max_ticks() {
        assert_eq!(expand_ticks(255), MAX_TICKS);
    }

    #[test]
    fn monotonically_non_decreasing() {
        let mut prev = expand_ticks(1);
        for t in 2..=255u8 {
            let cur = expand_ticks(t);
            assert!(cur >= prev, "expand_ticks({}) = {} < {}", t, cur, prev);
            prev = cur;
        }
    }
}
