//! Byte and percent conversions used by every displayed value.
//!
//! Gigabytes are binary (`bytes / 2^30`). Thresholds downstream are applied to
//! percents, never to rounded gigabyte values, so rounding here only affects
//! what is displayed.

/// Bytes in one binary gigabyte.
pub const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Decimal places kept for gigabyte values.
pub const GB_PRECISION: u32 = 2;

/// Decimal places kept for percent values in reports.
pub const PERCENT_PRECISION: u32 = 1;

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Unrounded binary gigabytes. Use this when summing.
pub fn bytes_to_gb_raw(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// Binary gigabytes rounded to [`GB_PRECISION`].
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_to(bytes_to_gb_raw(bytes), GB_PRECISION)
}

/// Round an already-converted gigabyte value to [`GB_PRECISION`].
pub fn round_gb(gb: f64) -> f64 {
    round_to(gb, GB_PRECISION)
}

/// Round a percent to [`PERCENT_PRECISION`].
pub fn round_percent(percent: f64) -> f64 {
    round_to(percent, PERCENT_PRECISION)
}

/// Format a rounded value the way it is shown to people: whole numbers keep
/// one decimal (`6.0`), everything else uses the shortest exact form (`1.33`).
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// `part / whole` as a percent in `0..=100`. Zero when `whole` is zero.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_gib_is_one_gb() {
        assert_eq!(bytes_to_gb(1_073_741_824), 1.0);
    }

    #[test]
    fn test_zero_bytes() {
        assert_eq!(bytes_to_gb(0), 0.0);
        assert_eq!(bytes_to_gb_raw(0), 0.0);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        // 1.5 GiB + a few bytes
        assert_eq!(bytes_to_gb(1_610_612_736 + 1000), 1.5);
        // 0.125 GiB rounds half away from zero
        assert_eq!(bytes_to_gb(134_217_728), 0.13);
    }

    #[test]
    fn test_raw_keeps_precision() {
        let raw = bytes_to_gb_raw(134_217_728);
        assert_eq!(raw, 0.125);
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(72.349), 72.3);
        assert_eq!(round_percent(72.36), 72.4);
        assert_eq!(round_percent(100.0), 100.0);
    }

    #[test]
    fn test_round_to_non_finite() {
        assert_eq!(round_to(f64::NAN, 2), 0.0);
        assert_eq!(round_to(f64::INFINITY, 2), 0.0);
    }

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(6.0), "6.0");
        assert_eq!(display_number(1.33), "1.33");
        assert_eq!(display_number(91.2), "91.2");
        assert_eq!(display_number(0.0), "0.0");
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 0), 0.0);
        assert_eq!(percent_of(50, 200), 25.0);
        assert_eq!(percent_of(300, 200), 100.0);
    }
}
