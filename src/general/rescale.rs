/// Map `value` linearly from `[min_in, max_in]` onto `[min_out, max_out]`.
///
/// The mapping is a pure affine transform: values outside the input range are
/// extrapolated, not clamped. Callers that want saturation clamp themselves.
///
/// Panics when `min_in == max_in`, the input range cannot be inverted.
pub fn rescale(min_in: f64, max_in: f64, min_out: f64, max_out: f64, value: f64) -> f64 {
    let span_in = max_in - min_in;
    assert!(span_in != 0.0, "input range must not be empty (min_in == max_in == {})", min_in);

    let ratio = (value - min_in) / span_in;
    ratio * (max_out - min_out) + min_out
}

/// Map a 7-bit MIDI value onto `[min_out, max_out]`.
pub fn rescale_midi(min_out: f64, max_out: f64, value: u8) -> f64 {
    rescale(0.0, 127.0, min_out, max_out, value as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_endpoints() {
        assert_eq!(rescale(0.0, 127.0, 0.0, 1.0, 0.0), 0.0);
        assert_eq!(rescale(0.0, 127.0, 0.0, 1.0, 127.0), 1.0);
        assert!((rescale(0.0, 127.0, 0.0, 1.0, 63.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rescale_is_affine() {
        // f(a) - f(b) is proportional to a - b
        let f = |v: f64| rescale(10.0, 20.0, -4.0, 6.0, v);
        let slope = f(11.0) - f(10.0);
        for a in [-30.0, 0.0, 12.5, 19.0, 55.0] {
            assert!((f(a) - f(10.0) - slope * (a - 10.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rescale_extrapolates() {
        assert_eq!(rescale(0.0, 127.0, 0.0, 1.0, 254.0), 2.0);
        assert_eq!(rescale(0.0, 10.0, 0.0, 100.0, -5.0), -50.0);
    }

    #[test]
    fn test_rescale_inverted_output() {
        assert_eq!(rescale(0.0, 1.0, 1.0, 0.0, 0.25), 0.75);
    }

    #[test]
    #[should_panic(expected = "input range must not be empty")]
    fn test_rescale_empty_input_range() {
        rescale(5.0, 5.0, 0.0, 1.0, 3.0);
    }

    #[test]
    fn test_rescale_midi() {
        assert_eq!(rescale_midi(0.0, 1.0, 127), 1.0);
        assert_eq!(rescale_midi(-1.0, 1.0, 0), -1.0);
    }
}
