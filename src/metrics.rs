use std::time::Duration;

/// Characters per "word" in the WPM convention.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute over `input`, counting code points rather than bytes.
pub fn wpm(input: &str, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    let words = input.chars().count() as f64 / CHARS_PER_WORD;
    words / (secs / 60.0)
}

/// WPM from stored counters; used wherever session records are aggregated.
pub fn wpm_from_counts(chars: u64, duration_secs: u64) -> f64 {
    if chars == 0 || duration_secs == 0 {
        return 0.0;
    }
    (chars as f64 / CHARS_PER_WORD) / (duration_secs as f64 / 60.0)
}

/// Percentage of `text` matched byte-for-byte by `input`.
pub fn accuracy(text: &[u8], input: &[u8]) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let correct = text.iter().zip(input).filter(|(t, i)| t == i).count();
    100.0 * correct as f64 / text.len() as f64
}

/// Mismatched bytes over the shared prefix, plus the length difference.
pub fn errors(text: &[u8], input: &[u8]) -> usize {
    let mismatched = text.iter().zip(input).filter(|(t, i)| t != i).count();
    mismatched + text.len().abs_diff(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wpm_zero_duration() {
        assert_eq!(wpm("hello world", Duration::ZERO), 0.0);
    }

    #[test]
    fn wpm_one_minute() {
        // 25 chars = 5 words in one minute
        let input = "a".repeat(25);
        assert_eq!(wpm(&input, Duration::from_secs(60)), 5.0);
    }

    #[test]
    fn wpm_counts_code_points() {
        let ascii = wpm("aaaaa", Duration::from_secs(60));
        let multibyte = wpm("ééééé", Duration::from_secs(60));
        assert_eq!(ascii, multibyte);
    }

    #[test]
    fn wpm_from_counts_matches_formula() {
        assert_eq!(wpm_from_counts(300, 60), 60.0);
        assert_eq!(wpm_from_counts(0, 60), 0.0);
        assert_eq!(wpm_from_counts(300, 0), 0.0);
    }

    #[test]
    fn accuracy_mistyped_mid_text() {
        assert_eq!(accuracy(b"hello", b"hallo"), 80.0);
        assert_eq!(errors(b"hello", b"hallo"), 1);
    }

    #[test]
    fn accuracy_of_empty_text() {
        assert_eq!(accuracy(b"", b"abc"), 0.0);
    }

    #[test]
    fn partial_input_lowers_accuracy() {
        assert_eq!(accuracy(b"abcd", b"ab"), 50.0);
        assert_eq!(errors(b"abcd", b"ab"), 2);
        assert_eq!(errors(b"ab", b"abcd"), 2);
    }

    proptest! {
        #[test]
        fn perfect_input_scores_perfectly(text in "[ -~]{1,64}") {
            prop_assert_eq!(accuracy(text.as_bytes(), text.as_bytes()), 100.0);
            prop_assert_eq!(errors(text.as_bytes(), text.as_bytes()), 0);
        }

        #[test]
        fn errors_cover_length_mismatch(text in "[a-z]{0,32}", input in "[a-z]{0,32}") {
            prop_assert!(errors(text.as_bytes(), input.as_bytes()) >= text.len().abs_diff(input.len()));
        }

        #[test]
        fn wpm_positive_iff_time_and_input(input in "[a-z]{0,16}", millis in 0u64..10_000) {
            let value = wpm(&input, Duration::from_millis(millis));
            prop_assert_eq!(value > 0.0, millis > 0 && !input.is_empty());
        }
    }
}
