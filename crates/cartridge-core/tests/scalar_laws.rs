// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closure and round-trip laws for the schema scalar types.

use cartridge_core::{MeasureType, PercentType, ScormDuration};
use proptest::prelude::*;

proptest! {
    #[test]
    fn percent_parse_then_serialize_is_closed(value in 0.0_f64..=1.0) {
        let percent = PercentType::new(value).unwrap();
        let again: PercentType = percent.to_string().parse().unwrap();
        prop_assert_eq!(percent, again);
    }

    #[test]
    fn measure_parse_then_serialize_is_closed(value in -1.0_f64..=1.0) {
        let measure = MeasureType::new(value).unwrap();
        let again: MeasureType = measure.to_string().parse().unwrap();
        prop_assert_eq!(measure, again);
    }

    #[test]
    fn measure_is_normalized_to_four_digits(value in -1.0_f64..=1.0) {
        let measure = MeasureType::new(value).unwrap();
        let scaled = measure.value() * 10_000.0;
        prop_assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_percents_are_rejected(value in 1.0001_f64..1e6) {
        prop_assert!(PercentType::new(value).is_err());
        prop_assert!(PercentType::new(-value).is_err());
    }

    #[test]
    fn clock_durations_round_down_to_seconds(h in 0u32..100, m in 0u32..60, s in 0u32..60) {
        let raw = format!("{h:02}:{m:02}:{s:02}");
        let duration: ScormDuration = raw.parse().unwrap();
        let expected = u64::from(h) * 3_600 + u64::from(m) * 60 + u64::from(s);
        prop_assert_eq!(duration.duration().as_secs(), expected);
        prop_assert_eq!(duration.raw(), raw.as_str());
    }

    #[test]
    fn duration_serde_preserves_the_lexical_form(secs in 0u64..100_000) {
        let raw = format!("PT{secs}S");
        let duration: ScormDuration = raw.parse().unwrap();
        let json = serde_json::to_string(&duration).unwrap();
        prop_assert_eq!(json, format!("\"{raw}\""));
        let back: ScormDuration = serde_json::from_str(&format!("\"{raw}\"")).unwrap();
        prop_assert_eq!(back, duration);
    }
}

#[test]
fn boundary_values_survive_the_round_trip() {
    for raw in ["-1", "-1.0000", "0.0000", "1", "1.0000"] {
        let measure: MeasureType = raw.parse().unwrap();
        let again: MeasureType = measure.to_string().parse().unwrap();
        assert_eq!(measure, again);
    }
}
