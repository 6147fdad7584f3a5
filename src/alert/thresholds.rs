//! Vigilance threshold evaluation.
//!
//! Maps one day's {gust, wind, rain} maxima to an alert level using a
//! fixed precedence order. Severe signals are checked first, and wind
//! hazards win over rain at the same level:
//!
//! | order | condition              | level  | label                  |
//! |-------|------------------------|--------|------------------------|
//! | 1     | gust >= gust_red       | red    | ALERTE VENT VIOLENT    |
//! | 2     | rain >= rain_red       | red    | ALERTE PLUIES FORTES   |
//! | 3     | gust >= gust_orange    | orange | Vigilance vent         |
//! | 4     | rain >= rain_orange    | orange | Vigilance pluie        |
//! | 5     | wind >= wind_orange    | orange | Vigilance vent         |
//!
//! Comparisons use the unrounded value and are inclusive. Rounding only
//! happens when building the `reason` display string.

use serde::{Deserialize, Serialize};

use crate::model::{AlertCause, AlertLevel, DailyObservation, DayAlert};

pub const LABEL_RED_WIND: &str = "ALERTE VENT VIOLENT";
pub const LABEL_RED_RAIN: &str = "ALERTE PLUIES FORTES";
pub const LABEL_ORANGE_WIND: &str = "Vigilance vent";
pub const LABEL_ORANGE_RAIN: &str = "Vigilance pluie";

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Alert thresholds. Gust and wind in km/h, rain in mm per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub gust_orange: f64,
    pub gust_red: f64,
    pub wind_orange: f64,
    pub rain_orange: f64,
    pub rain_red: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            gust_orange: 75.0,
            gust_red: 100.0,
            wind_orange: 50.0,
            rain_orange: 25.0,
            rain_red: 50.0,
        }
    }
}

impl Thresholds {
    /// Checks that every value is a positive finite number and that each
    /// orange threshold sits strictly below its red counterpart.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("gust_orange", self.gust_orange),
            ("gust_red", self.gust_red),
            ("wind_orange", self.wind_orange),
            ("rain_orange", self.rain_orange),
            ("rain_red", self.rain_red),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive number, got {}", name, value));
            }
        }
        if self.gust_orange >= self.gust_red {
            return Err(format!(
                "gust_orange ({}) must be below gust_red ({})",
                self.gust_orange, self.gust_red
            ));
        }
        if self.rain_orange >= self.rain_red {
            return Err(format!(
                "rain_orange ({}) must be below rain_red ({})",
                self.rain_orange, self.rain_red
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Pure per-day classifier bound to one immutable threshold set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlertClassifier {
    thresholds: Thresholds,
}

impl AlertClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classifies one day. Returns `None` when no threshold is crossed.
    ///
    /// `None` inputs carry no signal and never trigger an alert; neither
    /// do NaN values, since every comparison against NaN is false.
    pub fn classify_day(
        &self,
        gust: Option<f64>,
        wind: Option<f64>,
        rain: Option<f64>,
    ) -> Option<DayAlert> {
        let t = &self.thresholds;

        if let Some(g) = at_least(gust, t.gust_red) {
            return Some(day_alert(AlertLevel::Red, LABEL_RED_WIND, AlertCause::Gust, g));
        }
        if let Some(r) = at_least(rain, t.rain_red) {
            return Some(day_alert(AlertLevel::Red, LABEL_RED_RAIN, AlertCause::Rain, r));
        }
        if let Some(g) = at_least(gust, t.gust_orange) {
            return Some(day_alert(AlertLevel::Orange, LABEL_ORANGE_WIND, AlertCause::Gust, g));
        }
        if let Some(r) = at_least(rain, t.rain_orange) {
            return Some(day_alert(AlertLevel::Orange, LABEL_ORANGE_RAIN, AlertCause::Rain, r));
        }
        if let Some(w) = at_least(wind, t.wind_orange) {
            return Some(day_alert(AlertLevel::Orange, LABEL_ORANGE_WIND, AlertCause::Wind, w));
        }
        None
    }

    /// Classifies a parsed daily observation.
    pub fn classify_observation(&self, day: &DailyObservation) -> Option<DayAlert> {
        self.classify_day(day.wind_gust_max, day.wind_speed_max, day.precipitation_sum)
    }

    /// Classifies every day of a series, one slot per day.
    pub fn classify_days(&self, days: &[DailyObservation]) -> Vec<Option<DayAlert>> {
        days.iter().map(|d| self.classify_observation(d)).collect()
    }
}

fn at_least(value: Option<f64>, threshold: f64) -> Option<f64> {
    value.filter(|v| *v >= threshold)
}

fn day_alert(level: AlertLevel, label: &str, cause: AlertCause, value: f64) -> DayAlert {
    DayAlert {
        level,
        label: label.to_string(),
        reason: format_reason(cause, value),
        cause,
        value,
    }
}

/// Builds the display reason, e.g. "Rafales 80 km/h" or "Pluie 31 mm".
pub fn format_reason(cause: AlertCause, value: f64) -> String {
    let prefix = match cause {
        AlertCause::Gust => "Rafales",
        AlertCause::Rain => "Pluie",
        AlertCause::Wind => "Vent",
    };
    format!("{} {} {}", prefix, value.round() as i64, cause.unit())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> AlertClassifier {
        AlertClassifier::default()
    }

    // --- Precedence properties ----------------------------------------------

    #[test]
    fn test_gust_at_or_above_red_is_red_regardless_of_other_signals() {
        let c = classifier();
        for gust in [100.0, 100.4, 130.0, 250.0] {
            for wind in [None, Some(0.0), Some(80.0)] {
                for rain in [None, Some(0.0), Some(30.0), Some(120.0)] {
                    let alert = c
                        .classify_day(Some(gust), wind, rain)
                        .expect("gust >= 100 must alert");
                    assert_eq!(alert.level, AlertLevel::Red);
                    assert_eq!(alert.cause, AlertCause::Gust);
                    assert_eq!(alert.label, LABEL_RED_WIND);
                }
            }
        }
    }

    #[test]
    fn test_heavy_rain_below_red_gust_is_red_rain() {
        let c = classifier();
        for gust in [None, Some(10.0), Some(80.0), Some(99.9)] {
            for rain in [50.0, 62.3, 200.0] {
                let alert = c
                    .classify_day(gust, Some(70.0), Some(rain))
                    .expect("rain >= 50 must alert");
                assert_eq!(alert.level, AlertLevel::Red);
                assert_eq!(alert.cause, AlertCause::Rain);
                assert_eq!(alert.label, LABEL_RED_RAIN);
                assert!(alert.reason.contains("mm"), "got: {}", alert.reason);
            }
        }
    }

    #[test]
    fn test_orange_gust_band_reports_gust() {
        let c = classifier();
        for gust in [75.0, 80.0, 99.99] {
            let alert = c
                .classify_day(Some(gust), Some(49.0), Some(24.9))
                .expect("gust in [75, 100) must alert");
            assert_eq!(alert.level, AlertLevel::Orange);
            assert_eq!(alert.cause, AlertCause::Gust);
            assert!(alert.reason.starts_with("Rafales"), "got: {}", alert.reason);
        }
    }

    #[test]
    fn test_orange_gust_wins_over_orange_rain() {
        let alert = classifier()
            .classify_day(Some(76.0), None, Some(30.0))
            .unwrap();
        assert_eq!(alert.cause, AlertCause::Gust);
        assert_eq!(alert.label, LABEL_ORANGE_WIND);
    }

    #[test]
    fn test_orange_rain_wins_over_sustained_wind() {
        let alert = classifier()
            .classify_day(Some(20.0), Some(60.0), Some(30.0))
            .unwrap();
        assert_eq!(alert.level, AlertLevel::Orange);
        assert_eq!(alert.cause, AlertCause::Rain);
        assert_eq!(alert.label, LABEL_ORANGE_RAIN);
        assert_eq!(alert.reason, "Pluie 30 mm");
    }

    #[test]
    fn test_sustained_wind_alone_is_orange_wind() {
        let alert = classifier()
            .classify_day(None, Some(55.4), None)
            .unwrap();
        assert_eq!(alert.level, AlertLevel::Orange);
        assert_eq!(alert.cause, AlertCause::Wind);
        assert_eq!(alert.label, LABEL_ORANGE_WIND);
        assert_eq!(alert.reason, "Vent 55 km/h");
    }

    #[test]
    fn test_below_all_thresholds_is_no_alert() {
        let c = classifier();
        for gust in [None, Some(0.0), Some(74.99)] {
            for wind in [None, Some(0.0), Some(49.99)] {
                for rain in [None, Some(0.0), Some(24.99)] {
                    assert!(
                        c.classify_day(gust, wind, rain).is_none(),
                        "unexpected alert for {:?}/{:?}/{:?}",
                        gust,
                        wind,
                        rain
                    );
                }
            }
        }
    }

    #[test]
    fn test_all_missing_signals_is_no_alert() {
        assert!(classifier().classify_day(None, None, None).is_none());
    }

    #[test]
    fn test_nan_never_triggers() {
        assert!(classifier()
            .classify_day(Some(f64::NAN), Some(f64::NAN), Some(f64::NAN))
            .is_none());
    }

    // --- Boundaries and rounding --------------------------------------------

    #[test]
    fn test_boundaries_are_inclusive() {
        let c = classifier();
        assert_eq!(c.classify_day(Some(100.0), None, None).unwrap().level, AlertLevel::Red);
        assert_eq!(c.classify_day(Some(75.0), None, None).unwrap().level, AlertLevel::Orange);
        assert_eq!(c.classify_day(None, Some(50.0), None).unwrap().level, AlertLevel::Orange);
        assert_eq!(c.classify_day(None, None, Some(25.0)).unwrap().level, AlertLevel::Orange);
        assert_eq!(c.classify_day(None, None, Some(50.0)).unwrap().level, AlertLevel::Red);
    }

    #[test]
    fn test_comparison_uses_unrounded_value() {
        // 99.6 rounds to 100 for display but is still below the red threshold.
        let alert = classifier().classify_day(Some(99.6), None, None).unwrap();
        assert_eq!(alert.level, AlertLevel::Orange);
        assert_eq!(alert.reason, "Rafales 100 km/h");
        assert!((alert.value - 99.6).abs() < 1e-9);
    }

    #[test]
    fn test_format_reason_rounds_half_up() {
        assert_eq!(format_reason(AlertCause::Gust, 80.5), "Rafales 81 km/h");
        assert_eq!(format_reason(AlertCause::Rain, 25.4), "Pluie 25 mm");
        assert_eq!(format_reason(AlertCause::Wind, 50.0), "Vent 50 km/h");
    }

    // --- Injected thresholds ------------------------------------------------

    #[test]
    fn test_alternate_threshold_set_is_honoured() {
        let strict = AlertClassifier::new(Thresholds {
            gust_orange: 40.0,
            gust_red: 60.0,
            wind_orange: 20.0,
            rain_orange: 5.0,
            rain_red: 10.0,
        });
        assert_eq!(strict.classify_day(Some(65.0), None, None).unwrap().level, AlertLevel::Red);
        assert_eq!(strict.classify_day(None, None, Some(6.0)).unwrap().level, AlertLevel::Orange);
        assert!(classifier().classify_day(Some(65.0), None, None).is_none());
    }

    #[test]
    fn test_default_thresholds_are_valid() {
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let bad = Thresholds {
            gust_orange: 120.0,
            ..Thresholds::default()
        };
        let err = bad.validate().unwrap_err();
        assert!(err.contains("gust_orange"), "got: {}", err);

        let bad = Thresholds {
            rain_red: 10.0,
            ..Thresholds::default()
        };
        assert!(bad.validate().unwrap_err().contains("rain_orange"));
    }

    #[test]
    fn test_non_positive_threshold_is_rejected() {
        let bad = Thresholds {
            wind_orange: 0.0,
            ..Thresholds::default()
        };
        assert!(bad.validate().unwrap_err().contains("wind_orange"));
    }

    // --- Series classification ----------------------------------------------

    #[test]
    fn test_classify_days_concrete_gust_scenario() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let days: Vec<DailyObservation> = [60.0, 80.0, 105.0, 40.0]
            .iter()
            .enumerate()
            .map(|(i, gust)| DailyObservation {
                wind_gust_max: Some(*gust),
                wind_speed_max: Some(30.0),
                precipitation_sum: Some(0.0),
                ..DailyObservation::empty(start + chrono::Duration::days(i as i64))
            })
            .collect();

        let alerts = classifier().classify_days(&days);
        assert_eq!(alerts.len(), 4);
        assert!(alerts[0].is_none());
        let orange = alerts[1].as_ref().unwrap();
        assert_eq!(orange.level, AlertLevel::Orange);
        assert_eq!(orange.reason, "Rafales 80 km/h");
        let red = alerts[2].as_ref().unwrap();
        assert_eq!(red.level, AlertLevel::Red);
        assert_eq!(red.reason, "Rafales 105 km/h");
        assert!(alerts[3].is_none());
    }
}
