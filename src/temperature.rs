//! Relative temperatures from head reference intensities.
//!
//! No radiometric calibration is available for the input
//! frames. Instead, the coldest reliable head in a frame
//! is assumed to be at a baseline body temperature, and
//! every other head is scaled linearly against it:
//!
//! ```text
//! temp = reference * baseline / coldest_reference
//! ```
//!
//! The result is only as good as that assumption. The
//! anchor is derived from each frame on its own and is
//! never carried over to the next one.
use serde_derive::*;

use crate::{error::CalibrationSkip, head::ReliablePerson};

/// A frame needs this many reliable people before the
/// coldest of them can serve as an anchor.
pub const MIN_CALIBRATION_POINTS: usize = 2;

/// Temperatures used to anchor and classify a frame, in
/// degrees Celsius.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Temperature assigned to the coldest head.
    pub baseline_celsius: f64,

    /// Temperatures strictly above this are elevated.
    pub elevated_above_celsius: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        CalibrationSettings {
            baseline_celsius: 36.5,
            elevated_above_celsius: 37.5,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Elevated,
}

impl Classification {
    pub fn of(celsius: f64, settings: &CalibrationSettings) -> Self {
        if celsius > settings.elevated_above_celsius {
            Classification::Elevated
        } else {
            Classification::Normal
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemperatureEstimate {
    #[serde(flatten)]
    pub person: ReliablePerson,
    pub celsius: f64,
    pub classification: Classification,
}

impl TemperatureEstimate {
    /// Display text for the overlay, e.g. `36.5 C`.
    pub fn label(&self) -> String {
        format!("{:.1} C", self.celsius)
    }
}

/// Per-frame linear scale from intensity to temperature.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub anchor_intensity: u16,
    pub baseline_celsius: f64,
}

impl Calibration {
    pub fn from_people(
        people: &[ReliablePerson],
        settings: &CalibrationSettings,
    ) -> Result<Self, CalibrationSkip> {
        if people.len() < MIN_CALIBRATION_POINTS {
            return Err(CalibrationSkip::InsufficientCalibrationPoints {
                found: people.len(),
                required: MIN_CALIBRATION_POINTS,
            });
        }
        let anchor_intensity = people
            .iter()
            .map(|p| p.reference)
            .min()
            .unwrap_or_default();
        if anchor_intensity == 0 {
            return Err(CalibrationSkip::ZeroCalibrationIntensity);
        }
        Ok(Calibration {
            anchor_intensity,
            baseline_celsius: settings.baseline_celsius,
        })
    }

    pub fn temperature_transform(&self) -> impl Fn(u16) -> f64 {
        let baseline = self.baseline_celsius;
        let anchor = f64::from(self.anchor_intensity);
        move |intensity| f64::from(intensity) * baseline / anchor
    }

    pub fn to_celsius(&self, intensity: u16) -> f64 {
        self.temperature_transform()(intensity)
    }

    pub fn estimate(
        &self,
        people: &[ReliablePerson],
        settings: &CalibrationSettings,
    ) -> Vec<TemperatureEstimate> {
        let temp_t = self.temperature_transform();
        people
            .iter()
            .map(|person| {
                let celsius = temp_t(person.reference);
                TemperatureEstimate {
                    person: *person,
                    celsius,
                    classification: Classification::of(celsius, settings),
                }
            })
            .collect()
    }
}

/// Compute a temperature estimate for every person, in
/// input order.
pub fn normalize(
    people: &[ReliablePerson],
    settings: &CalibrationSettings,
) -> Result<Vec<TemperatureEstimate>, CalibrationSkip> {
    Ok(Calibration::from_people(people, settings)?.estimate(people, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, PixelLocation};

    fn person(reference: u16) -> ReliablePerson {
        ReliablePerson {
            bbox: BoundingBox::new(0, 0, 10, 10),
            head: PixelLocation::new(5, 1),
            reference,
        }
    }

    fn celsius_of(references: &[u16]) -> Vec<f64> {
        let people: Vec<_> = references.iter().copied().map(person).collect();
        normalize(&people, &CalibrationSettings::default())
            .unwrap()
            .iter()
            .map(|e| e.celsius)
            .collect()
    }

    #[test]
    fn coldest_head_is_baseline() {
        let people = [person(100), person(150)];
        let estimates = normalize(&people, &CalibrationSettings::default()).unwrap();

        assert_eq!(estimates.len(), 2);
        assert_eq!(estimates[0].celsius, 36.5);
        assert_eq!(estimates[0].classification, Classification::Normal);
        assert_eq!(estimates[1].celsius, 54.75);
        assert_eq!(estimates[1].classification, Classification::Elevated);
        assert_eq!(estimates[1].person, people[1]);
        assert_eq!(estimates[1].label(), "54.8 C");
    }

    #[test]
    fn anchor_is_coldest_reference() {
        let people = [person(140), person(100), person(120)];
        let calibration = Calibration::from_people(&people, &CalibrationSettings::default()).unwrap();

        assert_eq!(calibration.anchor_intensity, 100);
        assert_eq!(calibration.to_celsius(100), 36.5);
        assert_eq!(calibration.to_celsius(200), 73.0);
    }

    #[test]
    fn equal_references_are_all_baseline() {
        for reference in &[1u16, 37, 255, 4097, u16::MAX] {
            let temps = celsius_of(&[*reference; 4]);
            assert!(temps.iter().all(|&t| t == 36.5), "{:?}", temps);
        }
    }

    #[test]
    fn raising_one_reference_raises_only_that_temperature() {
        let before = celsius_of(&[100, 120, 130]);
        let after = celsius_of(&[100, 125, 130]);

        assert!(after[1] > before[1]);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
    }

    #[test]
    fn single_person_is_not_calibrated() {
        assert_eq!(
            normalize(&[person(120)], &CalibrationSettings::default()),
            Err(CalibrationSkip::InsufficientCalibrationPoints {
                found: 1,
                required: 2
            })
        );
        assert!(normalize(&[], &CalibrationSettings::default()).is_err());
    }

    #[test]
    fn zero_anchor_is_not_calibrated() {
        assert_eq!(
            normalize(&[person(0), person(90)], &CalibrationSettings::default()),
            Err(CalibrationSkip::ZeroCalibrationIntensity)
        );
    }

    #[test]
    fn classification_threshold_is_strict() {
        let settings = CalibrationSettings::default();
        assert_eq!(Classification::of(37.5, &settings), Classification::Normal);
        assert_eq!(Classification::of(37.50001, &settings), Classification::Elevated);
        assert_eq!(Classification::of(36.5, &settings), Classification::Normal);
    }

    #[test]
    fn baseline_and_threshold_are_configurable() {
        let settings = CalibrationSettings {
            baseline_celsius: 30.0,
            elevated_above_celsius: 40.0,
        };
        let estimates = normalize(&[person(100), person(150)], &settings).unwrap();

        assert_eq!(estimates[0].celsius, 30.0);
        assert_eq!(estimates[1].celsius, 45.0);
        assert_eq!(estimates[1].classification, Classification::Elevated);
    }
}
