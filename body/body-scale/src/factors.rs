//! Scale factors derived from height and weight.

use serde::{Deserialize, Serialize};

use crate::{ScaleError, ScaleResult};

/// Reference height the base meshes are modeled at, in centimeters.
pub const REFERENCE_HEIGHT_CM: f64 = 170.0;

/// Reference weight the base meshes are modeled at, in kilograms.
pub const REFERENCE_WEIGHT_KG: f64 = 60.0;

/// Exponent applied to the height ratio.
pub const HEIGHT_EXPONENT: f64 = 1.25;

/// Exponent applied to the BMI ratio.
pub const BMI_EXPONENT: f64 = 1.4;

/// Exponent turning `height_ratio` into spine bone length scale.
pub const SPINE_LENGTH_EXPONENT: f64 = 0.8;

/// Extra side-to-side belly widening on `spine_03`, multiplied by `bmi_scale`.
pub const BELLY_WIDTH: f64 = 1.15;

/// Extra front-to-back belly depth on `spine_03`, multiplied by `bmi_scale`.
pub const BELLY_DEPTH: f64 = 1.25;

/// BMI of a person with the given height (cm) and weight (kg).
#[inline]
#[must_use]
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Ratios describing how far a body departs from the reference build.
///
/// Both ratios are exactly `1.0` at the reference height and weight.
///
/// # Example
///
/// ```
/// use body_scale::ScaleFactors;
///
/// let f = ScaleFactors::new(180.0, 90.0).unwrap();
/// assert!((f.bmi - 27.78).abs() < 0.01);
/// assert!((f.height_ratio - 1.074).abs() < 0.001);
/// assert!((f.bmi_scale - 1.503).abs() < 0.001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    /// `(height / 170)^1.25`.
    pub height_ratio: f64,
    /// `(bmi / reference_bmi)^1.4`.
    pub bmi_scale: f64,
    /// BMI of the target body.
    pub bmi: f64,
    /// BMI of the reference body.
    pub reference_bmi: f64,
}

impl ScaleFactors {
    /// Compute factors for a target height (cm) and weight (kg).
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::InvalidMeasurement`] unless both values are
    /// positive and finite.
    pub fn new(height_cm: f64, weight_kg: f64) -> ScaleResult<Self> {
        check("height", height_cm)?;
        check("weight", weight_kg)?;

        let target_bmi = bmi(height_cm, weight_kg);
        let reference_bmi = bmi(REFERENCE_HEIGHT_CM, REFERENCE_WEIGHT_KG);
        Ok(Self {
            height_ratio: (height_cm / REFERENCE_HEIGHT_CM).powf(HEIGHT_EXPONENT),
            bmi_scale: (target_bmi / reference_bmi).powf(BMI_EXPONENT),
            bmi: target_bmi,
            reference_bmi,
        })
    }

    /// Factors that leave the mesh unchanged.
    #[must_use]
    pub fn identity() -> Self {
        let reference_bmi = bmi(REFERENCE_HEIGHT_CM, REFERENCE_WEIGHT_KG);
        Self {
            height_ratio: 1.0,
            bmi_scale: 1.0,
            bmi: reference_bmi,
            reference_bmi,
        }
    }

    /// Length scale for the spine bones.
    #[inline]
    #[must_use]
    pub fn spine_length(&self) -> f64 {
        self.height_ratio.powf(SPINE_LENGTH_EXPONENT)
    }
}

fn check(name: &'static str, value: f64) -> ScaleResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScaleError::InvalidMeasurement { name, value })
    }
}
