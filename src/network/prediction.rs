use serde::{Serialize, Deserialize};

/// Outcome of classifying one image.
///
/// `prediction` is the winning class, or `-1` when preprocessing found no
/// foreground at all; in that case `probabilities` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: i32,
    pub probabilities: Vec<f64>,
}

impl Prediction {
    pub const NO_DIGIT: i32 = -1;

    pub fn no_digit() -> Prediction {
        Prediction { prediction: Prediction::NO_DIGIT, probabilities: Vec::new() }
    }

    /// Picks the most probable class (lowest index on ties).
    pub fn from_probabilities(probabilities: Vec<f64>) -> Prediction {
        let mut best = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = i;
            }
        }
        Prediction { prediction: best as i32, probabilities }
    }

    pub fn is_digit(&self) -> bool {
        self.prediction != Prediction::NO_DIGIT
    }
}
