use serde::{Deserialize, Serialize};

use super::labels::parse_class_name;

/// Raw class reported when the model's arg-max falls outside the label list.
pub const UNKNOWN_CLASS: &str = "Unknown";

pub const HEALTHY_RECOMMENDATIONS: [&str; 4] = [
    "Continue regular watering and care",
    "Ensure adequate sunlight and nutrients",
    "Monitor for any changes in appearance",
    "Maintain good air circulation",
];

pub const DISEASED_RECOMMENDATIONS: [&str; 4] = [
    "Isolate affected plants to prevent spread",
    "Consult with an agricultural expert",
    "Consider appropriate treatment methods",
    "Monitor other plants for similar symptoms",
];

/// Outcome of one classification, kept in the user's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub raw_class: String,
    pub plant_type: String,
    pub condition: String,
    pub is_healthy: bool,
    /// Percentage in [0, 100], two decimals.
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

impl Prediction {
    /// Build from a raw label and the top-class probability (0..=1).
    pub fn from_label(raw_class: &str, probability: f32) -> Self {
        let label = parse_class_name(raw_class);
        Self {
            raw_class: raw_class.to_string(),
            plant_type: label.plant,
            condition: label.condition,
            is_healthy: label.is_healthy,
            confidence: confidence_percent(probability),
            recommendations: recommendations_for(label.is_healthy),
        }
    }

    /// "Healthy" or "Disease Detected", as shown to users and the assistant.
    pub fn status_label(&self) -> &'static str {
        if self.is_healthy {
            "Healthy"
        } else {
            "Disease Detected"
        }
    }
}

/// Canned advice chosen only by the healthy flag.
pub fn recommendations_for(is_healthy: bool) -> Vec<String> {
    let list = if is_healthy {
        &HEALTHY_RECOMMENDATIONS
    } else {
        &DISEASED_RECOMMENDATIONS
    };
    list.iter().map(|s| s.to_string()).collect()
}

/// Probability → percentage rounded to two decimals, clamped to [0, 100].
///
/// Non-finite probabilities report 0.
pub fn confidence_percent(probability: f32) -> f64 {
    if !probability.is_finite() {
        return 0.0;
    }
    let percent = (probability as f64 * 100.0).clamp(0.0, 100.0);
    (percent * 100.0).round() / 100.0
}

/// Index and value of the largest finite score. `None` for empty or all-NaN input.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rounds_to_two_decimals() {
        assert_eq!(confidence_percent(0.977_71), 97.77);
        assert_eq!(confidence_percent(0.5), 50.0);
        assert_eq!(confidence_percent(0.123_456), 12.35);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(confidence_percent(1.2), 100.0);
        assert_eq!(confidence_percent(-0.1), 0.0);
        assert_eq!(confidence_percent(f32::NAN), 0.0);
        assert_eq!(confidence_percent(f32::INFINITY), 0.0);
    }

    #[test]
    fn healthy_label_gets_healthy_recommendations() {
        let p = Prediction::from_label("Tomato___healthy", 0.9);
        assert!(p.is_healthy);
        assert_eq!(p.recommendations, recommendations_for(true));
        assert_eq!(p.recommendations[0], "Continue regular watering and care");
        assert_eq!(p.status_label(), "Healthy");
    }

    #[test]
    fn diseased_label_gets_diseased_recommendations() {
        let p = Prediction::from_label("Strawberry___Leaf_scorch", 0.9777);
        assert!(!p.is_healthy);
        assert_eq!(p.plant_type, "Strawberry");
        assert_eq!(p.condition, "Leaf scorch");
        assert_eq!(p.confidence, 97.77);
        assert_eq!(p.recommendations[0], "Isolate affected plants to prevent spread");
        assert_eq!(p.status_label(), "Disease Detected");
    }

    #[test]
    fn argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some((1, 0.3)));
    }

    #[test]
    fn serializes_with_expected_field_names() {
        let p = Prediction::from_label("Apple___Black_rot", 0.8);
        let json = serde_json::to_value(&p).unwrap();
        for key in [
            "raw_class",
            "plant_type",
            "condition",
            "is_healthy",
            "confidence",
            "recommendations",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
