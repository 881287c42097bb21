//! Held-out evaluation metrics.
//!
//! Undefined values (no predictions for a class, no support, constant
//! targets) are `None` rather than NaN or a panic.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassMetrics {
    pub label:     String,
    pub precision: Option<f64>,
    pub recall:    Option<f64>,
    pub f1:        Option<f64>,
    pub support:   usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassificationMetrics {
    /// Low-risk class first, then high-risk.
    pub classes:         Vec<ClassMetrics>,
    pub accuracy:        Option<f64>,
    pub macro_precision: Option<f64>,
    pub macro_recall:    Option<f64>,
    pub macro_f1:        Option<f64>,
}

impl ClassificationMetrics {
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    if den == 0 { None } else { Some(num as f64 / den as f64) }
}

fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

pub const LOW_RISK_LABEL: &str = "low_risk";
pub const HIGH_RISK_LABEL: &str = "high_risk";

pub fn classification_metrics(actual: &[bool], predicted: &[bool]) -> ClassificationMetrics {
    assert_eq!(actual.len(), predicted.len(), "actual/predicted length mismatch");

    let classes: Vec<ClassMetrics> = [(false, LOW_RISK_LABEL), (true, HIGH_RISK_LABEL)]
        .iter()
        .map(|&(class, label)| {
            let pairs = actual.iter().zip(predicted);
            let tp = pairs.clone().filter(|(a, p)| **a == class && **p == class).count();
            let fp = pairs.clone().filter(|(a, p)| **a != class && **p == class).count();
            let fn_ = pairs.filter(|(a, p)| **a == class && **p != class).count();
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = match (precision, recall) {
                (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
                (Some(_), Some(_)) => Some(0.0),
                _ => None,
            };
            ClassMetrics {
                label: label.to_string(),
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect();

    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();

    ClassificationMetrics {
        accuracy: ratio(correct, actual.len()),
        macro_precision: mean_defined(classes.iter().map(|c| c.precision)),
        macro_recall: mean_defined(classes.iter().map(|c| c.recall)),
        macro_f1: mean_defined(classes.iter().map(|c| c.f1)),
        classes,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegressionMetrics {
    pub mean_absolute_error: Option<f64>,
    pub r2:                  Option<f64>,
}

pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    assert_eq!(actual.len(), predicted.len(), "actual/predicted length mismatch");
    let n = actual.len();
    if n == 0 {
        return RegressionMetrics { mean_absolute_error: None, r2: None };
    }
    let mae = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / n as f64;
    let mean = actual.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { Some(1.0 - ss_res / ss_tot) } else { None };
    RegressionMetrics { mean_absolute_error: Some(mae), r2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let actual = [true, false, true, false];
        let m = classification_metrics(&actual, &actual);
        assert_eq!(m.accuracy, Some(1.0));
        assert_eq!(m.class(HIGH_RISK_LABEL).unwrap().f1, Some(1.0));
        assert_eq!(m.class(LOW_RISK_LABEL).unwrap().support, 2);
    }

    #[test]
    fn absent_class_is_undefined_not_a_panic() {
        let actual = [false, false, false];
        let predicted = [false, false, false];
        let m = classification_metrics(&actual, &predicted);
        let high = m.class(HIGH_RISK_LABEL).unwrap();
        assert_eq!(high.support, 0);
        assert_eq!(high.precision, None);
        assert_eq!(high.recall, None);
        assert_eq!(high.f1, None);
        assert_eq!(m.accuracy, Some(1.0));
        assert_eq!(m.macro_f1, Some(1.0));
    }

    #[test]
    fn mixed_predictions() {
        let actual = [true, true, false, false];
        let predicted = [true, false, true, false];
        let m = classification_metrics(&actual, &predicted);
        let high = m.class(HIGH_RISK_LABEL).unwrap();
        assert_eq!(high.precision, Some(0.5));
        assert_eq!(high.recall, Some(0.5));
        assert_eq!(m.accuracy, Some(0.5));
    }

    #[test]
    fn regression_metrics_basic() {
        let m = regression_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]);
        assert!((m.mean_absolute_error.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.r2.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_target_has_undefined_r2() {
        let m = regression_metrics(&[2.0, 2.0], &[2.0, 3.0]);
        assert_eq!(m.r2, None);
        assert_eq!(m.mean_absolute_error, Some(0.5));
    }

    #[test]
    fn empty_partition_has_no_metrics() {
        let m = regression_metrics(&[], &[]);
        assert_eq!(m.mean_absolute_error, None);
    }
}
