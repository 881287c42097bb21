use crate::error::{AnalysisError, AnalysisResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of named segments the segmenter partitions the portfolio into.
pub const SEGMENT_COUNT: usize = 4;

// ── Model parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees:           usize,
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    /// Features examined per split. `None` means sqrt(n_features).
    pub max_features:      Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees:           100,
            max_depth:         16,
            min_samples_split: 2,
            min_samples_leaf:  1,
            max_features:      None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators:      usize,
    pub learning_rate:     f64,
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    /// Fraction of training rows drawn per stage. 1.0 disables row sampling.
    pub subsample:         f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators:      100,
            learning_rate:     0.1,
            max_depth:         3,
            min_samples_split: 2,
            min_samples_leaf:  1,
            subsample:         1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringParams {
    pub max_iterations: u64,
    pub tolerance:      f64,
    pub n_runs:         usize,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance:      1e-4,
            n_runs:         10,
        }
    }
}

// ── Recommendation thresholds ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub max_high_risk_rate:         f64,
    pub market_rate:                f64,
    pub max_servicer_share:         f64,
    pub max_product_high_risk_rate: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            max_high_risk_rate:         0.15,
            market_rate:                5.5,
            max_servicer_share:         0.40,
            max_product_high_risk_rate: 0.20,
        }
    }
}

// ── Top-level config ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_count:  usize,
    pub seed:          u64,
    /// "Now" for loan age / time to maturity. Never read from the clock.
    pub analysis_date: NaiveDate,
    pub test_fraction: f64,
    pub forest:        ForestParams,
    pub boosting:      BoostingParams,
    pub clustering:    ClusteringParams,
    pub thresholds:    RecommendationThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_count:  1000,
            seed:          42,
            analysis_date: default_analysis_date(),
            test_fraction: 0.2,
            forest:        ForestParams::default(),
            boosting:      BoostingParams::default(),
            clustering:    ClusteringParams::default(),
            thresholds:    RecommendationThresholds::default(),
        }
    }
}

fn default_analysis_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Small, fast configuration for tests.
    pub fn default_test() -> Self {
        Self {
            sample_count: 300,
            forest: ForestParams {
                n_trees: 15,
                max_depth: 8,
                ..ForestParams::default()
            },
            boosting: BoostingParams {
                n_estimators: 30,
                ..BoostingParams::default()
            },
            clustering: ClusteringParams {
                n_runs: 3,
                ..ClusteringParams::default()
            },
            ..Self::default()
        }
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject configurations that cannot produce a meaningful run.
    /// Called before any stage executes.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.sample_count == 0 {
            return Err(AnalysisError::Configuration(
                "sample_count must be greater than zero".into(),
            ));
        }
        if self.sample_count < SEGMENT_COUNT {
            return Err(AnalysisError::Configuration(format!(
                "segment count ({SEGMENT_COUNT}) exceeds sample_count ({})",
                self.sample_count
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(AnalysisError::Configuration(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.forest.n_trees == 0 {
            return Err(AnalysisError::Configuration("forest.n_trees must be > 0".into()));
        }
        if self.boosting.n_estimators == 0 {
            return Err(AnalysisError::Configuration(
                "boosting.n_estimators must be > 0".into(),
            ));
        }
        if self.boosting.learning_rate <= 0.0 {
            return Err(AnalysisError::Configuration(
                "boosting.learning_rate must be positive".into(),
            ));
        }
        if !(self.boosting.subsample > 0.0 && self.boosting.subsample <= 1.0) {
            return Err(AnalysisError::Configuration(
                "boosting.subsample must be in (0, 1]".into(),
            ));
        }
        if self.clustering.n_runs == 0 {
            return Err(AnalysisError::Configuration("clustering.n_runs must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(AnalysisConfig::default_test().validate().is_ok());
    }

    #[test]
    fn zero_samples_rejected() {
        let err = AnalysisConfig::default().with_sample_count(0).validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn fewer_samples_than_segments_rejected() {
        let err = AnalysisConfig::default().with_sample_count(3).validate().unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{ "sample_count": 50, "forest": { "n_trees": 7 } }"#).unwrap();
        assert_eq!(cfg.sample_count, 50);
        assert_eq!(cfg.forest.n_trees, 7);
        assert_eq!(cfg.forest.min_samples_leaf, 1);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.thresholds.market_rate, 5.5);
    }
}
