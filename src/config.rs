//! Pipeline Configuration
//!
//! The configuration surface is deliberately small:
//!
//! ```text
//! { "pipeline": "topological" | "traditional",
//!   "metric":   "optimal_transport" | "bottleneck" }
//! ```
//!
//! The metric only matters for the topological pipeline. Short codes used
//! by older batch scripts (`ws`, `bn`, `tda`, `non_tda`) are accepted as
//! aliases. Anything else is rejected before any computation starts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DfcError, Result};

/// Decimal places kept in every dissimilarity entry
pub const DEFAULT_PRECISION: u32 = 3;

/// Upper bound on `precision`; beyond this f64 rounding is meaningless
pub const MAX_PRECISION: u32 = 12;

/// Which representation is compared between timepoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    /// Degree-0 persistence barcodes compared by a barcode metric
    #[default]
    Topological,
    /// Normalized snapshots compared by Frobenius norm
    Traditional,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Topological => "topological",
            Pipeline::Traditional => "traditional",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pipeline {
    type Err = DfcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topological" | "tda" => Ok(Pipeline::Topological),
            "traditional" | "euclidean" | "non_tda" => Ok(Pipeline::Traditional),
            other => Err(DfcError::InvalidConfig(format!(
                "unknown pipeline '{}' (expected topological or traditional)",
                other
            ))),
        }
    }
}

/// Distance between two barcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Order-1 Wasserstein distance
    #[default]
    OptimalTransport,
    /// Bottleneck (worst matched feature) distance
    Bottleneck,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::OptimalTransport => "optimal_transport",
            Metric::Bottleneck => "bottleneck",
        }
    }

    /// Two-letter code used in output directory names
    pub fn short_code(&self) -> &'static str {
        match self {
            Metric::OptimalTransport => "ws",
            Metric::Bottleneck => "bn",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = DfcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimal_transport" | "wasserstein" | "ws" => Ok(Metric::OptimalTransport),
            "bottleneck" | "bn" => Ok(Metric::Bottleneck),
            other => Err(DfcError::InvalidConfig(format!(
                "unknown distance method '{}' (expected optimal_transport or bottleneck)",
                other
            ))),
        }
    }
}

/// Per-subject distance computation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    pub pipeline: Pipeline,
    pub metric: Metric,
    /// Decimal places kept in each matrix entry
    pub precision: u32,
    /// Wall-clock budget for one subject's matrix
    #[serde(with = "opt_secs")]
    pub deadline: Option<Duration>,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            pipeline: Pipeline::Topological,
            metric: Metric::OptimalTransport,
            precision: DEFAULT_PRECISION,
            deadline: None,
        }
    }
}

impl DistanceConfig {
    pub fn topological(metric: Metric) -> Self {
        Self {
            pipeline: Pipeline::Topological,
            metric,
            ..Self::default()
        }
    }

    pub fn traditional() -> Self {
        Self {
            pipeline: Pipeline::Traditional,
            ..Self::default()
        }
    }

    /// Build from raw identifiers; `metric` may be omitted for the traditional pipeline
    pub fn from_options(pipeline: &str, metric: Option<&str>) -> Result<Self> {
        let pipeline: Pipeline = pipeline.parse()?;
        let metric = match metric {
            Some(m) => m.parse()?,
            None => Metric::default(),
        };
        let config = Self {
            pipeline,
            metric,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| {
            // serde reports unknown enum variants as data errors; surface them as config errors
            DfcError::InvalidConfig(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.precision > MAX_PRECISION {
            return Err(DfcError::InvalidConfig(format!(
                "precision {} exceeds maximum {}",
                self.precision, MAX_PRECISION
            )));
        }
        if let Some(deadline) = self.deadline {
            if deadline.is_zero() {
                return Err(DfcError::InvalidConfig("deadline must be positive".into()));
            }
        }
        Ok(())
    }

    /// Label used for output directories and log lines, e.g. `topological_ws`
    pub fn label(&self) -> String {
        match self.pipeline {
            Pipeline::Topological => format!("topological_{}", self.metric.short_code()),
            Pipeline::Traditional => "traditional".to_string(),
        }
    }
}

/// Settings for the cross-subject batch driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub distance: DistanceConfig,
    /// Worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl BatchConfig {
    pub fn new(distance: DistanceConfig) -> Self {
        Self {
            distance,
            threads: None,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(DfcError::InvalidConfig("threads must be at least 1".into()));
        }
        self.distance.validate()
    }
}

mod opt_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        secs.map(|s| {
            Duration::try_from_secs_f64(s).map_err(|e| {
                <D::Error as serde::de::Error>::custom(format!("invalid deadline {} seconds: {}", s, e))
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("ws".parse::<Metric>().unwrap(), Metric::OptimalTransport);
        assert_eq!("Bottleneck".parse::<Metric>().unwrap(), Metric::Bottleneck);
        assert_eq!("non_tda".parse::<Pipeline>().unwrap(), Pipeline::Traditional);
        assert_eq!(" topological ".parse::<Pipeline>().unwrap(), Pipeline::Topological);
    }

    #[test]
    fn test_unknown_identifiers_rejected() {
        assert!(matches!(
            "sinkhorn".parse::<Metric>(),
            Err(DfcError::InvalidConfig(_))
        ));
        assert!(matches!(
            DistanceConfig::from_options("spectral", None),
            Err(DfcError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let config =
            DistanceConfig::from_json_str(r#"{"pipeline":"topological","metric":"bottleneck"}"#)
                .unwrap();
        assert_eq!(config.metric, Metric::Bottleneck);
        assert_eq!(config.precision, DEFAULT_PRECISION);
        assert_eq!(config.deadline, None);

        let config = DistanceConfig::from_json_str(r#"{"pipeline":"traditional","deadline":2.5}"#)
            .unwrap();
        assert_eq!(config.pipeline, Pipeline::Traditional);
        assert_eq!(config.deadline, Some(Duration::from_millis(2500)));

        assert!(matches!(
            DistanceConfig::from_json_str(r#"{"metric":"l2"}"#),
            Err(DfcError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_out_of_range_deadline_rejected() {
        for raw in [
            r#"{"deadline":1e30}"#,
            r#"{"deadline":-1.0}"#,
        ] {
            assert!(matches!(
                DistanceConfig::from_json_str(raw),
                Err(DfcError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_validate() {
        assert!(DistanceConfig::default().with_precision(20).validate().is_err());
        assert!(DistanceConfig::default()
            .with_deadline(Duration::ZERO)
            .validate()
            .is_err());
        assert!(BatchConfig::default().with_threads(0).validate().is_err());
        assert!(BatchConfig::default().with_threads(4).validate().is_ok());
    }

    #[test]
    fn test_label() {
        assert_eq!(DistanceConfig::topological(Metric::Bottleneck).label(), "topological_bn");
        assert_eq!(DistanceConfig::traditional().label(), "traditional");
    }
}
