use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed vocabulary of named uncertainty factors a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyFactor {
    MeasurementError,
    SpatialVariability,
    TemporalVariability,
    ModelUncertainty,
    SamplingError,
}

impl UncertaintyFactor {
    pub const ALL: [UncertaintyFactor; 5] = [
        UncertaintyFactor::MeasurementError,
        UncertaintyFactor::SpatialVariability,
        UncertaintyFactor::TemporalVariability,
        UncertaintyFactor::ModelUncertainty,
        UncertaintyFactor::SamplingError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintyFactor::MeasurementError => "measurement_error",
            UncertaintyFactor::SpatialVariability => "spatial_variability",
            UncertaintyFactor::TemporalVariability => "temporal_variability",
            UncertaintyFactor::ModelUncertainty => "model_uncertainty",
            UncertaintyFactor::SamplingError => "sampling_error",
        }
    }

    /// Comma-separated list of every valid name, for error messages.
    pub fn vocabulary() -> String {
        UncertaintyFactor::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for UncertaintyFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UncertaintyFactor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UncertaintyFactor::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown uncertainty factor: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for factor in UncertaintyFactor::ALL {
            assert_eq!(factor.as_str().parse::<UncertaintyFactor>(), Ok(factor));
        }
    }

    #[test]
    fn unknown_name_rejected() {
        assert!("gut_feeling".parse::<UncertaintyFactor>().is_err());
    }

    #[test]
    fn vocabulary_lists_all_names() {
        let vocab = UncertaintyFactor::vocabulary();
        assert!(vocab.starts_with("measurement_error"));
        assert_eq!(vocab.split(", ").count(), 5);
    }
}
