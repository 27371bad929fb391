use std::fmt;

use serde::{Deserialize, Serialize};

/// How data points within a period are aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Statistic {
    Sum,
    Average,
    Minimum,
    Maximum,
    SampleCount,
    /// Percentiles and other extended statistics, e.g. `p99`.
    Other(String),
}

impl Statistic {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sum => "Sum",
            Self::Average => "Average",
            Self::Minimum => "Minimum",
            Self::Maximum => "Maximum",
            Self::SampleCount => "SampleCount",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Statistic {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Self::Sum,
            "average" | "avg" => Self::Average,
            "minimum" | "min" => Self::Minimum,
            "maximum" | "max" => Self::Maximum,
            "samplecount" | "n" => Self::SampleCount,
            _ => Self::Other(s.to_owned()),
        }
    }
}

impl From<String> for Statistic {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Statistic> for String {
    fn from(stat: Statistic) -> Self {
        stat.as_str().to_owned()
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
