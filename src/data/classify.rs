use std::fmt;

use super::model::{Field, Sample};

// ---------------------------------------------------------------------------
// Severity buckets
// ---------------------------------------------------------------------------

/// Four ordered buckets over a measurement, shared by plasticity index and
/// moisture content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Highest,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Highest,
    ];

    /// Legend text for the bucket.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "< 10",
            Severity::Medium => "10 - 20",
            Severity::High => "20 - 40",
            Severity::Highest => "≥ 40",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a measurement.
///
/// Total over `f64`: NaN and negative values fall through to [`Severity::Low`].
pub fn classify(value: f64) -> Severity {
    if value >= 40.0 {
        Severity::Highest
    } else if value >= 20.0 {
        Severity::High
    } else if value >= 10.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

// ---------------------------------------------------------------------------
// Measure – which column feeds the classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Measure {
    PlasticityIndex,
    MoistureContent,
}

impl Measure {
    pub fn field(self) -> Field {
        match self {
            Measure::PlasticityIndex => Field::PlasticityIndex,
            Measure::MoistureContent => Field::MoistureContent,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Measure::PlasticityIndex => "Plasticity Index",
            Measure::MoistureContent => "Moisture Content",
        }
    }

    /// Raw value with missing read as zero.
    pub fn value(self, sample: &Sample) -> f64 {
        self.field().number(sample).unwrap_or(0.0)
    }

    pub fn classify(self, sample: &Sample) -> Severity {
        classify(self.value(sample))
    }
}
