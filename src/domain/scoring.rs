//! Score calculation
//!
//! Two unrelated scoring paths share the 0-100 range:
//! - the violation-penalty score attached to every `ValidationResult`
//! - the weighted composite score over four externally judged metrics,
//!   optionally adjusted by multiplicative bonuses
//!
//! Both use round-half-up on non-negative values, which is what `f64::round` does there.

use crate::domain::violations::{ArchError, ArchResult, Violation, ViolationKind};
use serde::{Deserialize, Serialize};

pub const CYCLIC_DEPENDENCY_PENALTY: i32 = 30;
pub const DEPENDENCY_DIRECTION_PENALTY: i32 = 20;
pub const DTO_PURITY_PENALTY: i32 = 15;
pub const PRESENTATION_TO_INFRA_PENALTY: i32 = 15;
pub const FAT_SERVICE_PENALTY: i32 = 10;
pub const UNCLASSIFIED_PENALTY: i32 = 5;

/// Weights in percent; they sum to 100
pub const ACCURACY_WEIGHT: f64 = 35.0;
pub const EFFICIENCY_WEIGHT: f64 = 25.0;
pub const MAINTAINABILITY_WEIGHT: f64 = 25.0;
pub const SPEED_WEIGHT: f64 = 15.0;

const MAX_SCORE: f64 = 100.0;

/// Points deducted for one violation of `kind`
pub fn penalty_for(kind: &ViolationKind) -> i32 {
    match kind {
        ViolationKind::CyclicDependency => CYCLIC_DEPENDENCY_PENALTY,
        ViolationKind::DependencyDirection => DEPENDENCY_DIRECTION_PENALTY,
        ViolationKind::DtoPurity => DTO_PURITY_PENALTY,
        ViolationKind::PresentationToInfra => PRESENTATION_TO_INFRA_PENALTY,
        ViolationKind::FatService => FAT_SERVICE_PENALTY,
        ViolationKind::Other(_) => UNCLASSIFIED_PENALTY,
    }
}

/// 100 minus every violation's penalty; only the final total is clamped
pub fn penalty_score(violations: &[Violation]) -> u8 {
    let total = violations
        .iter()
        .fold(100_i32, |score, violation| score - penalty_for(&violation.kind));
    total.clamp(0, 100) as u8
}

/// Externally judged quality metrics, each expected in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub accuracy: f64,
    pub efficiency: f64,
    pub maintainability: f64,
    pub speed: f64,
}

impl QualityMetrics {
    pub fn new(accuracy: f64, efficiency: f64, maintainability: f64, speed: f64) -> Self {
        Self {
            accuracy,
            efficiency,
            maintainability,
            speed,
        }
    }

    /// Reject any metric outside [0, 100], NaN included
    pub fn validate(&self) -> ArchResult<()> {
        for (metric, value) in self.named() {
            if !(0.0..=MAX_SCORE).contains(&value) {
                return Err(ArchError::MetricOutOfRange {
                    metric: metric.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("efficiency", self.efficiency),
            ("maintainability", self.maintainability),
            ("speed", self.speed),
        ]
    }

    /// Unrounded weighted blend
    fn weighted(&self) -> f64 {
        // Weights are kept in percent so integral metrics sum exactly before the division.
        (self.accuracy * ACCURACY_WEIGHT
            + self.efficiency * EFFICIENCY_WEIGHT
            + self.maintainability * MAINTAINABILITY_WEIGHT
            + self.speed * SPEED_WEIGHT)
            / 100.0
    }
}

/// A multiplicative adjustment applied to a composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
    pub label: String,
    pub multiplier: f64,
}

impl Bonus {
    pub fn new(label: impl Into<String>, multiplier: f64) -> Self {
        Self {
            label: label.into(),
            multiplier,
        }
    }

    /// `percent` of +5 gives a 1.05 multiplier, -10 gives 0.9
    pub fn percent(label: impl Into<String>, percent: f64) -> Self {
        Self::new(label, 1.0 + percent / 100.0)
    }
}

/// Weighted composite score plus the bonuses applied to it so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    value: u8,
    bonuses: Vec<Bonus>,
}

impl CompositeScore {
    /// `round(accuracy*0.35 + efficiency*0.25 + maintainability*0.25 + speed*0.15)`
    pub fn compute(metrics: &QualityMetrics) -> ArchResult<Self> {
        metrics.validate()?;
        Ok(Self {
            value: to_score(metrics.weighted()),
            bonuses: Vec::new(),
        })
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn bonuses(&self) -> &[Bonus] {
        &self.bonuses
    }

    /// `value = round(value * multiplier)`, clamped to [0, 100]
    pub fn apply_bonus(mut self, bonus: Bonus) -> ArchResult<Self> {
        if !bonus.multiplier.is_finite() || bonus.multiplier < 0.0 {
            return Err(ArchError::InvalidBonus {
                multiplier: bonus.multiplier,
            });
        }

        let before = self.value;
        self.value = to_score(f64::from(self.value) * bonus.multiplier);
        tracing::debug!("Applied bonus '{}': {} -> {}", bonus.label, before, self.value);
        self.bonuses.push(bonus);
        Ok(self)
    }

    /// Apply bonuses left to right; each step is rounded before the next
    pub fn apply_bonuses(self, bonuses: impl IntoIterator<Item = Bonus>) -> ArchResult<Self> {
        bonuses.into_iter().try_fold(self, Self::apply_bonus)
    }
}

/// Composite score of `metrics` without bonuses
pub fn composite_score(metrics: &QualityMetrics) -> ArchResult<u8> {
    CompositeScore::compute(metrics).map(|score| score.value())
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, MAX_SCORE) as u8
}
