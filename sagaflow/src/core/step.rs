//! Step identifiers and audit-trail step markers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one forward step in the fixed A -> B -> C pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepId {
    /// Creates the user record and produces the correlation key.
    A,
    /// Attaches the address to the created user.
    B,
    /// Attaches the payment method to the created user.
    C,
}

impl StepId {
    /// All forward steps in execution order.
    pub const FORWARD_ORDER: [Self; 3] = [Self::A, Self::B, Self::C];

    /// All steps in compensation (reverse) order.
    pub const REVERSE_ORDER: [Self; 3] = [Self::C, Self::B, Self::A];

    /// The step name as it appears in audit events and API responses.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Response fields that must be present for an invocation to count as
    /// successful. A response missing one of these is a failed attempt.
    #[must_use]
    pub fn required_response_fields(&self) -> &'static [&'static str] {
        match self {
            Self::A => &["user_id"],
            Self::B | Self::C => &[],
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The step marker carried by one audit event: a forward step, the
/// compensation of a forward step, or the rollback summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStep {
    /// Forward step A.
    #[serde(rename = "A")]
    A,
    /// Forward step B.
    #[serde(rename = "B")]
    B,
    /// Forward step C.
    #[serde(rename = "C")]
    C,
    /// Compensation of step A.
    #[serde(rename = "compensate_a")]
    CompensateA,
    /// Compensation of step B.
    #[serde(rename = "compensate_b")]
    CompensateB,
    /// Compensation of step C.
    #[serde(rename = "compensate_c")]
    CompensateC,
    /// Rollback summary written after all compensations ran.
    #[serde(rename = "rollback")]
    Rollback,
}

impl EventStep {
    /// Marker for a forward step.
    #[must_use]
    pub fn forward(step: StepId) -> Self {
        match step {
            StepId::A => Self::A,
            StepId::B => Self::B,
            StepId::C => Self::C,
        }
    }

    /// Marker for the compensation of a forward step.
    #[must_use]
    pub fn compensation(step: StepId) -> Self {
        match step {
            StepId::A => Self::CompensateA,
            StepId::B => Self::CompensateB,
            StepId::C => Self::CompensateC,
        }
    }

    /// The marker as it appears in serialized audit events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::CompensateA => "compensate_a",
            Self::CompensateB => "compensate_b",
            Self::CompensateC => "compensate_c",
            Self::Rollback => "rollback",
        }
    }

    /// Returns true if the marker belongs to the compensation phase.
    #[must_use]
    pub fn is_compensation(&self) -> bool {
        matches!(
            self,
            Self::CompensateA | Self::CompensateB | Self::CompensateC | Self::Rollback
        )
    }
}

impl fmt::Display for EventStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
