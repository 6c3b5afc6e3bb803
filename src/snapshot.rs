use crate::statistics::Var;
use crate::Time;

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Lifecycle of a simulation run.
///
/// `Converged`, `Cancelled` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunPhase {
    Initializing,
    Running,
    /// The stopping rule was satisfied.
    Converged,
    /// The run was stopped from outside, or ran past its time limit.
    Cancelled,
    /// An engine invariant was violated.
    Aborted,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Cancelled | Self::Aborted)
    }
}

impl Display for RunPhase {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Converged => "converged",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The four tracked metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    /// Number of requests in the system.
    N,
    /// Sojourn time.
    T,
    /// Queue length.
    NQ,
    /// Waiting time.
    TQ,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::N, Metric::T, Metric::NQ, Metric::TQ];
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Self::N => "N",
            Self::T => "T",
            Self::NQ => "NQ",
            Self::TQ => "TQ",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricSnapshot {
    /// Latest observed value.
    pub current: u64,
    pub mean: f64,
    /// Normalized standard deviation, the statistic compared against the precision.
    pub std_dev: f64,
    pub samples: u64,
}

impl MetricSnapshot {
    /// Convergence gauge on a 0 to 100 scale, reaching 100 once `std_dev` is within one precision step of zero.
    pub fn progress(&self, precision: f64) -> f64 {
        (101.0 - self.std_dev / precision).clamp(0.0, 100.0)
    }
}

impl From<&Var> for MetricSnapshot {
    fn from(var: &Var) -> Self {
        Self {
            current: var.current(),
            mean: var.mean(),
            std_dev: var.normalized_std_dev(),
            samples: var.count(),
        }
    }
}

/// Immutable copy of the engine's metrics, safe to hand to any thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub simulation_time: Time,
    pub phase: RunPhase,
    pub precision: f64,
    pub n: MetricSnapshot,
    pub t: MetricSnapshot,
    pub nq: MetricSnapshot,
    pub tq: MetricSnapshot,
}

impl Snapshot {
    pub fn metric(&self, metric: Metric) -> &MetricSnapshot {
        match metric {
            Metric::N => &self.n,
            Metric::T => &self.t,
            Metric::NQ => &self.nq,
            Metric::TQ => &self.tq,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] t={}", self.phase, self.simulation_time)?;
        for metric in Metric::ALL {
            let value = self.metric(metric);
            write!(f, " {}={:.4} (sd {:.2e})", metric, value.mean, value.std_dev)?;
        }
        Ok(())
    }
}
