//! Ordered pipelines of named fallible steps.
//!
//! Multi-step setup work (project init, for one) runs as an explicit list
//! of named steps. The pipeline stops at the first failure and reports
//! which step failed, so diagnostics name the step instead of a bare
//! io error.

use tracing::debug;

use crate::error::{Error, Result};

/// Outcome of running a pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// Every step ran.
    Completed { steps: usize },
    /// A step failed; earlier steps have already run and are not undone.
    Failed { step: &'static str, error: Error },
}

impl Outcome {
    /// Convert into a `Result`, keeping the failing step in the message.
    pub fn into_result(self) -> Result<()> {
        match self {
            Outcome::Completed { .. } => Ok(()),
            Outcome::Failed { step, error } => {
                debug!(step, %error, "pipeline step failed");
                Err(error)
            }
        }
    }

    pub fn failed_step(&self) -> Option<&'static str> {
        match self {
            Outcome::Completed { .. } => None,
            Outcome::Failed { step, .. } => Some(step),
        }
    }
}

/// A named step.
pub struct Step<'a> {
    pub name: &'static str,
    pub run: Box<dyn FnOnce() -> Result<()> + 'a>,
}

impl<'a> Step<'a> {
    pub fn new(name: &'static str, run: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

/// Run steps in order, stopping at the first failure.
pub fn run<'a>(steps: impl IntoIterator<Item = Step<'a>>) -> Outcome {
    let mut count = 0;

    for step in steps {
        debug!(step = step.name, "running step");
        if let Err(error) = (step.run)() {
            return Outcome::Failed {
                step: step.name,
                error,
            };
        }
        count += 1;
    }

    Outcome::Completed { steps: count }
}
