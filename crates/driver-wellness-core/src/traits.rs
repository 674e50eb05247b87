//! Trait definitions for pluggable components.

use crate::types::WellnessSample;

/// Inbound seam for anything that produces wellness samples.
///
/// Real sensing pipelines and the random-walk simulator both implement this.
/// The store never validates samples, so implementors own range checks.
pub trait SampleSource: Send {
    /// Produce the observation for this tick.
    ///
    /// Returns `None` when no observation is available (for example no face
    /// in frame); nothing is ingested for that tick.
    fn next_sample(&mut self) -> Option<WellnessSample>;

    /// Short name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> Option<WellnessSample> {
        (**self).next_sample()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
