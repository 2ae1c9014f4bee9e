//! Deferred per-zoom simplification
//!
//! Newly visible tracks do not simplify inline. They are queued, and the whole batch
//! is drained behind a barrier before segment masks are computed. Draining runs the
//! jobs on the rayon pool; results are installed afterwards on the caller's thread.

use crate::Track;
use crate::track::ZoomLevel;
use rayon::prelude::*;

/// Queue of `(track slot, zoom)` simplification jobs
#[derive(Debug, Default)]
pub struct SimplifyQueue {
    jobs: Vec<(usize, u8)>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SimplifyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `zoom` for the track stored at `slot`
    ///
    /// The track is tagged as computing, so a second request for the same zoom is
    /// ignored until the first is installed.
    ///
    /// # Returns
    /// Whether a job was added
    pub fn schedule(&mut self, track: &mut Track, slot: usize, zoom: u8) -> bool {
        if track.begin_zoom(zoom) {
            self.jobs.push((slot, zoom));
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every queued job and install the results into `tracks`
    ///
    /// Returns only once all jobs are installed. A job whose slot is no longer
    /// computing (the track was replaced or its zoom already installed) is skipped.
    ///
    /// # Returns
    /// The number of jobs completed
    pub fn drain(&mut self, tracks: &mut [Track]) -> usize {
        if self.jobs.is_empty() {
            return 0;
        }
        #[cfg(feature = "profiling")]
        profiling::scope!("queue::drain");

        let shared: &[Track] = tracks;
        let results: Vec<(usize, u8, ZoomLevel)> = self
            .jobs
            .par_iter()
            .filter_map(|&(slot, zoom)| {
                shared
                    .get(slot)
                    .filter(|track| track.is_computing(zoom))
                    .map(|track| (slot, zoom, track.simplify_for_zoom(zoom)))
            })
            .collect();

        let completed = results.len();
        for (slot, zoom, level) in results {
            tracks[slot].install_zoom(zoom, level);
        }
        tracing::debug!(jobs = self.jobs.len(), completed, "Drained simplification queue");
        self.jobs.clear();
        completed
    }
}
