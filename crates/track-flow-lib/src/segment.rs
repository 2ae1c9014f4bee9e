//! Visible-segment masks
//!
//! A track's visible segments are tracked as two [`BitVector`]s over segment
//! positions of the simplified index set, swapped each frame by flipping an index,
//! plus the set of segments that need drawing when rendering incrementally.
//!
//! Each buffer carries the *edge* segments of its frame: visible segments with one
//! endpoint outside the viewport, which the canvas clipped when drawing them.

use crate::BitVector;

/// Double-buffered visibility mask for one track
#[derive(Clone, Debug, Default)]
pub struct SegmentMask {
    masks: [BitVector; 2],
    /// Edge segments, parallel to `masks`
    edges: [BitVector; 2],
    current: usize,
    /// Segments to draw in an incremental frame
    updates: BitVector,
    /// Neighbours pulled into `updates` to close joins
    scratch: BitVector,
    /// Zoom level `masks[current]` was computed for
    zoom: Option<u8>,
    /// Whether the track was entirely inside the viewport when last computed
    contained: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SegmentMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments visible this frame
    #[inline]
    pub fn current(&self) -> &BitVector {
        &self.masks[self.current]
    }

    /// Segments visible the previous time the mask was computed
    #[inline]
    pub fn last(&self) -> &BitVector {
        &self.masks[self.current ^ 1]
    }

    /// Segments to draw when only the difference from the last frame is rendered
    #[inline]
    pub fn updates(&self) -> &BitVector {
        &self.updates
    }

    #[inline]
    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Whether a recompute for `zoom` can be skipped
    ///
    /// True when the track was already fully inside the viewport at the same zoom and
    /// still is.
    pub fn is_unchanged(&self, zoom: u8, contained: bool) -> bool {
        contained && self.contained && self.zoom == Some(zoom)
    }

    /// Visible segments clipped at the viewport border this frame
    #[inline]
    pub fn edges(&self) -> &BitVector {
        &self.edges[self.current]
    }

    /// Flip buffers and return the new, cleared current mask and edge set, both
    /// sized for `n_segments`
    pub(crate) fn begin(&mut self, n_segments: usize) -> (&mut BitVector, &mut BitVector) {
        self.current ^= 1;
        let mask = &mut self.masks[self.current];
        mask.clear();
        mask.resize(n_segments);
        let edges = &mut self.edges[self.current];
        edges.clear();
        edges.resize(n_segments);
        (mask, edges)
    }

    /// Finish a frame computed by [`SegmentMask::begin`]
    ///
    /// When the zoom is unchanged the updates are the newly visible segments, plus
    /// any previously drawn neighbour of a new segment so strokes join without a
    /// seam, plus every visible segment that was clipped at the border this frame or
    /// the last, so a pan never leaves a line cut short. Otherwise every visible
    /// segment needs drawing.
    pub(crate) fn finish(&mut self, zoom: u8, contained: bool) {
        let same_zoom = self.zoom == Some(zoom);
        let (current, last) = pair(&self.masks, self.current);
        let (edges, last_edges) = pair(&self.edges, self.current);

        if same_zoom {
            current.difference_into(last, &mut self.updates);
            self.scratch.clear();
            for s in &self.updates {
                if s > 0 && last.has(s - 1) && current.has(s - 1) {
                    self.scratch.add(s - 1);
                }
                if last.has(s + 1) && current.has(s + 1) {
                    self.scratch.add(s + 1);
                }
            }
            for s in edges.iter().chain(last_edges.iter()) {
                if current.has(s) {
                    self.scratch.add(s);
                }
            }
            self.updates.union(&self.scratch);
        } else {
            self.updates.copy_from(current);
        }

        self.zoom = Some(zoom);
        self.contained = contained;
    }

    /// Record that nothing changed since the last frame
    pub(crate) fn keep(&mut self) {
        self.updates.clear();
    }

    /// Forget all visibility state
    ///
    /// The next computed frame then reports every visible segment as an update.
    pub fn reset(&mut self) {
        for mask in self.masks.iter_mut().chain(self.edges.iter_mut()) {
            mask.clear();
        }
        self.updates.clear();
        self.scratch.clear();
        self.zoom = None;
        self.contained = false;
    }
}

/// `(buffers[current], buffers[current ^ 1])`
#[inline]
fn pair(buffers: &[BitVector; 2], current: usize) -> (&BitVector, &BitVector) {
    let [first, second] = buffers;
    if current == 0 {
        (first, second)
    } else {
        (second, first)
    }
}
