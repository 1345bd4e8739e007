//! Summary statistics over sequences of angle vectors.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::angles::{AngleLayout, AngleVector, Joint};
use crate::error::{Error, Result};

/// Shortest sequence considered statistically meaningful
pub const DEFAULT_MIN_FRAMES: usize = 20;

/// Min/avg/max of one joint angle over a sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub frame_count: usize,
}

impl AngleStats {
    /// Degenerate statistics of a single reading
    pub fn constant(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            avg: value,
            frame_count: 1,
        }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Per-joint statistics for one analyzed sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    frame_count: usize,
    stats: BTreeMap<Joint, AngleStats>,
}

impl AggregateMetrics {
    /// Build directly from precomputed statistics
    pub fn from_stats<I>(frame_count: usize, stats: I) -> Self
    where
        I: IntoIterator<Item = (Joint, AngleStats)>,
    {
        Self {
            frame_count,
            stats: stats.into_iter().collect(),
        }
    }

    /// Single-frame aggregate where min = max = avg for every joint
    pub fn from_single<L: AngleLayout>(vector: &AngleVector<L>) -> Self {
        Self::from_stats(1, vector.iter().map(|(j, v)| (j, AngleStats::constant(v))))
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn get(&self, joint: Joint) -> Option<&AngleStats> {
        self.stats.get(&joint)
    }

    pub fn min(&self, joint: Joint) -> Option<f64> {
        self.get(joint).map(|s| s.min)
    }

    pub fn max(&self, joint: Joint) -> Option<f64> {
        self.get(joint).map(|s| s.max)
    }

    pub fn avg(&self, joint: Joint) -> Option<f64> {
        self.get(joint).map(|s| s.avg)
    }

    pub fn joints(&self) -> impl Iterator<Item = Joint> + '_ {
        self.stats.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, &AngleStats)> + '_ {
        self.stats.iter().map(|(j, s)| (*j, s))
    }
}

/// Aggregate with the default minimum of [`DEFAULT_MIN_FRAMES`].
pub fn aggregate<L: AngleLayout>(sequence: &[AngleVector<L>]) -> Result<AggregateMetrics> {
    aggregate_with_minimum(sequence, DEFAULT_MIN_FRAMES)
}

/// Aggregate a chronological sequence; fails below `min_frames` (at least 1).
pub fn aggregate_with_minimum<L: AngleLayout>(
    sequence: &[AngleVector<L>],
    min_frames: usize,
) -> Result<AggregateMetrics> {
    summarize(sequence.iter(), sequence.len(), min_frames)
}

fn summarize<'a, L, I>(frames: I, len: usize, min_frames: usize) -> Result<AggregateMetrics>
where
    L: AngleLayout,
    I: Iterator<Item = &'a AngleVector<L>> + Clone,
{
    let required = min_frames.max(1);
    if len < required {
        return Err(Error::InsufficientData {
            required,
            available: len,
        });
    }

    let stats = L::JOINTS.into_iter().enumerate().map(|(i, joint)| {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for frame in frames.clone() {
            let v = frame.values()[i];
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        (
            joint,
            AngleStats {
                min,
                max,
                avg: sum / len as f64,
                frame_count: len,
            },
        )
    });

    Ok(AggregateMetrics::from_stats(len, stats))
}

/// Fixed-capacity window over the most recent frames
#[derive(Debug, Clone)]
pub struct RollingWindow<L: AngleLayout> {
    capacity: usize,
    frames: VecDeque<AngleVector<L>>,
}

impl<L: AngleLayout> RollingWindow<L> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a frame, evicting the oldest once full
    pub fn push(&mut self, frame: AngleVector<L>) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn metrics(&self, min_frames: usize) -> Result<AggregateMetrics> {
        summarize(self.frames.iter(), self.frames.len(), min_frames)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
