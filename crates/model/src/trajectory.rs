use std::slice;

use crate::params::Inventories;

/// Inventories at one sample time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time in seconds.
    pub t: f64,

    /// Plasma inventory `Np` in particles.
    pub plasma: f64,

    /// Wall inventory `Nw` in particles.
    pub wall: f64,
}

impl Sample {
    pub fn inventories(&self) -> Inventories {
        Inventories {
            plasma: self.plasma,
            wall: self.wall,
        }
    }
}

/// Samples of a run in strictly increasing time.
///
/// Only a run appends to a trajectory; callers receive it read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        debug_assert!(
            self.samples.last().is_none_or(|last| last.t < sample.t),
            "samples must be appended in increasing time"
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Total inventory `Np + Nw` at each sample.
    pub fn totals(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.plasma + s.wall)
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_samples_in_order() {
        let mut trajectory = Trajectory::with_capacity(2);
        trajectory.push(Sample {
            t: 0.0,
            plasma: 1.0,
            wall: 2.0,
        });
        trajectory.push(Sample {
            t: 0.5,
            plasma: 1.5,
            wall: 2.5,
        });

        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.first().unwrap().t, 0.0);
        assert_eq!(trajectory.last().unwrap().t, 0.5);
        assert_eq!(trajectory.totals().collect::<Vec<_>>(), vec![3.0, 4.0]);
        assert_eq!((&trajectory).into_iter().count(), 2);
    }

    #[test]
    #[should_panic(expected = "increasing time")]
    #[cfg(debug_assertions)]
    fn rejects_out_of_order_samples() {
        let mut trajectory = Trajectory::default();
        let sample = Sample {
            t: 1.0,
            plasma: 0.0,
            wall: 0.0,
        };
        trajectory.push(sample);
        trajectory.push(sample);
    }
}
