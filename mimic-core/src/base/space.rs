//! Observation and action spaces.
use rand::Rng;
use rand_distr::{Distribution, Exp1, StandardNormal};
use serde::{Deserialize, Serialize};

/// A space of observations or actions.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum Space {
    /// Integers `0..n`, represented by a single `f32` column.
    Discrete {
        /// The number of elements.
        n: usize,
    },

    /// A box in `R^d`; bounds may be infinite.
    Box {
        /// Lower bounds.
        low: Vec<f32>,
        /// Upper bounds.
        high: Vec<f32>,
    },
}

impl Space {
    /// Discrete space with `n` elements.
    pub fn discrete(n: usize) -> Self {
        Self::Discrete { n }
    }

    /// Box space with the given bounds.
    ///
    /// Panics if the bounds have different lengths.
    pub fn boxed(low: Vec<f32>, high: Vec<f32>) -> Self {
        assert_eq!(low.len(), high.len(), "Bounds of different lengths");
        Self::Box { low, high }
    }

    /// Unbounded box space of dimension `dim`.
    pub fn unbounded(dim: usize) -> Self {
        Self::Box {
            low: vec![f32::NEG_INFINITY; dim],
            high: vec![f32::INFINITY; dim],
        }
    }

    /// The number of columns an element of this space occupies in a [`Mat`](crate::Mat).
    pub fn flat_dim(&self) -> usize {
        match self {
            Self::Discrete { .. } => 1,
            Self::Box { low, .. } => low.len(),
        }
    }

    /// Returns `true` if `x` is an element of the space.
    pub fn contains(&self, x: &[f32]) -> bool {
        match self {
            Self::Discrete { n } => {
                x.len() == 1 && x[0] >= 0. && x[0].fract() == 0. && (x[0] as usize) < *n
            }
            Self::Box { low, high } => {
                x.len() == low.len()
                    && x
                        .iter()
                        .zip(low.iter().zip(high.iter()))
                        .all(|(v, (l, h))| l <= v && v <= h)
            }
        }
    }

    /// Samples an element.
    ///
    /// Bounded dimensions of a box are sampled uniformly, unbounded ones from the
    /// standard normal and half-bounded ones from a shifted exponential distribution.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f32> {
        match self {
            Self::Discrete { n } => vec![rng.gen_range(0..*n) as f32],
            Self::Box { low, high } => low
                .iter()
                .zip(high.iter())
                .map(|(&l, &h)| match (l.is_finite(), h.is_finite()) {
                    (true, true) => {
                        if l == h {
                            l
                        } else {
                            rng.gen_range(l..=h)
                        }
                    }
                    (false, false) => StandardNormal.sample(rng),
                    (true, false) => {
                        let e: f32 = Exp1.sample(rng);
                        l + e
                    }
                    (false, true) => {
                        let e: f32 = Exp1.sample(rng);
                        h - e
                    }
                })
                .collect(),
        }
    }

    /// The zero element, `0` for discrete spaces and the zero vector for boxes.
    pub fn zero(&self) -> Vec<f32> {
        vec![0f32; self.flat_dim()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_sample_is_contained() {
        let mut rng = SmallRng::seed_from_u64(42);
        let spaces = vec![
            Space::discrete(3),
            Space::boxed(vec![-1.0, 0.0], vec![1.0, 0.5]),
            Space::boxed(vec![0.0, f32::NEG_INFINITY], vec![f32::INFINITY, 2.0]),
            Space::unbounded(3),
        ];
        for space in spaces.iter() {
            for _ in 0..100 {
                let x = space.sample(&mut rng);
                assert_eq!(x.len(), space.flat_dim());
                assert!(space.contains(&x), "{:?} not in {:?}", x, space);
            }
        }
    }

    #[test]
    fn test_zero() {
        assert_eq!(Space::discrete(4).zero(), vec![0.0]);
        assert_eq!(Space::unbounded(2).zero(), vec![0.0, 0.0]);
        assert!(!Space::discrete(4).contains(&[4.0]));
        assert!(!Space::discrete(4).contains(&[1.5]));
    }
}
