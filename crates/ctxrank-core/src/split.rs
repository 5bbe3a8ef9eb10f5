use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub valid_proportion: f64,
    pub test_proportion: f64,
    pub batch_size: usize,
    /// Drop the final batch when it holds fewer than `batch_size` items.
    pub drop_last: bool,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            valid_proportion: 0.25,
            test_proportion: 0.25,
            batch_size: 32,
            drop_last: false,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub valid: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Split<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SplitConfig {
    #[must_use]
    pub fn with_proportions(mut self, valid: f64, test: f64) -> Self {
        self.valid_proportion = valid;
        self.test_proportion = test;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_batches(mut self, batch_size: usize, drop_last: bool) -> Self {
        self.batch_size = batch_size;
        self.drop_last = drop_last;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (label, p) in [("valid", self.valid_proportion), ("test", self.test_proportion)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidSplit(format!(
                    "{label} proportion {p} is outside [0, 1]"
                )));
            }
        }
        if self.valid_proportion + self.test_proportion > 1.0 {
            return Err(Error::InvalidSplit(format!(
                "valid and test proportions sum to {}",
                self.valid_proportion + self.test_proportion
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidSplit("batch size must be positive".to_string()));
        }
        Ok(())
    }

    /// Set sizes for `n` items as `(train, valid, test)`.
    ///
    /// Valid and test counts are rounded half to even; train takes the rest.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn sizes(&self, n: usize) -> (usize, usize, usize) {
        let n_valid = ((self.valid_proportion * n as f64).round_ties_even() as usize).min(n);
        let n_test = ((self.test_proportion * n as f64).round_ties_even() as usize).min(n - n_valid);
        (n - n_valid - n_test, n_valid, n_test)
    }

    /// Shuffle `items` with the configured seed and cut them into
    /// train, valid and test sets, in that order.
    pub fn split<T>(&self, mut items: Vec<T>) -> Result<Split<T>> {
        self.validate()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        items.shuffle(&mut rng);

        let (n_train, n_valid, _) = self.sizes(items.len());
        let mut rest = items.split_off(n_train);
        let test = rest.split_off(n_valid);

        tracing::info!(
            train = items.len(),
            valid = rest.len(),
            test = test.len(),
            "Split samples"
        );
        Ok(Split {
            train: items,
            valid: rest,
            test,
        })
    }

    /// Consecutive batches of `batch_size` items.
    #[must_use]
    pub fn batches<'a, T>(&self, items: &'a [T]) -> Vec<&'a [T]> {
        let size = self.batch_size.max(1);
        items
            .chunks(size)
            .filter(|chunk| !self.drop_last || chunk.len() == size)
            .collect()
    }
}
