//! Per-iteration request mix.

use rand::Rng;
use rand_distr::weighted::WeightedIndex;
use rand_distr::Distribution;

use crate::config::{weight_sum, MixConfig};
use crate::error::ConfigError;
use crate::statistics::ActionKind;

/// Picks what a worker does on each iteration.
#[derive(Debug, Clone)]
pub enum ActionPolicy {
    /// Exactly one of submit, rank or top, by relative weight.
    Weighted(WeightedIndex<u32>),
    /// Submit and rank every iteration, plus top with the given probability.
    Layered { top_chance: f64 },
}

impl ActionPolicy {
    pub fn new(mix: MixConfig) -> Result<Self, ConfigError> {
        match mix {
            MixConfig::Weighted { submit, rank, top } => {
                if weight_sum(submit, rank, top).is_none() {
                    return Err(ConfigError::WeightOverflow);
                }
                WeightedIndex::new([submit, rank, top])
                    .map(ActionPolicy::Weighted)
                    .map_err(|_| ConfigError::ZeroWeights)
            }
            MixConfig::Layered { top_chance } => {
                if !(0.0..=1.0).contains(&top_chance) {
                    return Err(ConfigError::TopChance(top_chance));
                }
                Ok(ActionPolicy::Layered { top_chance })
            }
        }
    }

    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R) -> ActionPlan {
        match self {
            ActionPolicy::Weighted(weights) => {
                ActionPlan::Single(ActionKind::ALL[weights.sample(rng)])
            }
            ActionPolicy::Layered { top_chance } => ActionPlan::Layered {
                top: rng.random_bool(*top_chance),
            },
        }
    }
}

/// Actions for one iteration, issued in order against the same user id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActionPlan {
    Single(ActionKind),
    Layered { top: bool },
}

impl ActionPlan {
    pub fn actions(self) -> impl Iterator<Item = ActionKind> {
        let actions = match self {
            ActionPlan::Single(kind) => [Some(kind), None, None],
            ActionPlan::Layered { top } => [
                Some(ActionKind::Submit),
                Some(ActionKind::Rank),
                top.then_some(ActionKind::Top),
            ],
        };
        actions.into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const SAMPLES: usize = 100_000;

    fn frequencies(policy: &ActionPolicy, seed: u64) -> [f64; 3] {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut counts = [0usize; 3];
        for _ in 0..SAMPLES {
            for kind in policy.plan(&mut rng).actions() {
                counts[kind.index()] += 1;
            }
        }
        counts.map(|c| c as f64 / SAMPLES as f64)
    }

    #[test]
    fn weighted_frequencies_converge() {
        for (weights, seed) in [([20, 0, 80], 1), ([1, 1, 1], 2), ([5, 3, 2], 3), ([0, 7, 3], 4)] {
            let [submit, rank, top] = weights;
            let policy = ActionPolicy::new(MixConfig::Weighted { submit, rank, top }).unwrap();
            let observed = frequencies(&policy, seed);
            let sum: u32 = weights.iter().sum();
            for (kind, weight) in ActionKind::ALL.iter().zip(weights) {
                let expected = f64::from(weight) / f64::from(sum);
                let actual = observed[kind.index()];
                assert!(
                    (actual - expected).abs() < 0.01,
                    "{kind}: expected {expected:.3}, observed {actual:.3} for {weights:?}"
                );
            }
        }
    }

    #[test]
    fn zero_weight_is_never_chosen() {
        let policy = ActionPolicy::new(MixConfig::Weighted {
            submit: 0,
            rank: 1,
            top: 1,
        })
        .unwrap();
        let observed = frequencies(&policy, 9);
        assert_eq!(observed[ActionKind::Submit.index()], 0.0);
    }

    #[test]
    fn layered_always_submits_then_ranks() {
        let policy = ActionPolicy::new(MixConfig::Layered { top_chance: 0.1 }).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..1_000 {
            let actions: Vec<_> = policy.plan(&mut rng).actions().collect();
            assert_eq!(&actions[..2], &[ActionKind::Submit, ActionKind::Rank]);
            assert!(actions.len() == 2 || actions[2] == ActionKind::Top);
        }
        let observed = frequencies(&policy, 6);
        assert!((observed[ActionKind::Top.index()] - 0.1).abs() < 0.01);
    }

    #[test]
    fn rejects_degenerate_mixes() {
        assert_eq!(
            ActionPolicy::new(MixConfig::Weighted {
                submit: 0,
                rank: 0,
                top: 0
            })
            .unwrap_err(),
            ConfigError::ZeroWeights
        );
        assert_eq!(
            ActionPolicy::new(MixConfig::Weighted {
                submit: u32::MAX,
                rank: 1,
                top: 0
            })
            .unwrap_err(),
            ConfigError::WeightOverflow
        );
        assert_eq!(
            ActionPolicy::new(MixConfig::Layered { top_chance: -0.5 }).unwrap_err(),
            ConfigError::TopChance(-0.5)
        );
    }
}
