use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::DeliveryStatus;

/// Fixed outcome distribution, walked in this order.
pub const DELIVERY_WEIGHTS: [(DeliveryStatus, f64); 4] = [
    (DeliveryStatus::Sent, 0.05),
    (DeliveryStatus::Delivered, 0.15),
    (DeliveryStatus::Read, 0.75),
    (DeliveryStatus::Failed, 0.05),
];

/// Upper bound (exclusive) of the simulated read delay.
pub const MAX_READ_DELAY_MS: i64 = 3_600_000;

/// Picks an outcome by walking cumulative weights in declaration order.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    entries: Vec<(T, f64)>,
    fallback: T,
}

impl<T: Copy> WeightedChoice<T> {
    /// `fallback` is returned when `r` lies above the summed weights, which
    /// can only happen through floating point rounding.
    pub fn new(entries: &[(T, f64)], fallback: T) -> Self {
        Self {
            entries: entries.to_vec(),
            fallback,
        }
    }

    /// First entry whose cumulative weight is `>= r`.
    pub fn pick(&self, r: f64) -> T {
        let mut cumulative = 0.0;
        for (value, weight) in &self.entries {
            cumulative += weight;
            if r <= cumulative {
                return *value;
            }
        }
        self.fallback
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.pick(rng.gen::<f64>())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedDelivery {
    pub status: DeliveryStatus,
    pub read_at: Option<i64>,
}

/// Produces fictitious delivery outcomes. Inject a seeded RNG to make the
/// result reproducible.
pub struct DeliverySimulator<R = StdRng> {
    rng: R,
    choice: WeightedChoice<DeliveryStatus>,
}

impl DeliverySimulator<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for DeliverySimulator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DeliverySimulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            choice: WeightedChoice::new(&DELIVERY_WEIGHTS, DeliveryStatus::Read),
        }
    }

    /// One independent outcome per recipient. Only `read` outcomes carry a
    /// timestamp, drawn uniformly from `[now, now + 1h)`.
    pub fn simulate(&mut self, recipient_count: usize, now: i64) -> Vec<SimulatedDelivery> {
        (0..recipient_count).map(|_| self.simulate_one(now)).collect()
    }

    pub fn simulate_one(&mut self, now: i64) -> SimulatedDelivery {
        let status = self.choice.sample(&mut self.rng);
        let read_at = match status {
            DeliveryStatus::Read => Some(now + self.rng.gen_range(0..MAX_READ_DELAY_MS)),
            _ => None,
        };
        SimulatedDelivery { status, read_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn delivery_choice() -> WeightedChoice<DeliveryStatus> {
        WeightedChoice::new(&DELIVERY_WEIGHTS, DeliveryStatus::Read)
    }

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = DELIVERY_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pick_walks_cumulative_weights_low_to_high() {
        let choice = delivery_choice();
        assert_eq!(choice.pick(0.0), DeliveryStatus::Sent);
        assert_eq!(choice.pick(0.05), DeliveryStatus::Sent);
        assert_eq!(choice.pick(0.06), DeliveryStatus::Delivered);
        assert_eq!(choice.pick(0.19), DeliveryStatus::Delivered);
        assert_eq!(choice.pick(0.21), DeliveryStatus::Read);
        assert_eq!(choice.pick(0.94), DeliveryStatus::Read);
        assert_eq!(choice.pick(0.96), DeliveryStatus::Failed);
        assert_eq!(choice.pick(0.9999), DeliveryStatus::Failed);
    }

    #[test]
    fn pick_above_total_uses_fallback() {
        assert_eq!(delivery_choice().pick(1.5), DeliveryStatus::Read);
    }

    #[test]
    fn seeded_simulators_agree() {
        let a = DeliverySimulator::seeded(7).simulate(50, 1_000);
        let b = DeliverySimulator::seeded(7).simulate(50, 1_000);
        assert_eq!(a, b);
    }

    #[test]
    fn read_at_only_for_read_and_within_an_hour() {
        let now = 1_700_000_000_000;
        let outcomes = DeliverySimulator::seeded(42).simulate(2_000, now);
        assert_eq!(outcomes.len(), 2_000);
        for outcome in outcomes {
            match outcome.status {
                DeliveryStatus::Read => {
                    let read_at = outcome.read_at.expect("read has timestamp");
                    assert!(read_at >= now && read_at < now + MAX_READ_DELAY_MS);
                }
                _ => assert!(outcome.read_at.is_none()),
            }
        }
    }

    #[test]
    fn proportions_converge_to_weights() {
        let draws = 100_000;
        let outcomes = DeliverySimulator::seeded(2024).simulate(draws, 0);
        let mut counts: HashMap<DeliveryStatus, usize> = HashMap::new();
        for outcome in outcomes {
            *counts.entry(outcome.status).or_default() += 1;
        }
        for (status, weight) in DELIVERY_WEIGHTS {
            let share = *counts.get(&status).unwrap_or(&0) as f64 / draws as f64;
            assert!(
                (share - weight).abs() < 0.01,
                "{} share {} too far from {}",
                status,
                share,
                weight
            );
        }
    }

    #[test]
    fn zero_recipients_yield_nothing() {
        assert!(DeliverySimulator::seeded(1).simulate(0, 0).is_empty());
    }
}
