use super::{price::RangeEncPrice, BIT_MODEL_TOTAL, MOVE_BITS};

const PROB_INIT: u16 = (BIT_MODEL_TOTAL / 2) as u16;

/// An adaptive estimate of the probability that the next bit is 0, scaled to 11 bits.
///
/// The update rule moves the value by 1/32nd of the remaining distance, which keeps it
/// strictly between 0 and `BIT_MODEL_TOTAL` (it settles at 31 and 2017).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEncProbability(pub u16);

impl Default for RangeEncProbability {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeEncProbability {
    pub fn new() -> Self {
        Self(PROB_INIT)
    }

    pub fn reset(&mut self) {
        self.0 = PROB_INIT;
    }

    /// A 0 was coded, so 0 becomes more likely.
    pub fn increment(&mut self) {
        let mut prob = self.0 as u32;
        prob += (BIT_MODEL_TOTAL - prob) >> MOVE_BITS;
        self.0 = prob as u16;
    }

    /// A 1 was coded, so 1 becomes more likely.
    pub fn decrement(&mut self) {
        let mut prob = self.0 as u32;
        prob -= prob >> MOVE_BITS;
        self.0 = prob as u16;
    }

    pub fn price0(self) -> RangeEncPrice {
        RangeEncPrice::get_bit_price(self, 0)
    }

    pub fn price1(self) -> RangeEncPrice {
        RangeEncPrice::get_bit_price(self, 1)
    }

    pub fn get_bit_price(self, bit: u32) -> RangeEncPrice {
        RangeEncPrice::get_bit_price(self, bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Where a probability settles after long runs of 1s or 0s.
    const PROB_MIN: u16 = 31;
    const PROB_MAX: u16 = 2017;

    #[test]
    fn test_probability_settles_inside_bounds() {
        let mut prob = RangeEncProbability::new();
        for _ in 0..1000 {
            prob.increment();
        }
        assert_eq!(prob.0, PROB_MAX);

        for _ in 0..1000 {
            prob.decrement();
        }
        assert_eq!(prob.0, PROB_MIN);

        prob.reset();
        assert_eq!(prob, RangeEncProbability::new());
    }

    #[test]
    fn test_price0_falls_as_zero_gets_likelier() {
        let mut prob = RangeEncProbability(PROB_MIN);
        let mut last = prob.price0();
        while prob.0 < PROB_MAX {
            prob.increment();
            let price = prob.price0();
            assert!(price <= last, "value {}", prob.0);
            last = price;
        }

        // Flat within a table bucket, but the whole reachable range drops from 6.4 bits to 1/16
        assert_eq!(RangeEncProbability(PROB_MIN).price0().value(), 103);
        assert_eq!(RangeEncProbability(PROB_MAX).price0().value(), 1);
        assert!(RangeEncProbability(PROB_MIN).price0() > RangeEncProbability::new().price0());
        assert!(RangeEncProbability::new().price0() > RangeEncProbability(PROB_MAX).price0());
    }

    #[test]
    fn test_prices_mirror_each_other() {
        for value in PROB_MIN..=PROB_MAX {
            let prob = RangeEncProbability(value);
            let mirrored = RangeEncProbability(BIT_MODEL_TOTAL as u16 - value);
            assert_eq!(prob.price0(), mirrored.price1(), "value {}", value);
        }
    }

    #[test]
    fn test_combined_price_is_lowest_at_an_even_split() {
        let sum = |value: u16| {
            let prob = RangeEncProbability(value);
            (prob.price0() + prob.price1()).value()
        };

        let sums = (PROB_MIN..=PROB_MAX).map(sum).collect::<Vec<_>>();
        assert_eq!(sums.iter().min(), Some(&32));
        assert_eq!(sums.iter().max(), Some(&104));

        assert_eq!(sum(PROB_INIT), 32);
        assert_eq!(sum(PROB_MIN), 104);
        assert_eq!(sum(PROB_MAX), 104);

        // Outside the reachable range the table still tops out at 8 + 1/16 bits
        let all = (1..BIT_MODEL_TOTAL as u16).map(sum).collect::<Vec<_>>();
        assert_eq!(all.iter().max(), Some(&129));
    }

    proptest! {
        #[test]
        fn test_probability_stays_in_range(bits in prop::collection::vec(any::<bool>(), 0..4000)) {
            let mut prob = RangeEncProbability::new();
            for bit in bits {
                if bit {
                    prob.decrement();
                } else {
                    prob.increment();
                }
                prop_assert!(prob.0 > 0 && (prob.0 as u32) < BIT_MODEL_TOTAL);
            }
        }
    }
}
