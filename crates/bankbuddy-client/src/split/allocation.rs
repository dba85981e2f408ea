use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::money::{MONEY_SCALE, canonical};
use crate::{ClientError, ClientResult};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Person 1's share as a percentage in `[0, 100]`; person 2 gets the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRatio {
    person1_percentage: Decimal,
}

impl SplitRatio {
    pub fn new(person1_percentage: Decimal) -> ClientResult<Self> {
        if person1_percentage < Decimal::ZERO || person1_percentage > HUNDRED {
            return Err(ClientError::invalid_split_percentage(
                &person1_percentage.normalize().to_string(),
            ));
        }
        Ok(Self {
            person1_percentage,
        })
    }

    pub fn parse(raw: &str) -> ClientResult<Self> {
        let trimmed = raw.trim().trim_end_matches('%');
        let value = Decimal::from_str(trimmed)
            .map_err(|_| ClientError::invalid_split_percentage(raw))?;
        Self::new(value)
    }

    pub fn even() -> Self {
        Self {
            person1_percentage: Decimal::from(50),
        }
    }

    pub fn person1_percentage(self) -> Decimal {
        self.person1_percentage.normalize()
    }

    pub fn person2_percentage(self) -> Decimal {
        (HUNDRED - self.person1_percentage).normalize()
    }

    /// Person 1's share is rounded to cents, midpoint away from zero. Person 2
    /// takes the remainder so the two shares always add back to `amount`.
    pub fn allocate(self, amount: Decimal) -> Allocation {
        let amount = canonical(amount);
        let person1 = (amount * self.person1_percentage / HUNDRED)
            .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        let person1 = canonical(person1);
        Allocation {
            person1,
            person2: canonical(amount - person1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub person1: Decimal,
    pub person2: Decimal,
}

impl Allocation {
    pub fn total(self) -> Decimal {
        self.person1 + self.person2
    }
}

pub fn split_amount(amount: Decimal, ratio: SplitRatio) -> Allocation {
    ratio.allocate(amount)
}
