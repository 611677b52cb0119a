use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::errors::PiError;

/// Exact fraction with a strictly positive denominator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rational {
    numer: BigInt,
    denom: BigInt,
}

impl Rational {
    pub fn zero() -> Self {
        Rational { numer: BigInt::zero(), denom: BigInt::one() }
    }

    /// Builds `numer / denom`, moving a negative sign onto the numerator and reducing.
    pub fn new(numer: BigInt, denom: BigInt) -> Result<Self, PiError> {
        if denom.is_zero() {
            return Err(PiError::DegenerateInput("rational with zero denominator".into()));
        }
        let (numer, denom) = if denom.is_negative() { (-numer, -denom) } else { (numer, denom) };
        let mut r = Rational { numer, denom };
        r.reduce();
        Ok(r)
    }

    pub fn numer(&self) -> &BigInt {
        &self.numer
    }

    pub fn denom(&self) -> &BigInt {
        &self.denom
    }

    pub fn into_parts(self) -> (BigInt, BigInt) {
        (self.numer, self.denom)
    }

    /// `self += numer / denom` via `(a*d + b*c) / (b*d)`, then gcd reduction.
    /// `denom` must be positive.
    pub fn add_fraction(&mut self, numer: &BigInt, denom: &BigInt) {
        if numer.is_zero() {
            return;
        }
        let new_numer = &self.numer * denom + numer * &self.denom;
        let new_denom = &self.denom * denom;
        self.numer = new_numer;
        self.denom = new_denom;
        self.reduce();
    }

    pub fn merge(&mut self, other: &Rational) {
        self.add_fraction(&other.numer, &other.denom);
    }

    pub fn is_lowest_terms(&self) -> bool {
        self.numer.gcd(&self.denom).is_one()
    }

    fn reduce(&mut self) {
        // gcd(0, d) = d, so zero collapses to 0/1
        let g = self.numer.gcd(&self.denom);
        if g > BigInt::one() {
            self.numer /= &g;
            self.denom /= &g;
        }
    }
}
