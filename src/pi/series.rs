use std::fmt::{self, Display, Formatter};

use num_bigint::BigInt;
use num_traits::{One, Pow};

use crate::errors::PiError;
use crate::pi::rational::Rational;

/// Constant term of the linear factor `545140134k + 13591409`.
pub const LINEAR_BASE: u64 = 13_591_409;
/// Per-term step of the linear factor.
pub const LINEAR_STEP: u64 = 545_140_134;
pub const C_ROOT: u64 = 640_320;
/// `640320^3`
pub const C_CUBED: u64 = 262_537_412_640_768_000;

/// Inclusive slice `[start, end]` of the series index space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermRange {
    start: u64,
    end: u64,
}

impl TermRange {
    pub fn new(start: u64, end: u64) -> Result<Self, PiError> {
        if end < start {
            return Err(PiError::DegenerateInput(format!(
                "term range [{}, {}] is empty",
                start, end
            )));
        }
        Ok(TermRange { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl Display for TermRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Factorial-family quantities of term `k`, advanced one index at a time.
struct RecurrenceState {
    k: u64,
    factorial_6k: BigInt,
    factorial_3k: BigInt,
    factorial_k_cubed: BigInt,
    c_power: BigInt,
    linear_term: BigInt,
}

impl RecurrenceState {
    fn at(k: u64) -> Self {
        if k == 0 {
            return RecurrenceState {
                k,
                factorial_6k: BigInt::one(),
                factorial_3k: BigInt::one(),
                factorial_k_cubed: BigInt::one(),
                c_power: BigInt::one(),
                linear_term: BigInt::from(LINEAR_BASE),
            };
        }
        RecurrenceState {
            k,
            factorial_6k: factorial(6 * k),
            factorial_3k: factorial(3 * k),
            factorial_k_cubed: factorial(k).pow(3u32),
            c_power: Pow::pow(BigInt::from(C_CUBED), k),
            linear_term: BigInt::from(LINEAR_STEP) * k + LINEAR_BASE,
        }
    }

    fn advance(&mut self, c: &BigInt) {
        self.k += 1;
        let k = self.k;
        for i in (6 * k - 5)..=(6 * k) {
            self.factorial_6k *= i;
        }
        for i in (3 * k - 2)..=(3 * k) {
            self.factorial_3k *= i;
        }
        self.factorial_k_cubed *= BigInt::from(k).pow(3u32);
        self.c_power *= c;
        self.linear_term += LINEAR_STEP;
    }

    /// Signed numerator and positive denominator of the current term.
    fn term(&self) -> (BigInt, BigInt) {
        let magnitude = &self.factorial_6k * &self.linear_term;
        let numer = if self.k % 2 == 0 { magnitude } else { -magnitude };
        let denom = &self.factorial_3k * &self.factorial_k_cubed * &self.c_power;
        (numer, denom)
    }
}

/// Exact sum of the Chudnovsky terms over `range`.
///
/// Full factorials are only computed for `range.start()`; every later term is
/// derived from its predecessor.
pub fn accumulate(range: TermRange) -> Result<Rational, PiError> {
    let c = BigInt::from(C_CUBED);
    let mut state = RecurrenceState::at(range.start());
    let mut total = Rational::zero();

    loop {
        let (numer, denom) = state.term();
        total.add_fraction(&numer, &denom);
        if state.k == range.end() {
            break;
        }
        state.advance(&c);
    }

    Ok(total)
}

/// Convenience wrapper validating `start..=end` first.
pub fn sum_terms(start: u64, end: u64) -> Result<Rational, PiError> {
    accumulate(TermRange::new(start, end)?)
}

/// Term `k` evaluated directly from its closed form, without any recurrence.
pub fn term_from_scratch(k: u64) -> Result<Rational, PiError> {
    let magnitude = factorial(6 * k) * (BigInt::from(LINEAR_STEP) * k + LINEAR_BASE);
    let numer = if k % 2 == 0 { magnitude } else { -magnitude };
    let denom = factorial(3 * k)
        * factorial(k).pow(3u32)
        * Pow::pow(BigInt::from(C_CUBED), k);
    Rational::new(numer, denom)
}

/// Reference evaluation of a range, one independent term at a time.
pub fn sum_from_scratch(range: TermRange) -> Result<Rational, PiError> {
    let mut total = Rational::zero();
    for k in range.start()..=range.end() {
        total.merge(&term_from_scratch(k)?);
    }
    Ok(total)
}

/// Compute n! safely.
pub fn factorial(n: u64) -> BigInt {
    let mut result = BigInt::one();
    for i in 2..=n {
        result *= i;
    }
    result
}
