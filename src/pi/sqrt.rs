use num_bigint::BigInt;
use num_traits::{One, Pow, Signed, Zero};

use crate::errors::PiError;

/// `floor(sqrt(n) * 10^precision)`, computed on integers only.
pub fn scaled_sqrt(n: &BigInt, precision: u32) -> Result<BigInt, PiError> {
    if n.is_negative() {
        return Err(PiError::DegenerateInput(format!(
            "square root of negative value {}",
            n
        )));
    }
    let scaled_n = n * Pow::pow(BigInt::from(10u32), 2 * precision);
    Ok(integer_sqrt(&scaled_n))
}

/// Integer sqrt via Newton's method, starting from `n / 2`.
///
/// Floor division can bounce between `r` and `r + 1` when `n + 1` is a perfect
/// square, so the loop stops on the first step that does not decrease.
pub fn integer_sqrt(n: &BigInt) -> BigInt {
    if n.is_zero() {
        return BigInt::zero();
    }
    let two = BigInt::from(2u8);
    let mut x: BigInt = n / &two;
    if x.is_zero() {
        x = BigInt::one();
    }
    loop {
        let y = (&x + n / &x) / &two;
        if y >= x {
            return x;
        }
        x = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_floor_root(n: &BigInt, p: u32) {
        let r = scaled_sqrt(n, p).unwrap();
        let scaled = n * Pow::pow(BigInt::from(10u32), 2 * p);
        let next = &r + 1u32;
        assert!(&r * &r <= scaled, "r^2 > n for n={} p={}", n, p);
        assert!(&next * &next > scaled, "(r+1)^2 <= n for n={} p={}", n, p);
    }

    #[test]
    fn test_bounds_grid() {
        let big = Pow::pow(BigInt::from(10u32), 30u32) + 7u32;
        let values = [BigInt::zero(), BigInt::one(), BigInt::from(2u32), BigInt::from(640_320u32), big];
        for n in &values {
            for p in [0u32, 5, 50] {
                assert_floor_root(n, p);
            }
        }
    }

    #[test]
    fn test_oscillating_inputs_terminate() {
        // n + 1 a perfect square
        for n in [3u32, 8, 15, 99, 9_999] {
            assert_floor_root(&BigInt::from(n), 0);
        }
    }

    #[test]
    fn test_zero() {
        assert_eq!(scaled_sqrt(&BigInt::zero(), 50).unwrap(), BigInt::zero());
    }

    #[test]
    fn test_sqrt_two_digits() {
        let r = scaled_sqrt(&BigInt::from(2u32), 10).unwrap();
        assert_eq!(r, BigInt::from(14_142_135_623u64));
    }

    #[test]
    fn test_sqrt_640320_prefix() {
        let r = scaled_sqrt(&BigInt::from(640_320u32), 12).unwrap();
        assert!(r.to_string().starts_with("800199975"), "Got {}", r);
    }

    #[test]
    fn test_negative_rejected() {
        let err = scaled_sqrt(&BigInt::from(-4), 2).unwrap_err();
        assert!(matches!(err, PiError::DegenerateInput(_)));
    }
}
