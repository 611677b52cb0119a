use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::errors::PiError;

/// Extra quotient digits produced beyond the requested count.
pub const GUARD_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub integer_part: BigInt,
    /// Digits after the decimal point, at least `requested + 1` long.
    pub digits: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rounded {
    pub digits: String,
    /// Set when the increment carried past the first digit; the integer part
    /// must absorb it.
    pub carry_out: bool,
}

/// Decimal expansion of `numer / denom` by schoolbook long division.
pub fn long_divide(numer: &BigInt, denom: &BigInt, digits: usize) -> Result<Expansion, PiError> {
    if denom.is_zero() {
        return Err(PiError::DegenerateInput("division by zero".into()));
    }
    let (numer, denom) = if denom.is_negative() {
        (-numer, -denom)
    } else {
        (numer.clone(), denom.clone())
    };

    let (integer_part, mut remainder) = numer.div_mod_floor(&denom);
    let mut out = String::with_capacity(digits + GUARD_DIGITS);

    for _ in 0..digits + GUARD_DIGITS {
        if remainder.is_zero() {
            break;
        }
        remainder *= 10u32;
        let (digit, rest) = remainder.div_rem(&denom);
        let d = digit
            .to_u8()
            .filter(|d| *d < 10)
            .ok_or_else(|| PiError::Internal(format!("long division produced digit {}", digit)))?;
        out.push(char::from(b'0' + d));
        remainder = rest;
    }

    while out.len() < digits + 1 {
        out.push('0');
    }

    Ok(Expansion { integer_part, digits: out })
}

/// Keeps the first `keep` digits, rounding half up on digit `keep + 1`.
pub fn round_half_up(digits: &str, keep: usize) -> Result<Rounded, PiError> {
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(PiError::DegenerateInput(format!(
            "non-decimal character '{}' in digit string",
            bad
        )));
    }

    let bytes = digits.as_bytes();
    let mut kept: Vec<u8> = bytes.iter().take(keep).copied().collect();
    kept.resize(keep, b'0');
    let round_digit = bytes.get(keep).copied().unwrap_or(b'0');

    let mut carry_out = false;
    if round_digit >= b'5' {
        carry_out = true;
        for b in kept.iter_mut().rev() {
            if *b == b'9' {
                *b = b'0';
            } else {
                *b += 1;
                carry_out = false;
                break;
            }
        }
    }

    let digits = String::from_utf8(kept).map_err(|e| PiError::Internal(e.to_string()))?;
    Ok(Rounded { digits, carry_out })
}
