use crate::float::Float;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// A complex number over the engine's chosen [`Float`] type.
///
/// `Copy`, operator-overloaded, and kept dependency-free (no `num::Complex`)
/// so the hot iteration loop stays in full control of its arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: Float,
    pub im: Float,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };
    pub const ONE: Self = Self { re: 1.0, im: 0.0 };

    #[inline]
    pub fn new(re: Float, im: Float) -> Self {
        Self { re, im }
    }

    #[inline]
    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    /// Returns `re² + im²` without taking the square root.
    #[inline]
    pub fn norm2(self) -> Float {
        self.re * self.re + self.im * self.im
    }

    /// Returns `√(re² + im²)`.
    #[inline]
    pub fn norm(self) -> Float {
        self.norm2().sqrt()
    }

    #[inline]
    pub fn arg(self) -> Float {
        self.im.atan2(self.re)
    }

    #[inline]
    pub fn square(self) -> Self {
        Self::new(
            self.re * self.re - self.im * self.im,
            2.0 * self.re * self.im,
        )
    }

    /// Integer power via binary exponentiation. `n == 0` yields `1`.
    pub fn ipow(self, n: u32) -> Self {
        if n == 0 {
            return Self::ONE;
        }
        let mut base = self;
        let mut exp = n;
        let mut acc = Self::ONE;
        while exp > 1 {
            if exp & 1 == 1 {
                acc *= base;
            }
            base = base * base;
            exp >>= 1;
        }
        acc * base
    }

    /// Natural logarithm, principal branch.
    #[inline]
    pub fn ln(self) -> Self {
        Self::new(self.norm().ln(), self.arg())
    }

    /// `e^self`.
    #[inline]
    pub fn exp(self) -> Self {
        let r = self.re.exp();
        Self::new(r * self.im.cos(), r * self.im.sin())
    }

    /// Real exponent power via the polar form `|z|^p · e^(i·p·arg(z))`.
    /// Not defined at `z == 0` for non-positive `p` (mirrors `0f64.powf`).
    pub fn powf(self, p: Float) -> Self {
        if self.re == 0.0 && self.im == 0.0 {
            return Self::ZERO;
        }
        let r = self.norm().powf(p);
        let theta = self.arg() * p;
        Self::new(r * theta.cos(), r * theta.sin())
    }

    /// General complex power `self^rhs = exp(rhs · ln(self))`.
    #[inline]
    pub fn powc(self, rhs: Self) -> Self {
        (rhs * self.ln()).exp()
    }

    /// True when `im == 0` and `re` has no fractional part.
    #[inline]
    pub fn is_integer(self) -> bool {
        self.im == 0.0 && self.re.fract() == 0.0
    }
}

impl Add for Complex {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl AddAssign for Complex {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl Sub for Complex {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl SubAssign for Complex {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.re -= rhs.re;
        self.im -= rhs.im;
    }
}

impl Mul for Complex {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl MulAssign for Complex {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Float> for Complex {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Float) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

impl Div for Complex {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let d = rhs.norm2();
        Self::new(
            (self.re * rhs.re + self.im * rhs.im) / d,
            (self.im * rhs.re - self.re * rhs.im) / d,
        )
    }
}

impl Neg for Complex {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{} + {}i", self.re, self.im)
        } else {
            write!(f, "{} - {}i", self.re, -self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: Float = 1e-9;

    fn approx_eq(a: Float, b: Float) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn addition_and_subtraction() {
        let a = Complex::new(1.0, 2.0);
        let b = Complex::new(3.0, 4.0);
        assert!(approx_eq((a + b).re, 4.0));
        assert!(approx_eq((a - b).im, -2.0));
    }

    #[test]
    fn multiplication_matches_square() {
        let z = Complex::new(1.0, 1.0);
        let by_mul = z * z;
        let by_square = z.square();
        assert!(approx_eq(by_mul.re, by_square.re));
        assert!(approx_eq(by_mul.im, by_square.im));
    }

    #[test]
    fn ipow_matches_repeated_mul() {
        let z = Complex::new(0.3, -0.7);
        let mut acc = Complex::ONE;
        for _ in 0..5 {
            acc *= z;
        }
        let p = z.ipow(5);
        assert!(approx_eq(p.re, acc.re));
        assert!(approx_eq(p.im, acc.im));
    }

    #[test]
    fn ipow_zero_is_one() {
        let z = Complex::new(5.0, -3.0);
        assert_eq!(z.ipow(0), Complex::ONE);
    }

    #[test]
    fn powf_matches_ipow_for_integer_exponent() {
        let z = Complex::new(1.2, 0.5);
        let by_ipow = z.ipow(4);
        let by_powf = z.powf(4.0);
        assert!((by_ipow.re - by_powf.re).abs() < 1e-6);
        assert!((by_ipow.im - by_powf.im).abs() < 1e-6);
    }

    #[test]
    fn is_integer_predicate() {
        assert!(Complex::new(3.0, 0.0).is_integer());
        assert!(!Complex::new(3.5, 0.0).is_integer());
        assert!(!Complex::new(3.0, 0.1).is_integer());
    }

    #[test]
    fn division_round_trip() {
        let a = Complex::new(4.0, -2.0);
        let b = Complex::new(1.0, 3.0);
        let c = (a / b) * b;
        assert!(approx_eq(c.re, a.re));
        assert!(approx_eq(c.im, a.im));
    }

    #[test]
    fn ln_exp_round_trip() {
        let z = Complex::new(0.4, 0.9);
        let back = z.ln().exp();
        assert!(approx_eq(back.re, z.re));
        assert!(approx_eq(back.im, z.im));
    }
}
