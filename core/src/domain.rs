//! Radix-2 evaluation domains and the polynomial helpers built on them.

use ff::Field;
use serde::{Deserialize, Serialize};

use crate::arena::NativeObject;
use crate::error::{CoreError, Result};
use crate::field::{self, serde_field, PastaField};

/// The multiplicative subgroup of order `2^log_size_of_group`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Domain<F: PastaField> {
    pub log_size_of_group: u32,
    #[serde(with = "serde_field")]
    pub group_gen: F,
}

impl<F: PastaField> Domain<F> {
    /// Domain of exactly `size` elements; `size` must be a power of two.
    pub fn new(size: usize) -> Result<Self> {
        if !size.is_power_of_two() {
            return Err(CoreError::InvalidArgument(format!(
                "domain size {size} is not a power of two"
            )));
        }
        let log_size_of_group = size.trailing_zeros();
        Ok(Self {
            log_size_of_group,
            group_gen: field::domain_generator(log_size_of_group)?,
        })
    }

    /// Smallest domain holding `rows` rows.
    pub fn for_rows(rows: usize) -> Result<Self> {
        Self::new(rows.max(1).next_power_of_two())
    }

    pub const fn size(&self) -> usize {
        1 << self.log_size_of_group
    }

    pub fn size_as_field(&self) -> F {
        F::from(self.size() as u64)
    }

    pub fn element(&self, i: usize) -> F {
        self.group_gen.pow_vartime([i as u64])
    }

    pub fn elements(&self) -> Vec<F> {
        std::iter::successors(Some(F::ONE), |w| Some(*w * self.group_gen))
            .take(self.size())
            .collect()
    }

    /// Evaluations over the domain of the polynomial with the given coefficients.
    pub fn fft(&self, coeffs: &[F]) -> Result<Vec<F>> {
        let mut values = self.padded(coeffs)?;
        radix2_fft(&mut values, self.group_gen);
        Ok(values)
    }

    /// Coefficients of the polynomial interpolating `evals` over the domain.
    pub fn ifft(&self, evals: &[F]) -> Result<Vec<F>> {
        let mut values = self.padded(evals)?;
        let inv_gen = field::inverse(&self.group_gen).unwrap_or(F::ONE);
        radix2_fft(&mut values, inv_gen);
        let n_inv = field::inverse(&self.size_as_field()).unwrap_or(F::ONE);
        values.iter_mut().for_each(|v| *v *= n_inv);
        Ok(values)
    }

    fn padded(&self, values: &[F]) -> Result<Vec<F>> {
        if values.len() > self.size() {
            return Err(CoreError::InvalidArgument(format!(
                "{} values do not fit a domain of size {}",
                values.len(),
                self.size()
            )));
        }
        let mut out = values.to_vec();
        out.resize(self.size(), F::ZERO);
        Ok(out)
    }

    /// Zₕ(x) = xⁿ − 1.
    pub fn evaluate_vanishing(&self, x: F) -> F {
        x.pow_vartime([self.size() as u64]) - F::ONE
    }

    /// Lᵢ(x) = ωⁱ (xⁿ − 1) / (n (x − ωⁱ)).
    pub fn evaluate_lagrange(&self, i: usize, x: F) -> F {
        let wi = self.element(i);
        if x == wi {
            return F::ONE;
        }
        let den = self.size_as_field() * (x - wi);
        wi * self.evaluate_vanishing(x) * field::inverse(&den).unwrap_or(F::ZERO)
    }
}

/// The three domains an index is compiled over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvaluationDomains<F: PastaField> {
    pub d1: Domain<F>,
    pub d4: Domain<F>,
    pub d8: Domain<F>,
}

impl<F: PastaField> EvaluationDomains<F> {
    pub fn create(rows: usize) -> Result<Self> {
        let d1 = Domain::for_rows(rows)?;
        Ok(Self {
            d1,
            d4: Domain::new(4 * d1.size())?,
            d8: Domain::new(8 * d1.size())?,
        })
    }
}

/// Horner evaluation.
pub fn evaluate<F: Field>(coeffs: &[F], x: F) -> F {
    coeffs.iter().rev().fold(F::ZERO, |acc, c| acc * x + c)
}

/// Evaluates each `chunk`-sized slice of `coeffs` separately, matching chunked commitments.
pub fn evaluate_chunks<F: Field>(coeffs: &[F], chunk: usize, x: F) -> Vec<F> {
    if coeffs.is_empty() || chunk == 0 {
        return vec![F::ZERO];
    }
    coeffs.chunks(chunk).map(|c| evaluate(c, x)).collect()
}

fn bitreverse(mut n: usize, bits: u32) -> usize {
    let mut r = 0;
    for _ in 0..bits {
        r = (r << 1) | (n & 1);
        n >>= 1;
    }
    r
}

fn radix2_fft<F: Field>(a: &mut [F], omega: F) {
    let n = a.len();
    let log_n = n.trailing_zeros();
    for k in 0..n {
        let rk = bitreverse(k, log_n);
        if k < rk {
            a.swap(k, rk);
        }
    }
    let mut m = 1;
    while m < n {
        let w_m = omega.pow_vartime([(n / (2 * m)) as u64]);
        for k in (0..n).step_by(2 * m) {
            let mut w = F::ONE;
            for j in 0..m {
                let t = w * a[k + j + m];
                a[k + j + m] = a[k + j] - t;
                a[k + j] += t;
                w *= w_m;
            }
        }
        m *= 2;
    }
}

impl<F: PastaField> NativeObject for Domain<F> {}

#[cfg(test)]
mod tests {
    use pasta_curves::Fp;

    use super::*;

    #[test]
    fn test_domain_sizes() {
        let domains = EvaluationDomains::<Fp>::create(5).unwrap();
        assert_eq!(domains.d1.size(), 8);
        assert_eq!(domains.d4.size(), 32);
        assert_eq!(domains.d8.size(), 64);
        assert!(Domain::<Fp>::new(6).is_err());
    }

    #[test]
    fn test_fft_matches_horner() {
        let domain = Domain::<Fp>::new(8).unwrap();
        let coeffs: Vec<Fp> = (1..=5u64).map(Fp::from).collect();
        let evals = domain.fft(&coeffs).unwrap();
        for (i, w) in domain.elements().into_iter().enumerate() {
            assert_eq!(evals[i], evaluate(&coeffs, w));
        }
        let back = domain.ifft(&evals).unwrap();
        assert_eq!(&back[..5], &coeffs[..]);
        assert!(back[5..].iter().all(|c| *c == Fp::ZERO));
    }

    #[test]
    fn test_lagrange_evaluation() {
        let domain = Domain::<Fp>::new(4).unwrap();
        let x = Fp::from(987654321);
        let mut indicator = vec![Fp::ZERO; 4];
        indicator[2] = Fp::ONE;
        let coeffs = domain.ifft(&indicator).unwrap();
        assert_eq!(domain.evaluate_lagrange(2, x), evaluate(&coeffs, x));
        assert_eq!(domain.evaluate_lagrange(2, domain.element(2)), Fp::ONE);
        assert_eq!(domain.evaluate_lagrange(1, domain.element(2)), Fp::ZERO);
    }

    #[test]
    fn test_evaluate_chunks() {
        let coeffs: Vec<Fp> = (1..=4u64).map(Fp::from).collect();
        let x = Fp::from(3);
        let chunks = evaluate_chunks(&coeffs, 2, x);
        assert_eq!(chunks.len(), 2);
        let x2 = x.square();
        assert_eq!(chunks[0] + chunks[1] * x2, evaluate(&coeffs, x));
    }
}
