//! Blake2b Fiat-Shamir transcript.

use blake2b_simd::{Params as Blake2bParams, State};
use group::GroupEncoding;

use crate::curve::PastaCurve;
use crate::field::{self, PastaField};
use crate::poly_comm::PolyComm;

#[derive(Clone)]
pub struct Transcript {
    state: State,
}

impl Transcript {
    pub fn new(domain: &[u8]) -> Self {
        let mut state = Blake2bParams::new().hash_length(64).to_state();
        state.update(domain);
        Self { state }
    }

    pub fn absorb_bytes(&mut self, label: &[u8], bytes: &[u8]) {
        self.state
            .update(label)
            .update(&(bytes.len() as u64).to_le_bytes())
            .update(bytes);
    }

    pub fn absorb_field<F: PastaField>(&mut self, label: &[u8], value: &F) {
        self.absorb_bytes(label, &field::to_bytes(value));
    }

    pub fn absorb_fields<F: PastaField>(&mut self, label: &[u8], values: &[F]) {
        self.absorb_bytes(label, &field::vec_to_bytes(values));
    }

    pub fn absorb_point<C: PastaCurve>(&mut self, label: &[u8], point: &C::Point) {
        self.absorb_bytes(label, point.to_bytes().as_ref());
    }

    pub fn absorb_comm<C: PastaCurve>(&mut self, label: &[u8], comm: &PolyComm<C>) {
        let mut bytes = Vec::with_capacity(33 * (comm.chunks() + 1));
        for point in &comm.unshifted {
            bytes.extend_from_slice(point.to_bytes().as_ref());
        }
        match &comm.shifted {
            Some(point) => {
                bytes.push(1);
                bytes.extend_from_slice(point.to_bytes().as_ref());
            }
            None => bytes.push(0),
        }
        self.absorb_bytes(label, &bytes);
    }

    pub fn challenge_bytes(&mut self, label: &[u8]) -> [u8; 32] {
        self.state.update(label);
        let hash = self.state.finalize();
        self.state.update(hash.as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash.as_bytes()[..32]);
        out
    }

    pub fn challenge<F: PastaField>(&mut self, label: &[u8]) -> F {
        field::from_hash(self.challenge_bytes(label))
    }
}
