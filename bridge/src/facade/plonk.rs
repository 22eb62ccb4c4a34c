//! Circuits, indices, proofs and oracles for one field/curve pair.

use std::marker::PhantomData;
use std::path::Path;

use plonk_core::circuit::{Col, Gate, GateType, GateVector, Wire, Wires};
use plonk_core::curve::{Affine, PastaCurve};
use plonk_core::field as fe;
use plonk_core::index::ProverIndex;
use plonk_core::oracles::Oracles;
use plonk_core::persist::encode_append;
use plonk_core::poly_comm::PolyComm;
use plonk_core::proof::ProverProof;
use plonk_core::urs::Urs;
use plonk_core::vec_vec::{VecVecField, VecVecPolyComm};
use plonk_core::verifier_index::{VerificationShifts, VerifierIndex};
use plonk_core::{Export, Instance, NativeObject, RawHandle, Slice};
use tracing::instrument;

use crate::context::Bridge;
use crate::error::{BridgeError, Result};
use crate::native::{into_raw_all, raw_all, Native};

/// Operations over circuits in `C::Scalar` committed with the curve `C`.
#[derive(Clone, Copy, Debug)]
pub struct PlonkOps<'a, C> {
    pub(crate) bridge: &'a Bridge,
    _curve: PhantomData<C>,
}

/// `(is_some, offset)` as the core expects it.
pub(crate) fn encode_offset(offset: Option<u32>) -> (u32, u32) {
    offset.map_or((0, 0), |o| (1, o))
}

impl Bridge {
    pub(crate) fn pass_path(&self, path: &Path) -> Result<Slice> {
        let path = path
            .to_str()
            .ok_or_else(|| BridgeError::Decode(format!("path {} is not UTF-8", path.display())))?;
        self.pass_str(path)
    }
}

impl<'a, C: PastaCurve> PlonkOps<'a, C> {
    pub(crate) fn new(bridge: &'a Bridge) -> Self {
        Self {
            bridge,
            _curve: PhantomData,
        }
    }

    pub(crate) fn wrap<T: NativeObject>(
        &self,
        f: impl FnOnce(&Instance) -> Export<RawHandle>,
    ) -> Result<Native<T>> {
        let handle = self.bridge.call(f)?;
        Ok(Native::wrap(self.bridge, handle))
    }

    pub(crate) fn pass_fields(&self, values: &[C::Scalar]) -> Result<Slice> {
        self.bridge.pass_bytes(&fe::vec_to_bytes(values))
    }

    pub fn wire(&self, row: u32, col: Col) -> Result<Native<Wire>> {
        Native::new(self.bridge, &Wire::new(row, col))
    }

    pub fn wires(&self, wires: &Wires) -> Result<Native<Wires>> {
        Native::new(self.bridge, wires)
    }

    pub fn gate(&self, typ: GateType, wires: Wires, c: Vec<C::Scalar>) -> Result<Native<Gate<C::Scalar>>> {
        Native::new(self.bridge, &Gate::new(typ, wires, c))
    }

    pub fn gate_vector(&self) -> Result<Native<GateVector<C::Scalar>>> {
        self.wrap(|core| core.gate_vector_create::<C::Scalar>())
    }

    /// Appends `gate`, which moves into the vector.
    pub fn gate_vector_add(
        &self,
        vector: &Native<GateVector<C::Scalar>>,
        gate: Native<Gate<C::Scalar>>,
    ) -> Result<()> {
        let vector = vector.raw()?;
        let gate = gate.into_raw()?;
        self.bridge.call(|core| core.gate_vector_add::<C::Scalar>(vector, gate))
    }

    /// Copy of row `i`.
    pub fn gate_vector_get(
        &self,
        vector: &Native<GateVector<C::Scalar>>,
        i: i32,
    ) -> Result<Native<Gate<C::Scalar>>> {
        let vector = vector.raw()?;
        self.wrap(|core| core.gate_vector_get::<C::Scalar>(vector, i))
    }

    /// Points the `target` cell at `head`. Both wires move into the call, and
    /// the vector accepts no more gates afterwards.
    pub fn gate_vector_wrap(
        &self,
        vector: &Native<GateVector<C::Scalar>>,
        target: Native<Wire>,
        head: Native<Wire>,
    ) -> Result<()> {
        let vector = vector.raw()?;
        if !target.is_live() || !head.is_live() {
            return Err(BridgeError::UseAfterTransfer { kind: "Wire".into() });
        }
        let (target, head) = (target.into_raw()?, head.into_raw()?);
        self.bridge
            .call(|core| core.gate_vector_wrap::<C::Scalar>(vector, target, head))
    }

    pub fn gate_vector_len(&self, vector: &Native<GateVector<C::Scalar>>) -> Result<u32> {
        let vector = vector.raw()?;
        self.bridge.call(|core| core.gate_vector_len::<C::Scalar>(vector))
    }

    /// Compiles `gates` against `urs`; both remain usable.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME, public = public))]
    pub fn index_create(
        &self,
        gates: &Native<GateVector<C::Scalar>>,
        public: i32,
        urs: &Native<Urs<C>>,
    ) -> Result<Native<ProverIndex<C>>> {
        let (gates, urs) = (gates.raw()?, urs.raw()?);
        self.wrap(|core| core.index_create::<C>(gates, public, urs))
    }

    pub fn index_max_degree(&self, index: &Native<ProverIndex<C>>) -> Result<i32> {
        let index = index.raw()?;
        self.bridge.call(|core| core.index_max_degree::<C>(index))
    }

    pub fn index_public_inputs(&self, index: &Native<ProverIndex<C>>) -> Result<i32> {
        let index = index.raw()?;
        self.bridge.call(|core| core.index_public_inputs::<C>(index))
    }

    pub fn index_domain_d1_size(&self, index: &Native<ProverIndex<C>>) -> Result<i32> {
        let index = index.raw()?;
        self.bridge.call(|core| core.index_domain_d1_size::<C>(index))
    }

    pub fn index_domain_d4_size(&self, index: &Native<ProverIndex<C>>) -> Result<i32> {
        let index = index.raw()?;
        self.bridge.call(|core| core.index_domain_d4_size::<C>(index))
    }

    pub fn index_domain_d8_size(&self, index: &Native<ProverIndex<C>>) -> Result<i32> {
        let index = index.raw()?;
        self.bridge.call(|core| core.index_domain_d8_size::<C>(index))
    }

    /// Reads an index at `offset` (the start of the file when `None`).
    pub fn index_read(
        &self,
        offset: Option<u32>,
        urs: &Native<Urs<C>>,
        path: &Path,
    ) -> Result<Native<ProverIndex<C>>> {
        let urs = urs.raw()?;
        let (is_some, offset) = encode_offset(offset);
        let path = self.bridge.pass_path(path)?;
        self.wrap(|core| core.index_read::<C>(is_some, offset, urs, path))
    }

    /// Writes `index` to `path`, appending unless `append` is `Some(false)`.
    pub fn index_write(&self, append: Option<bool>, index: &Native<ProverIndex<C>>, path: &Path) -> Result<()> {
        let index = index.raw()?;
        let path = self.bridge.pass_path(path)?;
        self.bridge
            .call(|core| core.index_write::<C>(encode_append(append), index, path))
    }

    /// Derives the verifier index; `index` moves into the call.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME))]
    pub fn verifier_index_create(&self, index: Native<ProverIndex<C>>) -> Result<Native<VerifierIndex<C>>> {
        let index = index.into_raw()?;
        self.wrap(|core| core.verifier_index_create::<C>(index))
    }

    pub fn verifier_index_read(
        &self,
        offset: Option<u32>,
        urs: &Native<Urs<C>>,
        path: &Path,
    ) -> Result<Native<VerifierIndex<C>>> {
        let urs = urs.raw()?;
        let (is_some, offset) = encode_offset(offset);
        let path = self.bridge.pass_path(path)?;
        self.wrap(|core| core.verifier_index_read::<C>(is_some, offset, urs, path))
    }

    pub fn verifier_index_write(
        &self,
        append: Option<bool>,
        index: &Native<VerifierIndex<C>>,
        path: &Path,
    ) -> Result<()> {
        let index = index.raw()?;
        let path = self.bridge.pass_path(path)?;
        self.bridge
            .call(|core| core.verifier_index_write::<C>(encode_append(append), index, path))
    }

    /// Permutation shifts for a domain of size `2^log2`.
    pub fn verifier_index_shifts(&self, log2: i32) -> Result<Native<VerificationShifts<C::Scalar>>> {
        self.wrap(|core| core.verifier_index_shifts::<C>(log2))
    }

    pub fn verifier_index_dummy(&self) -> Result<Native<VerifierIndex<C>>> {
        self.wrap(|core| core.verifier_index_dummy::<C>())
    }

    /// Proves `primary ++ auxiliary`; the index moves into the call.
    /// `prev_challenges` holds the scalars of every previous proof back to
    /// back; `prev_sgs` move into the call too.
    #[instrument(
        level = "debug",
        skip_all,
        fields(curve = C::NAME, public = primary.len(), auxiliary = auxiliary.len())
    )]
    pub fn proof_create(
        &self,
        index: Native<ProverIndex<C>>,
        primary: &[C::Scalar],
        auxiliary: &[C::Scalar],
        prev_challenges: &[C::Scalar],
        prev_sgs: Vec<Native<Affine<C>>>,
    ) -> Result<Native<ProverProof<C>>> {
        index.raw()?;
        let sgs = raw_all(&prev_sgs)?;
        let primary = self.pass_fields(primary)?;
        let auxiliary = self.pass_fields(auxiliary)?;
        let prev_challenges = self.pass_fields(prev_challenges)?;
        let sgs = self.bridge.pass_handles(&sgs)?;
        into_raw_all(prev_sgs)?;
        let index = index.into_raw()?;
        self.wrap(|core| core.proof_create::<C>(index, primary, auxiliary, prev_challenges, sgs))
    }

    /// Verifies `proof`. The Lagrange commitments, verifier index and proof
    /// all move into the call.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME))]
    pub fn proof_verify(
        &self,
        lgr_comm: Vec<Native<PolyComm<C>>>,
        index: Native<VerifierIndex<C>>,
        proof: Native<ProverProof<C>>,
    ) -> Result<bool> {
        let (lgr_comm, index, proof) = self.pass_verifier_inputs(lgr_comm, index, proof)?;
        self.bridge.call(|core| core.proof_verify::<C>(lgr_comm, index, proof))
    }

    /// True exactly when every `(lgr_comms[i], indexes[i], proofs[i])` verifies.
    #[instrument(level = "debug", skip_all, fields(curve = C::NAME, n = proofs.len()))]
    pub fn proof_batch_verify(
        &self,
        lgr_comms: Native<VecVecPolyComm<C>>,
        indexes: Vec<Native<VerifierIndex<C>>>,
        proofs: Vec<Native<ProverProof<C>>>,
    ) -> Result<bool> {
        lgr_comms.raw()?;
        let index_handles = self.bridge.pass_handles(&raw_all(&indexes)?)?;
        let proof_handles = self.bridge.pass_handles(&raw_all(&proofs)?)?;
        into_raw_all(indexes)?;
        into_raw_all(proofs)?;
        let lgr_comms = lgr_comms.into_raw()?;
        self.bridge
            .call(|core| core.proof_batch_verify::<C>(lgr_comms, index_handles, proof_handles))
    }

    /// A proof that verifies against nothing.
    pub fn proof_dummy(&self) -> Result<Native<ProverProof<C>>> {
        self.wrap(|core| core.proof_dummy::<C>())
    }

    /// Verifier challenges for `proof`; everything passed moves into the call.
    pub fn oracles_create(
        &self,
        lgr_comm: Vec<Native<PolyComm<C>>>,
        index: Native<VerifierIndex<C>>,
        proof: Native<ProverProof<C>>,
    ) -> Result<Native<Oracles<C::Scalar>>> {
        let (lgr_comm, index, proof) = self.pass_verifier_inputs(lgr_comm, index, proof)?;
        self.wrap(|core| core.oracles_create::<C>(lgr_comm, index, proof))
    }

    /// Hands a verifier's inputs over. The wrappers are emptied only once
    /// every one of them is live and the commitment array is in core memory.
    fn pass_verifier_inputs(
        &self,
        lgr_comm: Vec<Native<PolyComm<C>>>,
        index: Native<VerifierIndex<C>>,
        proof: Native<ProverProof<C>>,
    ) -> Result<(Slice, RawHandle, RawHandle)> {
        index.raw()?;
        proof.raw()?;
        let lgr = self.bridge.pass_handles(&raw_all(&lgr_comm)?)?;
        into_raw_all(lgr_comm)?;
        Ok((lgr, index.into_raw()?, proof.into_raw()?))
    }

    pub fn oracles_dummy(&self) -> Result<Native<Oracles<C::Scalar>>> {
        self.wrap(|core| core.oracles_dummy::<C::Scalar>())
    }

    pub fn vecvec_field(&self, capacity: u32) -> Result<Native<VecVecField<C::Scalar>>> {
        self.wrap(|core| core.vecvec_field_create::<C::Scalar>(capacity))
    }

    pub fn vecvec_field_push(&self, v: &Native<VecVecField<C::Scalar>>, item: &[C::Scalar]) -> Result<()> {
        let v = v.raw()?;
        let item = self.pass_fields(item)?;
        self.bridge.call(|core| core.vecvec_field_push::<C::Scalar>(v, item))
    }

    pub fn vecvec_field_get(&self, v: &Native<VecVecField<C::Scalar>>, i: u32) -> Result<Vec<C::Scalar>> {
        let v = v.raw()?;
        let ret = self.bridge.return_area()?;
        self.bridge
            .call(|core| core.vecvec_field_get::<C::Scalar>(v, i, ret.ptr()))?;
        Ok(fe::vec_from_bytes(&ret.take_bytes()?)?)
    }

    pub fn vecvec_field_set(&self, v: &Native<VecVecField<C::Scalar>>, i: u32, item: &[C::Scalar]) -> Result<()> {
        let v = v.raw()?;
        let item = self.pass_fields(item)?;
        self.bridge
            .call(|core| core.vecvec_field_set::<C::Scalar>(v, i, item))
    }

    pub fn vecvec_polycomm(&self, capacity: u32) -> Result<Native<VecVecPolyComm<C>>> {
        self.wrap(|core| core.vecvec_polycomm_create::<C>(capacity))
    }

    /// Appends one set of commitments, which move into the call.
    pub fn vecvec_polycomm_push(&self, v: &Native<VecVecPolyComm<C>>, comms: Vec<Native<PolyComm<C>>>) -> Result<()> {
        let v = v.raw()?;
        let comms = self.bridge.pass_handles(&into_raw_all(comms)?)?;
        self.bridge.call(|core| core.vecvec_polycomm_push::<C>(v, comms))
    }
}
