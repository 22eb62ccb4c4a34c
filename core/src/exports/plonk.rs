//! Circuits, indices, proofs and oracles.

use crate::arena::RawHandle;
use crate::circuit::{Gate, GateVector, Wire};
use crate::curve::{Affine, PastaCurve};
use crate::error::{CoreError, Result};
use crate::exports::decode_offset;
use crate::field::{self as fe, PastaField};
use crate::imports::{Export, Slice};
use crate::index::ProverIndex;
use crate::module::Instance;
use crate::oracles::Oracles;
use crate::persist;
use crate::poly_comm::PolyComm;
use crate::proof::{PrevChallenge, ProverProof};
use crate::urs::Urs;
use crate::vec_vec::{VecVecField, VecVecPolyComm};
use crate::verifier_index::{shifts_for_domain, VerifierIndex};

fn non_negative(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| CoreError::InvalidArgument(format!("negative {what} {value}")))
}

impl Instance {
    pub fn gate_vector_create<F: PastaField>(&self) -> Export<RawHandle> {
        self.guard("gate_vector_create", || Ok(self.insert(GateVector::<F>::new())))
    }

    /// Appends `gate`, which is consumed.
    pub fn gate_vector_add<F: PastaField>(&self, vector: RawHandle, gate: RawHandle) -> Export<()> {
        self.guard("gate_vector_add", || {
            let gate = self.take::<Gate<F>>(gate)?;
            self.arena()
                .with_mut::<GateVector<F>, _>(vector, |v| v.add(gate))?
        })
    }

    /// Copy of row `i`.
    pub fn gate_vector_get<F: PastaField>(&self, vector: RawHandle, i: i32) -> Export<RawHandle> {
        self.guard("gate_vector_get", || {
            let i = non_negative(i, "gate index")?;
            let gate = self.get::<GateVector<F>>(vector)?.get(i)?;
            Ok(self.insert(gate))
        })
    }

    /// Rewires the `target` cell to `head`; both wires are consumed.
    pub fn gate_vector_wrap<F: PastaField>(
        &self,
        vector: RawHandle,
        target: RawHandle,
        head: RawHandle,
    ) -> Export<()> {
        self.guard("gate_vector_wrap", || {
            let mut arena = self.arena();
            let target = arena.take::<Wire>(target)?;
            let head = arena.take::<Wire>(head)?;
            arena.with_mut::<GateVector<F>, _>(vector, |v| v.wrap(target, head))?
        })
    }

    pub fn gate_vector_len<F: PastaField>(&self, vector: RawHandle) -> Export<u32> {
        self.guard("gate_vector_len", || {
            Ok(self.get::<GateVector<F>>(vector)?.len() as u32)
        })
    }

    /// Compiles `gates` against `urs`. Both stay owned by the caller.
    pub fn index_create<C: PastaCurve>(
        &self,
        gates: RawHandle,
        public: i32,
        urs: RawHandle,
    ) -> Export<RawHandle> {
        self.guard("index_create", || {
            let public = non_negative(public, "public input count")?;
            let gates = self.get::<GateVector<C::Scalar>>(gates)?;
            let urs = self.get::<Urs<C>>(urs)?;
            let index = ProverIndex::create(gates.gates(), public, urs)?;
            Ok(self.insert(index))
        })
    }

    fn index_query<C: PastaCurve>(
        &self,
        export: &'static str,
        index: RawHandle,
        f: impl FnOnce(&ProverIndex<C>) -> usize,
    ) -> Export<i32> {
        self.guard(export, || Ok(f(&*self.get::<ProverIndex<C>>(index)?) as i32))
    }

    pub fn index_max_degree<C: PastaCurve>(&self, index: RawHandle) -> Export<i32> {
        self.index_query::<C>("index_max_degree", index, ProverIndex::max_degree)
    }

    pub fn index_public_inputs<C: PastaCurve>(&self, index: RawHandle) -> Export<i32> {
        self.index_query::<C>("index_public_inputs", index, ProverIndex::public_inputs)
    }

    pub fn index_domain_d1_size<C: PastaCurve>(&self, index: RawHandle) -> Export<i32> {
        self.index_query::<C>("index_domain_d1_size", index, |i| i.domains.d1.size())
    }

    pub fn index_domain_d4_size<C: PastaCurve>(&self, index: RawHandle) -> Export<i32> {
        self.index_query::<C>("index_domain_d4_size", index, |i| i.domains.d4.size())
    }

    pub fn index_domain_d8_size<C: PastaCurve>(&self, index: RawHandle) -> Export<i32> {
        self.index_query::<C>("index_domain_d8_size", index, |i| i.domains.d8.size())
    }

    pub fn index_read<C: PastaCurve>(
        &self,
        offset_is_some: u32,
        offset: u32,
        urs: RawHandle,
        path: Slice,
    ) -> Export<RawHandle> {
        self.guard("index_read", || {
            let path = self.read_path(path)?;
            let offset = decode_offset(offset_is_some, offset)?;
            let urs = self.get::<Urs<C>>(urs)?;
            let index = ProverIndex::read(&path, offset, urs)?.ok_or_else(|| Self::missing("index"))?;
            Ok(self.insert(index))
        })
    }

    pub fn index_write<C: PastaCurve>(&self, append: u32, index: RawHandle, path: Slice) -> Export<()> {
        self.guard("index_write", || {
            let path = self.read_path(path)?;
            let append = persist::decode_append(append)?;
            self.get::<ProverIndex<C>>(index)?.write(&path, append)
        })
    }

    /// Derives the verifier index; `index` is consumed.
    pub fn verifier_index_create<C: PastaCurve>(&self, index: RawHandle) -> Export<RawHandle> {
        self.guard("verifier_index_create", || {
            let index = self.take::<ProverIndex<C>>(index)?;
            Ok(self.insert(VerifierIndex::create(&index)))
        })
    }

    pub fn verifier_index_read<C: PastaCurve>(
        &self,
        offset_is_some: u32,
        offset: u32,
        urs: RawHandle,
        path: Slice,
    ) -> Export<RawHandle> {
        self.guard("verifier_index_read", || {
            let path = self.read_path(path)?;
            let offset = decode_offset(offset_is_some, offset)?;
            let urs = self.get::<Urs<C>>(urs)?;
            let index = VerifierIndex::read(&path, offset, urs)?
                .ok_or_else(|| Self::missing("verifier index"))?;
            Ok(self.insert(index))
        })
    }

    pub fn verifier_index_write<C: PastaCurve>(
        &self,
        append: u32,
        index: RawHandle,
        path: Slice,
    ) -> Export<()> {
        self.guard("verifier_index_write", || {
            let path = self.read_path(path)?;
            let append = persist::decode_append(append)?;
            self.get::<VerifierIndex<C>>(index)?.write(&path, append)
        })
    }

    pub fn verifier_index_shifts<C: PastaCurve>(&self, log2: i32) -> Export<RawHandle> {
        self.guard("verifier_index_shifts", || {
            let log2 = non_negative(log2, "domain size")? as u32;
            Ok(self.insert(shifts_for_domain::<C::Scalar>(log2)?))
        })
    }

    pub fn verifier_index_dummy<C: PastaCurve>(&self) -> Export<RawHandle> {
        self.guard("verifier_index_dummy", || Ok(self.insert(VerifierIndex::<C>::dummy())))
    }

    /// Proves a witness; the index is consumed. `prev_challenges` holds the
    /// concatenated scalars of each previous proof, split evenly across the
    /// consumed affine handles in `prev_sgs`.
    pub fn proof_create<C: PastaCurve>(
        &self,
        index: RawHandle,
        primary: Slice,
        auxiliary: Slice,
        prev_challenges: Slice,
        prev_sgs: Slice,
    ) -> Export<RawHandle> {
        self.guard("proof_create", || {
            let primary = fe::vec_from_bytes::<C::Scalar>(&self.read_bytes(primary)?)?;
            let auxiliary = fe::vec_from_bytes::<C::Scalar>(&self.read_bytes(auxiliary)?)?;
            let chals = fe::vec_from_bytes::<C::Scalar>(&self.read_bytes(prev_challenges)?)?;
            let prev_sgs = self.read_handles(prev_sgs)?;

            let (index, sgs) = {
                let mut arena = self.arena();
                arena.check::<ProverIndex<C>>(index)?;
                arena.check_all::<Affine<C>>(&prev_sgs)?;
                (
                    arena.take::<ProverIndex<C>>(index)?,
                    arena.take_all::<Affine<C>>(&prev_sgs)?,
                )
            };
            let prev = split_prev_challenges(chals, &sgs)?;
            let proof = ProverProof::create(&index, &primary, &auxiliary, prev, self.runtime())?;
            Ok(self.insert(proof))
        })
    }

    /// Moves a verifier's inputs out of the arena once all of them check out.
    fn take_verifier_inputs<C: PastaCurve>(
        &self,
        lgr_comm: Slice,
        index: RawHandle,
        proof: RawHandle,
    ) -> Result<(Vec<PolyComm<C>>, VerifierIndex<C>, ProverProof<C>)> {
        let lgr = self.read_handles(lgr_comm)?;
        let mut arena = self.arena();
        arena.check_all::<PolyComm<C>>(&lgr)?;
        arena.check::<VerifierIndex<C>>(index)?;
        arena.check::<ProverProof<C>>(proof)?;
        Ok((
            arena.take_all::<PolyComm<C>>(&lgr)?,
            arena.take::<VerifierIndex<C>>(index)?,
            arena.take::<ProverProof<C>>(proof)?,
        ))
    }

    /// Verifies a proof; the Lagrange commitments, verifier index and proof are consumed.
    pub fn proof_verify<C: PastaCurve>(
        &self,
        lgr_comm: Slice,
        index: RawHandle,
        proof: RawHandle,
    ) -> Export<bool> {
        self.guard("proof_verify", || {
            let (lgr, index, proof) = self.take_verifier_inputs::<C>(lgr_comm, index, proof)?;
            proof.verify(&lgr, &index)
        })
    }

    /// True only when every `(lgr_comms[i], indexes[i], proofs[i])` verifies.
    /// Everything passed is consumed.
    pub fn proof_batch_verify<C: PastaCurve>(
        &self,
        lgr_comms: RawHandle,
        indexes: Slice,
        proofs: Slice,
    ) -> Export<bool> {
        self.guard("proof_batch_verify", || {
            let indexes = self.read_handles(indexes)?;
            let proofs = self.read_handles(proofs)?;
            let (lgr_comms, indexes, proofs) = {
                let mut arena = self.arena();
                arena.check::<VecVecPolyComm<C>>(lgr_comms)?;
                arena.check_all::<VerifierIndex<C>>(&indexes)?;
                arena.check_all::<ProverProof<C>>(&proofs)?;
                (
                    arena.take::<VecVecPolyComm<C>>(lgr_comms)?,
                    arena.take_all::<VerifierIndex<C>>(&indexes)?,
                    arena.take_all::<ProverProof<C>>(&proofs)?,
                )
            };
            if lgr_comms.len() != indexes.len() || indexes.len() != proofs.len() {
                return Err(CoreError::InvalidArgument(format!(
                    "batch of {} commitment sets, {} indexes and {} proofs",
                    lgr_comms.len(),
                    indexes.len(),
                    proofs.len()
                )));
            }
            let batch = lgr_comms
                .0
                .into_iter()
                .zip(indexes)
                .zip(proofs)
                .map(|((lgr, index), proof)| (lgr, index, proof))
                .collect();
            ProverProof::batch_verify(batch, self.runtime())
        })
    }

    pub fn proof_dummy<C: PastaCurve>(&self) -> Export<RawHandle> {
        self.guard("proof_dummy", || Ok(self.insert(ProverProof::<C>::dummy())))
    }

    /// Verifier challenges for a proof; everything passed is consumed.
    pub fn oracles_create<C: PastaCurve>(
        &self,
        lgr_comm: Slice,
        index: RawHandle,
        proof: RawHandle,
    ) -> Export<RawHandle> {
        self.guard("oracles_create", || {
            let (lgr, index, proof) = self.take_verifier_inputs::<C>(lgr_comm, index, proof)?;
            Ok(self.insert(proof.oracles(&lgr, &index)?))
        })
    }

    pub fn oracles_dummy<F: PastaField>(&self) -> Export<RawHandle> {
        self.guard("oracles_dummy", || Ok(self.insert(Oracles::<F>::dummy())))
    }

    pub fn vecvec_field_create<F: PastaField>(&self, capacity: u32) -> Export<RawHandle> {
        self.guard("vecvec_field_create", || {
            Ok(self.insert(VecVecField::<F>::new(capacity as usize)))
        })
    }

    pub fn vecvec_field_push<F: PastaField>(&self, handle: RawHandle, item: Slice) -> Export<()> {
        self.guard("vecvec_field_push", || {
            let item = fe::vec_from_bytes::<F>(&self.read_bytes(item)?)?;
            self.arena().with_mut::<VecVecField<F>, _>(handle, |v| v.push(item))
        })
    }

    pub fn vecvec_field_get<F: PastaField>(&self, handle: RawHandle, i: u32, retptr: u32) -> Export<()> {
        self.guard("vecvec_field_get", || {
            let bytes = fe::vec_to_bytes(self.get::<VecVecField<F>>(handle)?.get(i as usize)?);
            self.write_bytes(retptr, &bytes)
        })
    }

    pub fn vecvec_field_set<F: PastaField>(&self, handle: RawHandle, i: u32, item: Slice) -> Export<()> {
        self.guard("vecvec_field_set", || {
            let item = fe::vec_from_bytes::<F>(&self.read_bytes(item)?)?;
            self.arena()
                .with_mut::<VecVecField<F>, _>(handle, |v| v.set(i as usize, item))?
        })
    }

    pub fn vecvec_polycomm_create<C: PastaCurve>(&self, capacity: u32) -> Export<RawHandle> {
        self.guard("vecvec_polycomm_create", || {
            Ok(self.insert(VecVecPolyComm::<C>::new(capacity as usize)))
        })
    }

    /// Appends the commitments behind `comms`, which are consumed.
    pub fn vecvec_polycomm_push<C: PastaCurve>(&self, handle: RawHandle, comms: Slice) -> Export<()> {
        self.guard("vecvec_polycomm_push", || {
            let handles = self.read_handles(comms)?;
            let mut arena = self.arena();
            arena.check::<VecVecPolyComm<C>>(handle)?;
            let comms = arena.take_all::<PolyComm<C>>(&handles)?;
            arena.with_mut::<VecVecPolyComm<C>, _>(handle, |v| v.push(comms))
        })
    }
}

fn split_prev_challenges<C: PastaCurve>(
    chals: Vec<C::Scalar>,
    sgs: &[Affine<C>],
) -> Result<Vec<PrevChallenge<C>>> {
    if sgs.is_empty() {
        if !chals.is_empty() {
            return Err(CoreError::InvalidArgument(
                "previous challenges without commitments".into(),
            ));
        }
        return Ok(Vec::new());
    }
    if chals.len() % sgs.len() != 0 {
        return Err(CoreError::InvalidArgument(format!(
            "{} previous challenges cannot be split across {} commitments",
            chals.len(),
            sgs.len()
        )));
    }
    let per_proof = chals.len() / sgs.len();
    let blocks: Vec<Vec<C::Scalar>> = if per_proof == 0 {
        vec![Vec::new(); sgs.len()]
    } else {
        chals.chunks(per_proof).map(<[C::Scalar]>::to_vec).collect()
    };
    blocks
        .into_iter()
        .zip(sgs)
        .map(|(block, sg)| Ok((block, Instance::single_chunk(sg)?)))
        .collect()
}
