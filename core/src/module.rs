//! Compiled core modules and their instances.

use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, MutexGuard};

use blake2b_simd::Params as Blake2bParams;
use tracing::{debug, instrument, trace};

use crate::arena::{NativeObject, ObjectArena, RawHandle};
use crate::error::{CoreError, Result};
use crate::image::SharedImage;
use crate::imports::{Export, HostImports, Slice, Thrown};
use crate::memory::LinearMemory;
use crate::runtime::Runtime;

/// Leading bytes of every module image.
pub const MAGIC: [u8; 4] = *b"\0asm";
/// The only binary format version this core understands.
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 8;
const READ_CHUNK: usize = 64 * 1024;

/// The image of this build of the core, as a loader would receive it.
pub fn module_image() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + 32);
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(b"plonk-core ");
    bytes.extend_from_slice(env!("CARGO_PKG_VERSION").as_bytes());
    bytes
}

/// A validated module, identified by the digest of its image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledModule {
    digest: [u8; 32],
    len: usize,
}

struct Compiler {
    state: blake2b_simd::State,
    header: Vec<u8>,
    len: usize,
}

impl Compiler {
    fn new() -> Self {
        Self {
            state: Blake2bParams::new().hash_length(32).to_state(),
            header: Vec::with_capacity(HEADER_LEN),
            len: 0,
        }
    }

    fn update(&mut self, mut bytes: &[u8]) -> Result<()> {
        if self.header.len() < HEADER_LEN {
            let take = (HEADER_LEN - self.header.len()).min(bytes.len());
            self.header.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.header.len() == HEADER_LEN {
                check_header(&self.header)?;
                self.state.update(&self.header);
            }
        }
        self.state.update(bytes);
        self.len += bytes.len();
        Ok(())
    }

    fn finish(self) -> Result<CompiledModule> {
        if self.header.len() < HEADER_LEN {
            return Err(CoreError::Decode(format!(
                "module image truncated after {} bytes",
                self.header.len()
            )));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(self.state.finalize().as_bytes());
        Ok(CompiledModule {
            digest,
            len: HEADER_LEN + self.len,
        })
    }
}

fn check_header(header: &[u8]) -> Result<()> {
    if header[..4] != MAGIC {
        return Err(CoreError::Decode("missing module magic".into()));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != VERSION {
        return Err(CoreError::Decode(format!("unsupported module version {version}")));
    }
    Ok(())
}

impl CompiledModule {
    pub fn compile(bytes: &[u8]) -> Result<Self> {
        let mut compiler = Compiler::new();
        compiler.update(bytes)?;
        compiler.finish()
    }

    /// Compiles while reading, rejecting a bad header before the body arrives.
    pub fn compile_from_reader(mut reader: impl Read) -> Result<Self> {
        let mut compiler = Compiler::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            compiler.update(&buf[..n])?;
        }
        compiler.finish()
    }

    pub const fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Instantiates the module on `image` with the given imports.
    #[instrument(level = "debug", skip_all)]
    pub fn instantiate(
        self: &Arc<Self>,
        imports: Arc<dyn HostImports>,
        image: SharedImage,
    ) -> Result<Instance> {
        debug!(len = self.len, "instantiating core module");
        Ok(Instance {
            module: self.clone(),
            imports,
            image,
        })
    }
}

/// An instantiated core. Every exported entry point is a method.
pub struct Instance {
    module: Arc<CompiledModule>,
    imports: Arc<dyn HostImports>,
    image: SharedImage,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl Instance {
    pub fn module(&self) -> &Arc<CompiledModule> {
        &self.module
    }

    pub fn image(&self) -> &SharedImage {
        &self.image
    }

    pub(crate) fn imports(&self) -> &dyn HostImports {
        self.imports.as_ref()
    }

    /// Runs an export body, turning errors and panics into stored exceptions.
    pub(crate) fn guard<T>(&self, export: &'static str, f: impl FnOnce() -> Result<T>) -> Export<T> {
        let err = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                CoreError::Panic(message)
            }
        };
        trace!(export, %err, "export raised");
        Err(Thrown(self.imports.store_exception(err)))
    }

    pub(crate) fn memory(&self) -> MutexGuard<'_, LinearMemory> {
        self.image.memory()
    }

    pub(crate) fn arena(&self) -> MutexGuard<'_, ObjectArena> {
        self.image.arena()
    }

    pub(crate) fn runtime(&self) -> Runtime<'_> {
        self.image.runtime()
    }

    /// Copies an argument buffer out of memory and frees it.
    pub(crate) fn read_bytes(&self, arg: Slice) -> Result<Vec<u8>> {
        let mut memory = self.memory();
        let bytes = memory.read(arg.ptr, arg.len)?.to_vec();
        if arg.ptr != 0 {
            memory.free(arg.ptr)?;
        }
        Ok(bytes)
    }

    pub(crate) fn read_words(&self, arg: Slice) -> Result<Vec<u32>> {
        let mut memory = self.memory();
        let words = memory.read_u32s(arg.ptr, arg.len)?;
        if arg.ptr != 0 {
            memory.free(arg.ptr)?;
        }
        Ok(words)
    }

    pub(crate) fn read_str(&self, arg: Slice) -> Result<String> {
        String::from_utf8(self.read_bytes(arg)?)
            .map_err(|e| CoreError::Decode(format!("string argument is not UTF-8: {e}")))
    }

    pub(crate) fn read_handles(&self, arg: Slice) -> Result<Vec<RawHandle>> {
        RawHandle::decode_all(&self.read_words(arg)?)
    }

    fn alloc_copy(memory: &mut LinearMemory, bytes: &[u8]) -> Result<u32> {
        if bytes.is_empty() {
            return Ok(0);
        }
        let ptr = memory.malloc(bytes.len() as u32)?;
        memory.write(ptr, bytes)?;
        Ok(ptr)
    }

    /// Writes a variable-length result as `(ptr, len)` at `retptr`.
    pub(crate) fn write_bytes(&self, retptr: u32, bytes: &[u8]) -> Result<()> {
        let mut memory = self.memory();
        let ptr = Self::alloc_copy(&mut memory, bytes)?;
        memory.write_u32s(retptr, &[ptr, bytes.len() as u32])?;
        Ok(())
    }

    pub(crate) fn write_words(&self, retptr: u32, words: &[u32]) -> Result<()> {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut memory = self.memory();
        let ptr = Self::alloc_copy(&mut memory, &bytes)?;
        memory.write_u32s(retptr, &[ptr, words.len() as u32])?;
        Ok(())
    }

    /// Writes an optional result as `(is_some, ptr, len)` at `retptr`.
    pub(crate) fn write_option(&self, retptr: u32, bytes: Option<&[u8]>) -> Result<()> {
        let mut memory = self.memory();
        match bytes {
            Some(bytes) => {
                let ptr = Self::alloc_copy(&mut memory, bytes)?;
                memory.write_u32s(retptr, &[1, ptr, bytes.len() as u32])?;
            }
            None => memory.write_u32s(retptr, &[0, 0, 0])?,
        }
        Ok(())
    }

    pub(crate) fn insert<T: NativeObject>(&self, value: T) -> RawHandle {
        self.arena().insert(value)
    }

    pub(crate) fn get<T: NativeObject>(&self, handle: RawHandle) -> Result<Arc<T>> {
        self.arena().get(handle)
    }

    /// Moves the object out of the arena; the handle is dead afterwards.
    pub(crate) fn take<T: NativeObject>(&self, handle: RawHandle) -> Result<T> {
        self.arena().take(handle)
    }

    /// Moves every object out, or none of them if any handle is bad.
    pub(crate) fn take_all<T: NativeObject>(&self, handles: &[RawHandle]) -> Result<Vec<T>> {
        self.arena().take_all(handles)
    }
}
