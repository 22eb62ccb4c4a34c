//! In-crate host used by export tests.

use std::sync::{Arc, Mutex};

use rand::RngCore;

use crate::error::{CoreError, Result};
use crate::image::{MemoryImage, SharedImage};
use crate::imports::{HostImports, Slice, Thrown};
use crate::memory::MemoryDescriptor;
use crate::module::{module_image, CompiledModule, Instance};

#[derive(Default)]
pub struct TestHost {
    slots: Mutex<Vec<Option<String>>>,
    exceptions: Mutex<Vec<(u32, CoreError)>>,
    pub logs: Mutex<Vec<String>>,
}

impl TestHost {
    fn push(&self, value: String) -> u32 {
        let mut slots = self.slots.lock().unwrap();
        slots.push(Some(value));
        slots.len() as u32 + 3
    }

    pub fn exception(&self, thrown: Thrown) -> Option<CoreError> {
        let exceptions = self.exceptions.lock().unwrap();
        exceptions.iter().find(|(slot, _)| *slot == thrown.0).map(|(_, e)| e.clone())
    }

    pub fn live_refs(&self) -> usize {
        self.slots.lock().unwrap().iter().filter(|s| s.is_some()).count()
    }
}

impl HostImports for TestHost {
    fn string_new(&self, s: &str) -> u32 {
        self.push(s.to_string())
    }

    fn log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }

    fn alert(&self, message: &str) {
        self.log(message);
    }

    fn fill_random(&self, buf: &mut [u8]) -> Result<()> {
        rand::thread_rng().fill_bytes(buf);
        Ok(())
    }

    fn current_module(&self) -> u32 {
        self.push("module".into())
    }

    fn current_memory(&self) -> u32 {
        self.push("memory".into())
    }

    fn clone_ref(&self, slot: u32) -> u32 {
        let value = self.slots.lock().unwrap()[(slot - 4) as usize].clone().unwrap_or_default();
        self.push(value)
    }

    fn drop_ref(&self, slot: u32) {
        self.slots.lock().unwrap()[(slot - 4) as usize] = None;
    }

    fn store_exception(&self, err: CoreError) -> u32 {
        let slot = self.push(err.to_string());
        self.exceptions.lock().unwrap().push((slot, err));
        slot
    }
}

pub struct TestCore {
    pub env: Arc<TestHost>,
    pub image: SharedImage,
    pub instance: Instance,
}

impl TestCore {
    pub fn new() -> Self {
        let env = Arc::new(TestHost::default());
        let image = MemoryImage::new(MemoryDescriptor::default()).unwrap();
        let module = Arc::new(CompiledModule::compile(&module_image()).unwrap());
        let instance = module.instantiate(env.clone(), image.clone()).unwrap();
        Self {
            env,
            image,
            instance,
        }
    }

    pub fn pass(&self, bytes: &[u8]) -> Slice {
        if bytes.is_empty() {
            return Slice::EMPTY;
        }
        let ptr = self.instance.malloc(bytes.len() as u32).unwrap();
        self.image.memory().write(ptr, bytes).unwrap();
        Slice::new(ptr, bytes.len() as u32)
    }

    pub fn pass_words(&self, words: &[u32]) -> Slice {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Slice::new(self.pass(&bytes).ptr, words.len() as u32)
    }

    pub fn pass_str(&self, s: &str) -> Slice {
        self.pass(s.as_bytes())
    }

    /// A fresh 16-byte return area. Tests never release it.
    pub fn retptr(&self) -> u32 {
        self.instance.add_to_stack_pointer(-16).unwrap()
    }

    fn take_at(&self, ptr: u32, len: u32) -> Vec<u8> {
        let mut memory = self.image.memory();
        let bytes = memory.read(ptr, len).unwrap().to_vec();
        if ptr != 0 {
            memory.free(ptr).unwrap();
        }
        bytes
    }

    pub fn take(&self, retptr: u32) -> Vec<u8> {
        let words = self.image.memory().read_u32s(retptr, 2).unwrap();
        self.take_at(words[0], words[1])
    }

    pub fn take_words(&self, retptr: u32) -> Vec<u32> {
        let words = self.image.memory().read_u32s(retptr, 2).unwrap();
        self.take_at(words[0], words[1] * 4)
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect()
    }

    pub fn take_option(&self, retptr: u32) -> Option<Vec<u8>> {
        let words = self.image.memory().read_u32s(retptr, 3).unwrap();
        (words[0] == 1).then(|| self.take_at(words[1], words[2]))
    }

    pub fn live_allocations(&self) -> usize {
        self.image.memory().live_allocations()
    }
}
