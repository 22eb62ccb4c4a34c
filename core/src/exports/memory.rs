use crate::imports::Export;
use crate::module::Instance;

impl Instance {
    pub fn malloc(&self, size: u32) -> Export<u32> {
        self.guard("malloc", || Ok(self.memory().malloc(size)?))
    }

    pub fn free(&self, ptr: u32) -> Export<()> {
        self.guard("free", || Ok(self.memory().free(ptr)?))
    }

    pub fn realloc(&self, ptr: u32, new_size: u32) -> Export<u32> {
        self.guard("realloc", || Ok(self.memory().realloc(ptr, new_size)?))
    }

    pub fn add_to_stack_pointer(&self, delta: i32) -> Export<u32> {
        self.guard("add_to_stack_pointer", || {
            Ok(self.memory().add_to_stack_pointer(delta)?)
        })
    }
}
