//! Loading the core module from a response or from raw bytes.

use std::io::Read;
use std::sync::Arc;

use plonk_core::CompiledModule;
use tracing::{debug, instrument, warn};

use crate::error::LoadError;

/// Content type the streaming path requires.
pub const WASM_CONTENT_TYPE: &str = "application/wasm";

/// A fetched module body together with its declared content type.
pub struct Response {
    pub content_type: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl Response {
    pub fn new(content_type: Option<&str>, body: impl Read + Send + 'static) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            body: Box::new(body),
        }
    }

    fn is_wasm(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(WASM_CONTENT_TYPE))
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Where the core module comes from.
#[derive(Debug)]
pub enum ModuleSource {
    Response(Response),
    Bytes(Vec<u8>),
}

impl From<Vec<u8>> for ModuleSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Response> for ModuleSource {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

/// Compiles the module. Responses are compiled while streaming when they
/// declare `application/wasm`; any other content type is buffered first.
#[instrument(level = "debug", skip_all)]
pub fn compile(source: ModuleSource) -> Result<Arc<CompiledModule>, LoadError> {
    let module = match source {
        ModuleSource::Bytes(bytes) => CompiledModule::compile(&bytes).map_err(LoadError::Compile)?,
        ModuleSource::Response(response) if response.is_wasm() => {
            debug!("compiling core module while streaming");
            CompiledModule::compile_from_reader(response.body).map_err(LoadError::Compile)?
        }
        ModuleSource::Response(mut response) => {
            warn!(
                content_type = response.content_type.as_deref().unwrap_or("<none>"),
                "streaming compilation needs `{WASM_CONTENT_TYPE}`, falling back to buffered compilation"
            );
            let mut bytes = Vec::new();
            response.body.read_to_end(&mut bytes)?;
            CompiledModule::compile(&bytes).map_err(LoadError::Compile)?
        }
    };
    Ok(Arc::new(module))
}

#[cfg(test)]
mod tests {
    use plonk_core::module_image;

    use super::*;

    #[test]
    fn test_content_type_matching() {
        let wasm = |ct: Option<&str>| Response::new(ct, std::io::empty()).is_wasm();
        assert!(wasm(Some("application/wasm")));
        assert!(wasm(Some("Application/WASM; charset=binary")));
        assert!(!wasm(Some("application/octet-stream")));
        assert!(!wasm(None));
    }

    #[test]
    fn test_all_sources_compile_the_same_module() {
        let image = module_image();
        let from_bytes = compile(image.clone().into()).unwrap();
        let streamed = compile(Response::new(Some(WASM_CONTENT_TYPE), std::io::Cursor::new(image.clone())).into()).unwrap();
        let buffered = compile(Response::new(Some("text/plain"), std::io::Cursor::new(image)).into()).unwrap();
        assert_eq!(from_bytes.digest(), streamed.digest());
        assert_eq!(from_bytes.digest(), buffered.digest());
    }
}
