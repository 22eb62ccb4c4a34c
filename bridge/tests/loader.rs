use std::io::{self, Cursor, Read};

use anyhow::Result;
use plonk_bridge::loader::WASM_CONTENT_TYPE;
use plonk_bridge::plonk_core::module_image;
use plonk_bridge::{Bridge, BridgeConfig, BridgeError, LoadError, Response};

struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

#[test]
fn test_load_from_responses() -> Result<()> {
    for content_type in [Some(WASM_CONTENT_TYPE), Some("application/octet-stream"), None] {
        let response = Response::new(content_type, Cursor::new(module_image()));
        let bridge = Bridge::load(response.into(), BridgeConfig::default())?;
        assert!(bridge.core_version()?.starts_with("plonk-core"));
        let one = bridge.fp().of_int(1)?;
        assert_eq!(bridge.fp().to_string(&one)?, "1");
    }
    Ok(())
}

#[test]
fn test_load_from_bytes() -> Result<()> {
    let bridge = Bridge::load(module_image().into(), BridgeConfig::default())?;
    assert_eq!(bridge.live_objects(), 0);
    Ok(())
}

#[test]
fn test_bad_module_is_a_compile_error() {
    let mut bytes = module_image();
    bytes[0] ^= 0xff;
    for content_type in [Some(WASM_CONTENT_TYPE), Some("text/html")] {
        let response = Response::new(content_type, Cursor::new(bytes.clone()));
        let err = Bridge::load(response.into(), BridgeConfig::default()).unwrap_err();
        assert!(matches!(err, BridgeError::Load(LoadError::Compile(_))), "{err}");
    }
}

#[test]
fn test_broken_body_is_a_read_error() {
    let err = Bridge::load(Response::new(Some("text/plain"), Broken).into(), BridgeConfig::default()).unwrap_err();
    assert!(matches!(err, BridgeError::Load(LoadError::Read(_))), "{err}");
}
