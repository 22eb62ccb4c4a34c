mod common;

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use plonk_bridge::plonk_core::Fp;
use plonk_bridge::{Bridge, BridgeConfig, BridgeError, ExecutionUnit, PoolState, ThreadLauncher, UnitLauncher};

fn bridge(threads: usize, handshake: Duration) -> Result<Bridge> {
    let config = BridgeConfig::default()
        .with_threads(threads)
        .with_handshake_timeout(handshake);
    Ok(Bridge::new(config)?)
}

/// Runs units on threads and records the pool state seen at each launch.
struct Observing {
    bridge: Bridge,
    launched: AtomicUsize,
    states: Mutex<Vec<PoolState>>,
}

impl UnitLauncher for Observing {
    fn launch(&self, unit: ExecutionUnit) -> io::Result<()> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        self.states.lock().unwrap().push(self.bridge.pool_state());
        ThreadLauncher.launch(unit)
    }
}

/// Fails to start the unit with the given index.
struct FailingAt(usize);

impl UnitLauncher for FailingAt {
    fn launch(&self, unit: ExecutionUnit) -> io::Result<()> {
        if unit.index() == self.0 {
            return Err(io::Error::other("no more threads"));
        }
        ThreadLauncher.launch(unit)
    }
}

/// Accepts units but never runs them.
struct Silent;

impl UnitLauncher for Silent {
    fn launch(&self, _unit: ExecutionUnit) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_ready_after_every_unit_acknowledges() -> Result<()> {
    let bridge = bridge(4, Duration::from_secs(5))?;
    assert_eq!(bridge.pool_state(), PoolState::Uninitialized);
    let launcher = Observing {
        bridge: bridge.clone(),
        launched: AtomicUsize::new(0),
        states: Mutex::new(Vec::new()),
    };
    bridge.bootstrap_with(&launcher)?;
    assert_eq!(launcher.launched.load(Ordering::SeqCst), 4);
    assert_eq!(*launcher.states.lock().unwrap(), vec![PoolState::Starting; 4]);
    assert_eq!(bridge.pool_state(), PoolState::Ready);
    Ok(())
}

#[test]
fn test_second_bootstrap_is_rejected() -> Result<()> {
    let bridge = bridge(2, Duration::from_secs(5))?;
    bridge.bootstrap()?;
    let err = bridge.bootstrap().unwrap_err();
    assert!(matches!(err, BridgeError::Bootstrap(_)), "{err}");
    assert_eq!(bridge.pool_state(), PoolState::Ready);
    Ok(())
}

#[test]
fn test_launch_failure_resets_and_retry_succeeds() -> Result<()> {
    let bridge = bridge(3, Duration::from_secs(5))?;
    let err = bridge.bootstrap_with(&FailingAt(1)).unwrap_err();
    assert!(err.to_string().contains("unit 1 failed to start"), "{err}");
    assert_eq!(bridge.pool_state(), PoolState::Uninitialized);

    bridge.bootstrap()?;
    assert_eq!(bridge.pool_state(), PoolState::Ready);
    Ok(())
}

#[test]
fn test_silent_unit_times_out() -> Result<()> {
    let bridge = bridge(2, Duration::from_millis(50))?;
    let err = bridge.bootstrap_with(&Silent).unwrap_err();
    assert!(err.to_string().contains("did not acknowledge"), "{err}");
    assert_eq!(bridge.pool_state(), PoolState::Uninitialized);
    Ok(())
}

#[test]
fn test_proving_with_a_ready_pool() -> Result<()> {
    let bridge = bridge(2, Duration::from_secs(5))?;
    bridge.bootstrap()?;
    let plonk = bridge.fp_plonk();
    let gates = common::mul_circuit(&plonk)?;
    let urs = plonk.urs_create(8)?;
    let index = plonk.index_create(&gates, 1, &urs)?;
    let n = plonk.index_domain_d1_size(&index)?;
    let vi = plonk.verifier_index_create(index.deep_copy()?)?;
    let proof = plonk.proof_create(index, &[Fp::from(3)], &common::mul_witness(n as usize, 3, 4), &[], vec![])?;
    let lagrange = plonk.urs_lagrange_commitments(&urs, n as u32, 1)?;
    assert!(plonk.proof_verify(lagrange, vi, proof)?);
    Ok(())
}
