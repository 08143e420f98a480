use alloy::primitives::{keccak256, Address};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use daoit::errors::DaoError;
use daoit::models::salt::derive_salt;
use daoit::models::{ArtifactKind, ArtifactStore, ImplementationSet, Network, NetworkKind};
use daoit::services::deployer::plan;

const INITIALIZE_ABI: &str = r#"[{"type":"function","name":"initialize","inputs":[],"outputs":[],"stateMutability":"nonpayable"}]"#;

fn write_artifact(dir: &Path, kind: ArtifactKind, bytecode: &str) {
    let path = dir.join(kind.relative_path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let abi = if kind == ArtifactKind::Factory { INITIALIZE_ABI } else { "[]" };
    let json = format!(
        r#"{{"contractName":"{}","sourceName":"x.sol","abi":{},"bytecode":"{}"}}"#,
        kind.contract_name(),
        abi,
        bytecode
    );
    fs::write(path, json).unwrap();
}

fn artifacts(dir: &Path) -> ArtifactStore {
    for (i, kind) in ArtifactKind::all().into_iter().enumerate() {
        write_artifact(dir, kind, &format!("0x60806040{:02x}", i));
    }
    ArtifactStore::load(dir).unwrap()
}

#[test]
fn same_seed_gives_same_plan() {
    let dir = tempfile::tempdir().unwrap();
    let store = artifacts(dir.path());
    let network = Network::for_kind(NetworkKind::Polygon);

    let first = plan(&network, &store, "VERSION1").unwrap();
    let second = plan(&network, &store, "VERSION1").unwrap();
    assert_eq!(first.len(), 5);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.salt, b.salt);
        assert_eq!(a.predicted, b.predicted);
    }
    assert_eq!(first[4].salt, keccak256("VERSION1:DAOFactory".as_bytes()));
}

#[test]
fn planned_addresses_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let store = artifacts(dir.path());
    let network = Network::for_kind(NetworkKind::Localhost);

    let planned = plan(&network, &store, "VERSION1").unwrap();
    let addresses: HashSet<Address> = planned.iter().map(|p| p.predicted).collect();
    assert_eq!(addresses.len(), planned.len());

    // The predicted addresses fill a complete, valid implementation set.
    let mut set = ImplementationSet::default();
    for p in &planned {
        set.record(p.kind, p.predicted);
    }
    let complete = set.into_complete().unwrap();
    assert_eq!(complete.factory, planned[4].predicted);
}

#[test]
fn new_seed_moves_every_address() {
    let dir = tempfile::tempdir().unwrap();
    let store = artifacts(dir.path());
    let network = Network::for_kind(NetworkKind::Polygon);

    let v1 = plan(&network, &store, "VERSION1").unwrap();
    let v2 = plan(&network, &store, "VERSION2").unwrap();
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert_ne!(a.predicted, b.predicted, "{} did not move", a.kind);
        assert_eq!(b.salt, derive_salt("VERSION2", b.kind));
    }
}

#[test]
fn plan_requires_create2_factory_and_seed() {
    let dir = tempfile::tempdir().unwrap();
    let store = artifacts(dir.path());

    let mumbai = Network::for_kind(NetworkKind::Mumbai);
    assert!(matches!(
        plan(&mumbai, &store, "VERSION1"),
        Err(DaoError::MissingAddress { .. })
    ));

    let polygon = Network::for_kind(NetworkKind::Polygon);
    assert!(matches!(
        plan(&polygon, &store, "  "),
        Err(DaoError::InvalidInput(_))
    ));
}

#[test]
fn duplicate_addresses_fail_the_run() {
    let mut set = ImplementationSet::default();
    for (i, kind) in ArtifactKind::all().into_iter().enumerate() {
        // executor and factory collide
        let byte = if kind == ArtifactKind::Factory { 4 } else { i as u8 + 1 };
        set.record(kind, Address::repeat_byte(byte));
    }
    assert!(matches!(
        set.into_complete(),
        Err(DaoError::DuplicateAddress(_))
    ));
}
