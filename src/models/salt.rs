//! Placement keys and other keccak-derived identifiers.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};

use crate::models::artifact::ArtifactKind;

/// Salt for one artifact of a deployment run: `keccak256("<seed>:<ContractName>")`.
///
/// Pure function of its inputs, so re-running with the same seed always
/// targets the same CREATE2 addresses.
pub fn derive_salt(seed: &str, kind: ArtifactKind) -> B256 {
    keccak256(format!("{}:{}", seed, kind.contract_name()).as_bytes())
}

/// The CREATE2 factory takes the salt as a `uint256`.
pub fn salt_as_uint(salt: B256) -> U256 {
    U256::from_be_bytes(salt.0)
}

pub fn uint_as_salt(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// Same as ethers' `utils.id`: keccak of the UTF-8 text.
pub fn description_hash(text: &str) -> B256 {
    keccak256(text.as_bytes())
}

/// AccessControl role identifier, e.g. `MANAGER_ROLE`.
pub fn role_hash(name: &str) -> B256 {
    keccak256(name.as_bytes())
}

/// Address a standard CREATE2 factory would assign to `bytecode` under `salt`.
pub fn predict_create2_address(factory: Address, salt: B256, bytecode: &Bytes) -> Address {
    factory.create2_from_code(salt, bytecode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn test_salt_is_stable() {
        let a = derive_salt("VERSION1", ArtifactKind::Factory);
        let b = derive_salt("VERSION1", ArtifactKind::Factory);
        assert_eq!(a, b);
        assert_eq!(a, keccak256("VERSION1:DAOFactory".as_bytes()));
    }

    #[test]
    fn test_salts_differ_per_artifact_and_seed() {
        let mut seen = std::collections::HashSet::new();
        for kind in ArtifactKind::all() {
            assert!(seen.insert(derive_salt("VERSION1", kind)));
        }
        for kind in ArtifactKind::all() {
            assert!(seen.insert(derive_salt("VERSION2", kind)));
        }
    }

    #[test]
    fn test_salt_uint_roundtrip() {
        let salt = derive_salt("VERSION0", ArtifactKind::App);
        assert_eq!(uint_as_salt(salt_as_uint(salt)), salt);
        assert_eq!(salt_as_uint(B256::with_last_byte(7)), U256::from(7));
    }

    #[test]
    fn test_known_hashes() {
        // keccak256("") and keccak256("MANAGER_ROLE")
        assert_eq!(
            description_hash(""),
            b256!("0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
        assert_eq!(
            role_hash("MANAGER_ROLE"),
            b256!("0x241ecf16d79d0f8dbfb92cbc07fe17840425976cf0667f022fe9877caa831b08")
        );
    }

    #[test]
    fn test_predict_create2_address() {
        // EIP-1014 example 0: zero deployer, zero salt, init code 0x00
        let predicted = predict_create2_address(
            Address::ZERO,
            B256::ZERO,
            &Bytes::from_static(&[0x00]),
        );
        assert_eq!(predicted, address!("0x4D1A2e2bB4F88F0250f26Ffff098B0b30B26BF38"));
    }
}
