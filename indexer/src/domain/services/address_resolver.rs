//! Attribution of outputs to owner addresses.

use bech32::{Bech32, Hrp};

use crate::domain::models::identifiers::strip_0x;

/// Lock script hash of the standard pay-to-public-key-hash script
pub const P2PKH_LOCK_SCRIPT_HASH: &str = "5f5960a7bca6ceeeb0c97bc717562914e7a1de04";
/// Lock script hash of the pay-to-public-key-hash script that only allows burns
pub const P2PKH_BURN_LOCK_SCRIPT_HASH: &str = "37572bdcc22d39a59c0d12d301f6271ba3fdd451";

const ASSET_ADDRESS_VERSION: u8 = 1;
const P2PKH_ADDRESS_TYPE: u8 = 1;
const P2PKH_BURN_ADDRESS_TYPE: u8 = 2;

/// Resolves the owner address of an output from its lock script
pub trait AddressResolver: Send + Sync {
    /// `None` when the lock script is not one the resolver recognizes
    fn get_owner(
        &self,
        lock_script_hash: &str,
        parameters: &[String],
        network_id: &str,
    ) -> Option<String>;
}

/// Recognizes the two standard pay-to-public-key-hash lock scripts and
/// renders their owner as a bech32 asset address with prefix `{network}a`
#[derive(Debug, Default, Clone)]
pub struct StandardAddressResolver;

impl AddressResolver for StandardAddressResolver {
    fn get_owner(
        &self,
        lock_script_hash: &str,
        parameters: &[String],
        network_id: &str,
    ) -> Option<String> {
        let address_type = match strip_0x(lock_script_hash).as_str() {
            P2PKH_LOCK_SCRIPT_HASH => P2PKH_ADDRESS_TYPE,
            P2PKH_BURN_LOCK_SCRIPT_HASH => P2PKH_BURN_ADDRESS_TYPE,
            _ => return None,
        };
        let [pubkey_hash] = parameters else {
            return None;
        };
        let pubkey_hash = hex::decode(strip_0x(pubkey_hash)).ok()?;
        if pubkey_hash.len() != 20 {
            return None;
        }

        let mut payload = Vec::with_capacity(22);
        payload.push(ASSET_ADDRESS_VERSION);
        payload.push(address_type);
        payload.extend_from_slice(&pubkey_hash);

        let hrp = Hrp::parse(&format!("{}a", network_id.to_ascii_lowercase())).ok()?;
        bech32::encode::<Bech32>(hrp, &payload).ok()
    }
}
