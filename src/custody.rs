//! Custody address resolution
//!
//! The protocol manages a small closed set of custody addresses, one per
//! duty. Each variant resolves to its current address through the PoS API at
//! startup and is tracked as a wallet under a stable alias. Resolution
//! happens exactly once; the set never changes while the process runs.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::clients::PosClient;
use crate::config::Address;
use crate::error::ExporterError;
use crate::Result;

/// Protocol-managed custody address kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyVariant {
    Common,
    StateSubmit,
    RewardSubmit,
    BlobSubmit,
}

impl CustodyVariant {
    pub const ALL: [CustodyVariant; 4] = [
        CustodyVariant::Common,
        CustodyVariant::StateSubmit,
        CustodyVariant::RewardSubmit,
        CustodyVariant::BlobSubmit,
    ];

    /// Wire ordinal used by the `/mpc/latest/{ordinal}` endpoint.
    pub fn ordinal(&self) -> u8 {
        match self {
            CustodyVariant::Common => 0,
            CustodyVariant::StateSubmit => 1,
            CustodyVariant::RewardSubmit => 2,
            CustodyVariant::BlobSubmit => 3,
        }
    }

    /// Stable alias used as the wallet key and metric label.
    pub fn alias(&self) -> &'static str {
        match self {
            CustodyVariant::Common => "mpc-common",
            CustodyVariant::StateSubmit => "mpc-state-submit",
            CustodyVariant::RewardSubmit => "mpc-reward-submit",
            CustodyVariant::BlobSubmit => "mpc-blob-submit",
        }
    }

    /// Whether startup must fail when this variant cannot be resolved.
    /// Blob submission does not exist on every network, so its absence is
    /// tolerated.
    pub fn required(&self) -> bool {
        !matches!(self, CustodyVariant::BlobSubmit)
    }
}

/// Resolves every custody variant through the PoS API and merges the results
/// into the user-configured wallet set.
///
/// A user alias equal to a variant alias is a fatal error, checked before
/// any resolution is attempted. A required variant that fails to resolve is
/// fatal; an optional one is skipped with a warning. Without a PoS client
/// only the user wallets are tracked.
pub async fn resolve_wallets(
    pos: Option<&PosClient>,
    user_wallets: &HashMap<String, Address>,
) -> Result<HashMap<String, Address>> {
    let mut wallets = user_wallets.clone();

    let Some(pos) = pos else {
        warn!("no PoS endpoint configured, tracking user wallets only");
        return Ok(wallets);
    };

    for variant in CustodyVariant::ALL {
        if wallets.contains_key(variant.alias()) {
            return Err(ExporterError::DuplicateWalletAlias {
                alias: variant.alias().to_string(),
            });
        }
    }

    for variant in CustodyVariant::ALL {
        match pos.custody_address(variant.ordinal()).await {
            Ok(custody) => {
                info!(
                    "custody variant '{}' resolved to {}",
                    variant.alias(),
                    custody.mpc_address
                );
                wallets.insert(variant.alias().to_string(), custody.mpc_address);
            }
            Err(err) if variant.required() => {
                return Err(ExporterError::CustodyResolution {
                    variant: variant.alias().to_string(),
                    source: Box::new(err),
                });
            }
            Err(err) => {
                warn!(
                    "optional custody variant '{}' not resolved: {}",
                    variant.alias(),
                    err
                );
            }
        }
    }

    Ok(wallets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_table_is_consistent() {
        let ordinals: Vec<u8> = CustodyVariant::ALL.iter().map(|v| v.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);

        let aliases: std::collections::HashSet<&str> =
            CustodyVariant::ALL.iter().map(|v| v.alias()).collect();
        assert_eq!(aliases.len(), 4);

        assert!(CustodyVariant::Common.required());
        assert!(CustodyVariant::StateSubmit.required());
        assert!(CustodyVariant::RewardSubmit.required());
        assert!(!CustodyVariant::BlobSubmit.required());
    }

    #[tokio::test]
    async fn without_pos_endpoint_only_user_wallets_are_tracked() {
        let mut user = HashMap::new();
        user.insert(
            "ops".to_string(),
            "0x48120daed4f33ad803b19e4e237c4180a4043045"
                .parse()
                .unwrap(),
        );
        // A variant-alias key is allowed here because nothing will resolve.
        user.insert(
            "mpc-common".to_string(),
            "0x1111111111111111111111111111111111111111"
                .parse()
                .unwrap(),
        );

        let wallets = resolve_wallets(None, &user).await.unwrap();
        assert_eq!(wallets.len(), 2);
    }
}
