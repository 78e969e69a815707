//! Configuration Value Objects
//!
//! The immutable description of a realm set and its thresholds, matching
//! the wire shape:
//!
//! ```json
//! {
//!   "realms": [{ "id": "...", "address": "...", "public_key": "..." }],
//!   "register_threshold": 3,
//!   "recover_threshold": 2,
//!   "pin_hashing_mode": "Standard2019"
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use kernel::id::RealmId;
use platform::pin::PinHashingMode;

use crate::error::ConfigurationError;

/// Maximum number of realms in one configuration
pub const MAX_REALMS: usize = 255;

/// The parameters of a single realm, created at configuration time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmDescriptor {
    /// A 16-byte identifier, unique within a configuration
    pub id: RealmId,
    /// The URL at which to reach the realm API
    pub address: String,
    /// An optional hex public key for the realm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// The parameters used to configure a client operation.
///
/// Immutable; supplied fresh per call and validated at the start of every
/// coordinator operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// The realms holding (or to hold) shares of the secret
    pub realms: Vec<RealmDescriptor>,
    /// A registration succeeds once this many realms ack
    pub register_threshold: u8,
    /// A recovery (or an adversary) needs this many cooperating realms
    pub recover_threshold: u8,
    /// How PINs are hashed before register and recover operations
    pub pin_hashing_mode: PinHashingMode,
}

impl Configuration {
    /// Number of configured realms
    pub fn realm_count(&self) -> usize {
        self.realms.len()
    }

    /// Check every configuration invariant, naming the first violation.
    ///
    /// Invariants: `1 <= register_threshold <= n <= 255`,
    /// `ceil(n/2) <= recover_threshold <= n`,
    /// `recover_threshold <= register_threshold`, unique realm ids.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let n = self.realms.len();
        if n == 0 {
            return Err(ConfigurationError::NoRealms);
        }
        if n > MAX_REALMS {
            return Err(ConfigurationError::TooManyRealms { count: n });
        }

        let mut seen = HashSet::with_capacity(n);
        for realm in &self.realms {
            if !seen.insert(realm.id) {
                return Err(ConfigurationError::DuplicateRealmId(realm.id));
            }
        }

        if self.register_threshold == 0 || usize::from(self.register_threshold) > n {
            return Err(ConfigurationError::RegisterThresholdOutOfRange {
                threshold: self.register_threshold,
                realms: n,
            });
        }

        let min_recover = n.div_ceil(2) as u8;
        if self.recover_threshold < min_recover || usize::from(self.recover_threshold) > n {
            return Err(ConfigurationError::RecoverThresholdOutOfRange {
                threshold: self.recover_threshold,
                min_required: min_recover,
                realms: n,
            });
        }

        if self.recover_threshold > self.register_threshold {
            return Err(ConfigurationError::ThresholdOrder {
                register_threshold: self.register_threshold,
                recover_threshold: self.recover_threshold,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm(byte: u8) -> RealmDescriptor {
        RealmDescriptor {
            id: RealmId::from_bytes([byte; 16]),
            address: format!("https://realm-{byte}.example.com"),
            public_key: None,
        }
    }

    fn config(n: u8, register: u8, recover: u8) -> Configuration {
        Configuration {
            realms: (0..n).map(realm).collect(),
            register_threshold: register,
            recover_threshold: recover,
            pin_hashing_mode: PinHashingMode::FastInsecure,
        }
    }

    #[test]
    fn test_valid_configurations() {
        assert!(config(1, 1, 1).validate().is_ok());
        assert!(config(3, 3, 2).validate().is_ok());
        assert!(config(5, 3, 3).validate().is_ok());
        assert!(config(5, 5, 5).validate().is_ok());
    }

    #[test]
    fn test_no_realms_rejected() {
        assert_eq!(
            config(0, 1, 1).validate(),
            Err(ConfigurationError::NoRealms)
        );
    }

    #[test]
    fn test_duplicate_realm_id_rejected() {
        let mut cfg = config(3, 3, 2);
        cfg.realms[2].id = cfg.realms[0].id;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::DuplicateRealmId(_))
        ));
    }

    #[test]
    fn test_register_threshold_bounds() {
        assert!(matches!(
            config(3, 0, 2).validate(),
            Err(ConfigurationError::RegisterThresholdOutOfRange { .. })
        ));
        assert!(matches!(
            config(3, 4, 2).validate(),
            Err(ConfigurationError::RegisterThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_recover_threshold_majority_floor() {
        // n=5 requires recover_threshold >= 3
        assert!(matches!(
            config(5, 5, 2).validate(),
            Err(ConfigurationError::RecoverThresholdOutOfRange {
                min_required: 3,
                ..
            })
        ));
        assert!(config(5, 5, 3).validate().is_ok());
    }

    #[test]
    fn test_recover_threshold_upper_bound() {
        assert!(matches!(
            config(3, 3, 4).validate(),
            Err(ConfigurationError::RecoverThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn test_threshold_order() {
        // recover_threshold must not exceed register_threshold
        assert_eq!(
            config(5, 3, 4).validate(),
            Err(ConfigurationError::ThresholdOrder {
                register_threshold: 3,
                recover_threshold: 4,
            })
        );
    }

    #[test]
    fn test_wire_shape_roundtrip() {
        let json = r#"{
            "realms": [
                { "id": "9f105f0bf34461034df2ba67b17e5f43", "address": "https://gcp.example.com" },
                { "id": "7546bca7074dd6af64a3c230f04ef803", "address": "https://aws.example.com", "public_key": "aabb" }
            ],
            "register_threshold": 2,
            "recover_threshold": 1,
            "pin_hashing_mode": "Standard2019"
        }"#;
        let cfg: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.realm_count(), 2);
        assert_eq!(cfg.pin_hashing_mode, PinHashingMode::Standard2019);
        assert_eq!(cfg.realms[1].public_key.as_deref(), Some("aabb"));

        let back = serde_json::to_string(&cfg).unwrap();
        let again: Configuration = serde_json::from_str(&back).unwrap();
        assert_eq!(cfg, again);
    }
}
