use chrono_tz::Tz;
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::phone::{DEFAULT_MASK, PhoneMask};
use crate::core::schedule;

pub const APP_ID: &str = "dev.digests.app";
pub const CONFIG_VERSION: u64 = 1;

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("~/.cache"))
        .join("digests")
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, CosmicConfigEntry)]
pub struct DigestsConfig {
    /// Base URL of the `digests.*` procedures. Empty means work locally.
    pub api_url: String,
    pub debug_logging: bool,
    /// IANA name used instead of the system guess when seeding new contacts.
    pub default_timezone: String,
    pub phone_mask: String,
}

impl Default for DigestsConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            debug_logging: false,
            default_timezone: String::new(),
            phone_mask: DEFAULT_MASK.to_string(),
        }
    }
}

impl DigestsConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        default_cache_dir().join("digests.json")
    }

    pub fn api_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
    }

    /// The configured mask, or the default one if it has no digit slots.
    pub fn phone_mask(&self) -> PhoneMask {
        PhoneMask::new(&self.phone_mask).unwrap_or_else(|| {
            log::warn!("Ignoring phone mask {:?} without digit slots", self.phone_mask);
            PhoneMask::default()
        })
    }

    /// Timezone to pre-fill for new contacts.
    pub fn timezone_guess(&self) -> Tz {
        schedule::parse_timezone(&self.default_timezone).unwrap_or_else(schedule::guess_timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_api() {
        let config = DigestsConfig::default();
        assert!(!config.api_configured());
        assert_eq!(config.phone_mask().mask(), DEFAULT_MASK);
        assert!(config.snapshot_path().ends_with("digests/digests.json"));
    }

    #[test]
    fn configured_timezone_wins_over_guess() {
        let config = DigestsConfig {
            default_timezone: "Europe/Berlin".into(),
            ..Default::default()
        };
        assert_eq!(config.timezone_guess(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn bad_mask_falls_back() {
        let config = DigestsConfig {
            phone_mask: "no digits".into(),
            ..Default::default()
        };
        assert_eq!(config.phone_mask().mask(), DEFAULT_MASK);
    }
}
