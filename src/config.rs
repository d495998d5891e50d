use crate::rules::CapacityTable;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Paramétrage du moteur de planning (fichier JSON, tous les champs optionnels).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub capacity: CapacityTable,
    pub max_consecutive_days: u32,
    pub booking_horizon_months: u32,
    pub storage_timeout_ms: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            capacity: CapacityTable::default(),
            max_consecutive_days: 6,
            booking_horizon_months: 3,
            storage_timeout_ms: 5_000,
        }
    }
}

impl RosterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_consecutive_days == 0 {
            bail!("max_consecutive_days must be > 0");
        }
        if self.booking_horizon_months == 0 {
            bail!("booking_horizon_months must be > 0");
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: RosterConfig = serde_json::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_consecutive_days": 2, "capacity": {{ "medic": 3 }} }}"#).unwrap();

        let config = RosterConfig::load(file.path()).unwrap();
        assert_eq!(config.max_consecutive_days, 2);
        assert_eq!(config.capacity.medic, 3);
        assert_eq!(config.capacity.technical, 4);
        assert_eq!(config.booking_horizon_months, 3);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = RosterConfig {
            max_consecutive_days: 0,
            ..RosterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
