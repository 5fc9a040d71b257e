// SPDX-License-Identifier: Apache-2.0

//! 5QI-indexed QoS templates.

use crate::error::ConfigError;
use std::collections::HashMap;

/// A 5G QoS Identifier: an index into the static QoS template table.
pub type FiveQi = u16;

/// The RLC mode a DRB is configured with. Derived from a 5QI's PDCP
/// template: AM if the template says so, UM-bidirectional otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RlcMode {
    /// Acknowledged Mode.
    Am,
    /// Unacknowledged Mode, bidirectional.
    UmBidir,
}

/// The PDCP configuration template associated with a 5QI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PdcpConfigTemplate {
    /// RLC mode this 5QI's DRBs are configured with.
    pub rlc_mode: RlcMode,
}

/// A single 5QI's static configuration entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FiveQiTemplate {
    /// The 5QI this template applies to.
    pub five_qi: FiveQi,
    /// PDCP configuration derived for any DRB using this 5QI.
    pub pdcp: PdcpConfigTemplate,
    /// Whether the derived SDAP config only applies when the DRB is the
    /// UE's default DRB.
    pub sdap_default_drb_only: bool,
}

/// The static 5QI → template table, deserialized as an ordered list so that
/// [`QosCatalog::validate`] can detect a duplicate 5QI entry in the source
/// document rather than silently letting a map overwrite it.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct QosCatalog {
    entries: Vec<FiveQiTemplate>,
}

impl QosCatalog {
    /// Builds a catalog from a list of templates, without validating it.
    pub fn new(entries: Vec<FiveQiTemplate>) -> Self {
        Self { entries }
    }

    /// Rejects an empty catalog or one with a duplicate 5QI.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyQosCatalog);
        }
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.five_qi) {
                return Err(ConfigError::DuplicateFiveQi {
                    five_qi: entry.five_qi,
                });
            }
        }
        Ok(())
    }

    /// Builds a lookup map keyed by 5QI. Should only be called on a catalog
    /// that has passed [`Self::validate`]; a duplicate entry resolves to
    /// "last one wins" otherwise.
    pub fn as_map(&self) -> HashMap<FiveQi, FiveQiTemplate> {
        self.entries
            .iter()
            .cloned()
            .map(|t| (t.five_qi, t))
            .collect()
    }

    /// Looks up a single 5QI's template.
    pub fn get(&self, five_qi: FiveQi) -> Option<&FiveQiTemplate> {
        self.entries.iter().find(|t| t.five_qi == five_qi)
    }

    /// Number of templates in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template(five_qi: FiveQi, rlc_mode: RlcMode) -> FiveQiTemplate {
        FiveQiTemplate {
            five_qi,
            pdcp: PdcpConfigTemplate { rlc_mode },
            sdap_default_drb_only: false,
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let catalog = QosCatalog::new(vec![]);
        assert_eq!(catalog.validate(), Err(ConfigError::EmptyQosCatalog));
    }

    #[test]
    fn duplicate_five_qi_is_rejected() {
        let catalog = QosCatalog::new(vec![
            template(9, RlcMode::UmBidir),
            template(9, RlcMode::Am),
        ]);
        assert_eq!(
            catalog.validate(),
            Err(ConfigError::DuplicateFiveQi { five_qi: 9 })
        );
    }

    #[test]
    fn valid_catalog_round_trips_through_yaml() {
        let catalog = QosCatalog::new(vec![template(5, RlcMode::Am), template(9, RlcMode::UmBidir)]);
        assert_eq!(catalog.validate(), Ok(()));
        let yaml = serde_yaml::to_string(&catalog).unwrap();
        let back: QosCatalog = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(5).unwrap().pdcp.rlc_mode, RlcMode::Am);
    }
}
