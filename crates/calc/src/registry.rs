use std::collections::BTreeMap;

use crate::error::CalculationError;
use crate::methodology::{
    AvoidedGrasslandConversion, ImprovedForestManagement, Methodology, SoilCarbonSequestration,
};
use crate::types::MethodologyMetadata;

/// Immutable map from methodology code to implementation.
///
/// Built once with the built-in methodologies; there is no runtime
/// registration.
pub struct MethodologyRegistry {
    methodologies: BTreeMap<&'static str, Box<dyn Methodology>>,
}

impl MethodologyRegistry {
    pub fn with_builtins() -> Self {
        let builtins: [Box<dyn Methodology>; 3] = [
            Box::new(ImprovedForestManagement),
            Box::new(AvoidedGrasslandConversion),
            Box::new(SoilCarbonSequestration),
        ];
        Self {
            methodologies: builtins.into_iter().map(|m| (m.code(), m)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> Result<&dyn Methodology, CalculationError> {
        self.methodologies
            .get(code)
            .map(|m| m.as_ref())
            .ok_or_else(|| CalculationError::UnsupportedMethodology {
                code: code.to_string(),
            })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.methodologies.contains_key(code)
    }

    /// Sorted by code.
    pub fn codes(&self) -> Vec<&'static str> {
        self.methodologies.keys().copied().collect()
    }

    /// Sorted by code.
    pub fn metadata(&self) -> Vec<MethodologyMetadata> {
        self.methodologies.values().map(|m| m.metadata()).collect()
    }
}

impl Default for MethodologyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for MethodologyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodologyRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_sorted_by_code() {
        let registry = MethodologyRegistry::with_builtins();
        assert_eq!(registry.codes(), ["VM0007", "VM0015", "VM0033"]);
        let names: Vec<_> = registry.metadata().into_iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            [
                "Improved Forest Management",
                "Avoided Grassland Conversion",
                "Soil Carbon Sequestration"
            ]
        );
    }

    #[test]
    fn unknown_code_is_unsupported() {
        let registry = MethodologyRegistry::default();
        assert!(registry.contains("VM0033"));
        match registry.get("VM0001") {
            Err(CalculationError::UnsupportedMethodology { code }) => assert_eq!(code, "VM0001"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(m) => panic!("unexpected methodology {}", m.code()),
        }
    }
}
