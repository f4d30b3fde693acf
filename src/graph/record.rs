use serde::{Deserialize, Serialize};

/// One license metadata record, as written for a single build target.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseMetadata {
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub module_types: Vec<String>,
    #[serde(default)]
    pub module_classes: Vec<String>,
    #[serde(default)]
    pub license_kinds: Vec<String>,
    #[serde(default)]
    pub license_conditions: Vec<String>,
    #[serde(default)]
    pub license_texts: Vec<String>,
    #[serde(default)]
    pub is_container: bool,
    #[serde(default)]
    pub built: Vec<String>,
    #[serde(default)]
    pub installed: Vec<String>,
    #[serde(default)]
    pub install_map: Vec<InstallMap>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub deps: Vec<AnnotatedDependency>,
}

/// Rewrites an install path prefix to its location inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InstallMap {
    pub from_path: String,
    #[serde(default)]
    pub container_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotatedDependency {
    pub file: String,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl LicenseMetadata {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let content = r#"
package_name = "libfoo"
module_types = ["cc_library"]
module_classes = ["SHARED_LIBRARIES"]
license_kinds = ["SPDX-license-identifier-LGPL-2.1"]
license_conditions = ["restricted_allows_dynamic_linking"]
license_texts = ["external/foo/COPYING"]
built = ["out/soong/libfoo.so"]
installed = ["out/target/product/generic/system/lib/libfoo.so"]
sources = ["external/foo/foo.c"]

[[install_map]]
from_path = "out/target/product/generic/system/"
container_path = "/system/"

[[deps]]
file = "out/soong/libbar.a.meta_lic"
annotations = ["static"]

[[deps]]
file = "out/soong/clang.meta_lic"
annotations = ["toolchain"]
"#;

        let record = LicenseMetadata::parse(content).unwrap();
        assert_eq!(record.package_name, "libfoo");
        assert_eq!(record.license_conditions, vec!["restricted_allows_dynamic_linking"]);
        assert!(!record.is_container);
        assert_eq!(record.install_map.len(), 1);
        assert_eq!(record.deps.len(), 2);
        assert_eq!(record.deps[1].annotations, vec!["toolchain"]);
    }

    #[test]
    fn test_parse_empty_record() {
        let record = LicenseMetadata::parse("").unwrap();
        assert_eq!(record, LicenseMetadata::default());
    }

    #[test]
    fn test_unknown_field_is_malformed() {
        assert!(LicenseMetadata::parse("license_colour = \"blue\"").is_err());
        assert!(LicenseMetadata::parse("[[deps]]\nannotations = [\"static\"]").is_err());
    }
}
