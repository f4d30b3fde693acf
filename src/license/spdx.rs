use std::sync::OnceLock;

use regex::Regex;

use crate::license::condition::{ConditionSet, LicenseCondition};

/// A license-kind tag split into its identifier and exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseKind {
    pub id: String,
    pub classpath_exception: bool,
}

fn kind_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:SPDX-license-identifier-)?(?P<id>.+?)(?P<cpe>[-_ ]+with[-_ ]+classpath[-_ ]+exception(?:[-_ ][0-9.]+)?)?$",
        )
        .expect("license kind pattern is valid")
    })
}

/// Parse a license-kind tag such as `SPDX-license-identifier-GPL-2.0-with-classpath-exception`.
pub fn parse_kind(raw: &str) -> LicenseKind {
    let trimmed = raw.trim();
    match kind_re().captures(trimmed) {
        Some(caps) => LicenseKind {
            id: normalize(&caps["id"]),
            classpath_exception: caps.name("cpe").is_some(),
        },
        None => LicenseKind {
            id: trimmed.to_string(),
            classpath_exception: false,
        },
    }
}

/// Map a single canonical SPDX identifier (or `legacy_*` kind) to the
/// conditions it implies.
pub fn classify_spdx_id(id: &str) -> ConditionSet {
    use LicenseCondition::*;

    let id = id.trim();
    if let Some(legacy) = id.strip_prefix("legacy_") {
        return LicenseCondition::from_name(legacy)
            .map(ConditionSet::from)
            .unwrap_or_default();
    }

    match id {
        // Notice
        "MIT"
        | "Apache-2.0"
        | "BSD-2-Clause"
        | "BSD-3-Clause"
        | "BSD-4-Clause"
        | "ISC"
        | "0BSD"
        | "Zlib"
        | "PSF-2.0"
        | "Python-2.0"
        | "MIT-0"
        | "BlueOak-1.0.0"
        | "Artistic-2.0"
        | "OpenSSL"
        | "ICU"
        | "CC-BY-4.0"
        | "CC-BY-3.0"
        | "BSL-1.0"
        | "FTL" => Notice.into(),

        "Unlicense" | "CC0-1.0" | "WTFPL" => Unencumbered.into(),

        // Reciprocal
        "MPL-1.1"
        | "MPL-2.0"
        | "EPL-1.0"
        | "EPL-2.0"
        | "CDDL-1.0"
        | "CDDL-1.1"
        | "APSL-2.0"
        | "EUPL-1.2" => Reciprocal.into(),

        // Restricted, dynamic linking allowed
        "LGPL-2.0"
        | "LGPL-2.0-only"
        | "LGPL-2.0-or-later"
        | "LGPL-2.1"
        | "LGPL-2.1-only"
        | "LGPL-2.1-or-later"
        | "LGPL-3.0"
        | "LGPL-3.0-only"
        | "LGPL-3.0-or-later" => RestrictedAllowsDynamicLinking.into(),

        // Restricted
        "GPL-2.0"
        | "GPL-2.0-only"
        | "GPL-2.0-or-later"
        | "GPL-3.0"
        | "GPL-3.0-only"
        | "GPL-3.0-or-later"
        | "AGPL-3.0"
        | "AGPL-3.0-only"
        | "AGPL-3.0-or-later"
        | "EUPL-1.1"
        | "OSL-3.0" => Restricted.into(),

        _ => ConditionSet::empty(),
    }
}

/// True for GPL-family identifiers (not LGPL).
pub fn is_gpl_family(id: &str) -> bool {
    id.starts_with("GPL-") || id.starts_with("AGPL-")
}

/// Normalize common non-SPDX strings to their SPDX equivalents.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "Apache 2.0" | "Apache License 2.0" | "Apache-2" | "Apache2" => "Apache-2.0".to_string(),
        "BSD" | "BSD-like" => "BSD-3-Clause".to_string(),
        "GPL-2" | "GPLv2" | "GPL-2.0+" => "GPL-2.0".to_string(),
        "GPL-3" | "GPLv3" | "GPL-3.0+" => "GPL-3.0".to_string(),
        "LGPL-2.1+" | "LGPLv2.1" | "LGPL" => "LGPL-2.1".to_string(),
        "LGPL-3" | "LGPLv3" | "LGPL-3.0+" => "LGPL-3.0".to_string(),
        "MPL" | "MPLv2" => "MPL-2.0".to_string(),
        "Public-Domain" | "public_domain" => "CC0-1.0".to_string(),
        other => other.to_string(),
    }
}
