use std::collections::HashMap;

use crate::license::condition::{ConditionSet, LicenseCondition};
use crate::license::spdx::{classify_spdx_id, is_gpl_family, parse_kind};

/// Per-kind condition overrides, keyed by the raw license-kind tag.
pub type KindOverrides = HashMap<String, ConditionSet>;

/// Infer the conditions implied by a node's license kinds.
///
/// An override for the exact kind tag wins over the built-in table. Kinds that
/// are not recognized contribute nothing.
pub fn classify_kinds<S: AsRef<str>>(kinds: &[S], overrides: &KindOverrides) -> ConditionSet {
    kinds
        .iter()
        .map(|kind| classify_kind(kind.as_ref(), overrides))
        .fold(ConditionSet::empty(), ConditionSet::union)
}

fn classify_kind(raw: &str, overrides: &KindOverrides) -> ConditionSet {
    if let Some(cs) = overrides.get(raw.trim()) {
        return *cs;
    }
    let kind = parse_kind(raw);
    classify_spdx_id(&kind.id)
}

/// True when every restricted-implying kind carries the classpath exception.
///
/// Such a library may be linked dynamically without its strict restricted
/// condition reaching the linking target.
pub fn is_classpath_exception_only<S: AsRef<str>>(kinds: &[S]) -> bool {
    let mut saw_exception = false;
    for raw in kinds {
        let kind = parse_kind(raw.as_ref());
        let restricted = classify_spdx_id(&kind.id).contains(LicenseCondition::Restricted);
        if kind.classpath_exception && is_gpl_family(&kind.id) {
            saw_exception = true;
        } else if restricted {
            return false;
        }
    }
    saw_exception
}

#[cfg(test)]
mod tests {
    use super::*;
    use LicenseCondition::*;

    #[test]
    fn test_classify_union_of_kinds() {
        let kinds = [
            "SPDX-license-identifier-Apache-2.0",
            "SPDX-license-identifier-LGPL-2.1",
        ];
        assert_eq!(
            classify_kinds(&kinds, &KindOverrides::new()),
            ConditionSet::of(&[Notice, RestrictedAllowsDynamicLinking])
        );
    }

    #[test]
    fn test_override_wins() {
        let mut overrides = KindOverrides::new();
        overrides.insert("SPDX-license-identifier-MIT".to_string(), Proprietary.into());
        assert_eq!(
            classify_kinds(&["SPDX-license-identifier-MIT"], &overrides),
            Proprietary.into()
        );
    }

    #[test]
    fn test_unknown_kind_is_empty() {
        assert!(classify_kinds(&["vendor-eula"], &KindOverrides::new()).is_empty());
    }

    #[test]
    fn test_classpath_exception_only() {
        assert!(is_classpath_exception_only(&[
            "SPDX-license-identifier-GPL-2.0-with-classpath-exception"
        ]));
        assert!(is_classpath_exception_only(&[
            "SPDX-license-identifier-GPL-2.0-with-classpath-exception",
            "SPDX-license-identifier-MIT",
        ]));
        assert!(!is_classpath_exception_only(&[
            "SPDX-license-identifier-GPL-2.0-with-classpath-exception",
            "SPDX-license-identifier-GPL-3.0",
        ]));
        assert!(!is_classpath_exception_only(&["SPDX-license-identifier-GPL-2.0"]));
        assert!(!is_classpath_exception_only::<&str>(&[]));
    }
}
