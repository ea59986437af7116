//! Age-based access restriction derivation.

use crate::models::AccessRestrictions;

/// Age from which betting and payments may be unlocked.
pub const ADULT_AGE: i32 = 18;

/// Knobs that tighten the defaults for minors beyond betting and payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestrictionPolicy {
    pub restrict_full_content_for_minors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAccess {
    pub is_minor: bool,
    pub access_restrictions: AccessRestrictions,
}

/// Compute minor status and capabilities from age and the explicit minor flag.
///
/// Age validation happens at the request boundary; any integer is accepted here.
pub fn derive_access(age: i32, explicit_minor: bool, policy: &RestrictionPolicy) -> DerivedAccess {
    let is_minor = age < ADULT_AGE || explicit_minor;

    let access_restrictions = if is_minor {
        AccessRestrictions {
            betting_allowed: false,
            payments_allowed: false,
            full_content_access: !policy.restrict_full_content_for_minors,
        }
    } else {
        AccessRestrictions::unrestricted()
    };

    DerivedAccess {
        is_minor,
        access_restrictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_minor_age_blocks_betting_and_payments() {
        let policy = RestrictionPolicy::default();
        for age in 1..ADULT_AGE {
            let derived = derive_access(age, false, &policy);
            assert!(derived.is_minor, "age {}", age);
            assert!(!derived.access_restrictions.betting_allowed, "age {}", age);
            assert!(!derived.access_restrictions.payments_allowed, "age {}", age);
            assert!(derived.access_restrictions.full_content_access);
        }
    }

    #[test]
    fn test_adults_are_unrestricted() {
        let policy = RestrictionPolicy::default();
        for age in [ADULT_AGE, 19, 42, 120] {
            let derived = derive_access(age, false, &policy);
            assert!(!derived.is_minor, "age {}", age);
            assert_eq!(derived.access_restrictions, AccessRestrictions::unrestricted());
        }
    }

    #[test]
    fn test_exactly_eighteen_is_not_minor() {
        assert!(!derive_access(18, false, &RestrictionPolicy::default()).is_minor);
        assert!(derive_access(17, false, &RestrictionPolicy::default()).is_minor);
    }

    #[test]
    fn test_explicit_flag_marks_adult_as_minor() {
        let derived = derive_access(30, true, &RestrictionPolicy::default());
        assert!(derived.is_minor);
        assert!(!derived.access_restrictions.payments_allowed);
        assert!(!derived.access_restrictions.betting_allowed);
    }

    #[test]
    fn test_policy_can_withhold_full_content_from_minors() {
        let policy = RestrictionPolicy {
            restrict_full_content_for_minors: true,
        };
        assert!(!derive_access(12, false, &policy).access_restrictions.full_content_access);
        assert!(derive_access(25, false, &policy).access_restrictions.full_content_access);
    }
}
