//! Per-action entitlement checks for payments, betting and content.

use std::fmt;

use super::restrictions::ADULT_AGE;
use crate::models::{AccessRestrictions, ChildAccount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Payments,
    Betting,
    Content,
}

impl GatedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatedAction::Payments => "payments",
            GatedAction::Betting => "betting",
            GatedAction::Content => "content",
        }
    }

    /// The restriction flag that unlocks this action.
    pub fn is_allowed_by(&self, restrictions: &AccessRestrictions) -> bool {
        match self {
            GatedAction::Payments => restrictions.payments_allowed,
            GatedAction::Betting => restrictions.betting_allowed,
            GatedAction::Content => restrictions.full_content_access,
        }
    }

    /// Whether a minor is refused outright, before flags are consulted.
    fn is_age_gated(&self) -> bool {
        matches!(self, GatedAction::Payments | GatedAction::Betting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionReason {
    AgeRestriction,
    AccountRestricted,
}

impl RestrictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestrictionReason::AgeRestriction => "age_restriction",
            RestrictionReason::AccountRestricted => "account_restricted",
        }
    }

    pub fn message(&self, action: GatedAction) -> String {
        match self {
            RestrictionReason::AgeRestriction => format!(
                "Access to {} is restricted for users under {}",
                action.as_str(),
                ADULT_AGE
            ),
            RestrictionReason::AccountRestricted => {
                format!("Access to {} is restricted for this account", action.as_str())
            }
        }
    }
}

impl fmt::Display for RestrictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether `account` may perform `action`.
///
/// Content is never denied here; kids mode sanitizes it instead.
pub fn evaluate(account: &ChildAccount, action: GatedAction) -> Result<(), RestrictionReason> {
    if !action.is_age_gated() {
        return Ok(());
    }

    if account.is_minor
        || account.age < ADULT_AGE
        || !action.is_allowed_by(&account.access_restrictions)
    {
        return Err(RestrictionReason::AgeRestriction);
    }

    if account.account_restricted {
        return Err(RestrictionReason::AccountRestricted);
    }

    Ok(())
}

pub fn effective_kids_mode(request_override: bool, account: &ChildAccount) -> bool {
    request_override || account.kids_mode || account.is_minor || account.account_restricted
}

/// Payments that are really wagers or deposits into a betting balance.
pub fn is_gambling_payment(payment_type: Option<&str>, description: Option<&str>) -> bool {
    let type_matches = payment_type
        .map(|t| {
            let t = t.to_ascii_lowercase();
            ["bet", "wager", "deposit"].iter().any(|k| t.contains(k))
        })
        .unwrap_or(false);

    let description_matches = description
        .map(|d| d.to_ascii_lowercase().contains("gambling"))
        .unwrap_or(false);

    type_matches || description_matches
}
