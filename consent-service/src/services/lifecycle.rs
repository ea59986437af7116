//! Parental consent transitions over stored child accounts.
//!
//! Each operation is one read-modify-write: load the account, apply the
//! guarded transition to its consent slot, then persist with a version check.
//! A concurrent writer makes the save fail with `VersionConflict` and nothing
//! is written.

use chrono::Utc;
use std::sync::Arc;

use super::email::ConsentMailer;
use super::error::ServiceError;
use super::guardian::parent_matches;
use super::metrics::record_consent_transition;
use super::repository::AccountRepository;
use super::security_audit::{SecurityAuditLog, SecurityAuditService};
use crate::models::{
    apply_event, CallerContext, ChildAccount, ConsentEvent, ConsentStatus, VerificationMethod,
};

pub struct VerifyConsent {
    pub child_email: String,
    pub parent_confirmed: bool,
    pub verification_method: Option<VerificationMethod>,
    pub parent_identity: Option<String>,
}

#[derive(Clone)]
pub struct ConsentLifecycleManager {
    accounts: AccountRepository,
    mailer: Arc<dyn ConsentMailer>,
    audit: SecurityAuditService,
    verification_base_url: String,
}

impl ConsentLifecycleManager {
    pub fn new(
        accounts: AccountRepository,
        mailer: Arc<dyn ConsentMailer>,
        audit: SecurityAuditService,
        verification_base_url: String,
    ) -> Self {
        Self {
            accounts,
            mailer,
            audit,
            verification_base_url,
        }
    }

    /// Open a new consent cycle, creating the account if the email is new.
    ///
    /// Kids mode is switched on as a precaution until a parent answers.
    pub async fn request_consent(
        &self,
        child_email: &str,
        child_age: i32,
        parent_email: Option<String>,
        caller: &CallerContext,
    ) -> Result<ChildAccount, ServiceError> {
        let existing = self.accounts.find_by_email(child_email).await?;
        let is_new = existing.is_none();

        let mut account = match existing {
            Some(account) => account,
            None => ChildAccount::new(
                child_email.to_string(),
                child_age,
                false,
                self.accounts.policy(),
            ),
        };

        account.age = child_age;
        account.kids_mode = true;
        account.last_active = Utc::now();

        apply_event(
            &mut account.coppa_consent,
            ConsentEvent::Requested {
                parent_email: parent_email.clone(),
            },
            &caller.audit_context(),
            Utc::now(),
        )?;

        if is_new {
            account = self.accounts.create(account).await?;
        } else {
            self.accounts.save(&mut account).await?;
        }

        record_consent_transition("requested");
        tracing::info!(
            child_id = %account.id,
            new_account = is_new,
            "Parental consent requested"
        );

        if let Some(parent_email) = parent_email.as_deref() {
            self.dispatch_consent_email(parent_email, child_email).await;
        }

        Ok(account)
    }

    /// Record the parent's answer to a pending request.
    pub async fn verify_consent(
        &self,
        req: VerifyConsent,
        caller: &CallerContext,
    ) -> Result<ConsentStatus, ServiceError> {
        let mut account = self.accounts.require_by_email(&req.child_email).await?;

        let event = if req.parent_confirmed {
            ConsentEvent::Approved {
                method: req
                    .verification_method
                    .unwrap_or(VerificationMethod::EmailLink),
                parent_identity: req.parent_identity,
            }
        } else {
            ConsentEvent::Rejected {
                method: req.verification_method,
                parent_identity: req.parent_identity,
            }
        };
        let action = event.action();

        let status = apply_event(
            &mut account.coppa_consent,
            event,
            &caller.audit_context(),
            Utc::now(),
        )?;
        self.accounts.save(&mut account).await?;

        record_consent_transition(action);
        tracing::info!(child_id = %account.id, status = %status, "Parental consent verified");

        Ok(status)
    }

    /// Withdraw consent. Only the parent on record may do this.
    pub async fn revoke_consent(
        &self,
        child_email: &str,
        parent_email: &str,
        reason: String,
        caller: &CallerContext,
    ) -> Result<ConsentStatus, ServiceError> {
        let mut account = self.accounts.require_by_email(child_email).await?;

        if !parent_matches(account.stored_parent_email(), parent_email) {
            self.audit
                .log(SecurityAuditLog::parent_email_mismatch(caller, child_email))
                .await;
            return Err(ServiceError::ParentEmailMismatch);
        }

        let status = apply_event(
            &mut account.coppa_consent,
            ConsentEvent::Revoked { reason },
            &caller.audit_context(),
            Utc::now(),
        )?;
        account.kids_mode = true;
        account.account_restricted = true;
        self.accounts.save(&mut account).await?;

        record_consent_transition("revoked");
        tracing::info!(child_id = %account.id, "Parental consent revoked");

        Ok(status)
    }

    fn verification_link(&self, child_email: &str) -> String {
        let query = serde_urlencoded::to_string([("childEmail", child_email)]).unwrap_or_default();
        format!(
            "{}/parental-consent?{}",
            self.verification_base_url.trim_end_matches('/'),
            query
        )
    }

    async fn dispatch_consent_email(&self, parent_email: &str, child_email: &str) {
        let link = self.verification_link(child_email);
        if let Err(e) = self
            .mailer
            .send_consent_request(parent_email, child_email, &link)
            .await
        {
            tracing::warn!(error = %e, "Consent request email could not be sent");
        }
    }
}
