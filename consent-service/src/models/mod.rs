pub mod caller;
pub mod child_account;
pub mod consent;
pub mod deletion_log;

pub use caller::CallerContext;
pub use child_account::{AccessRestrictions, ChildAccount, DeletionCode, Preferences, Theme};
pub use consent::{
    apply_event, AuditContext, AuditEntry, ConsentEvent, ConsentRecord, ConsentStatus,
    InvalidTransition, VerificationMethod,
};
pub use deletion_log::{ConfirmationMethod, DeletionLog, DeletionStatus};
