pub mod content;
pub mod data_rights;
pub mod database;
pub mod email;
pub mod error;
pub mod gating;
pub mod guardian;
pub mod lifecycle;
pub mod metrics;
pub mod repository;
pub mod restrictions;
pub mod sanitizer;
pub mod security_audit;
pub mod store;

pub use content::{ContentCatalog, StaticContentCatalog};
pub use data_rights::DataRightsService;
pub use database::MongoDb;
pub use email::{ConsentMailer, LoggingMailer, MockMailer, SmtpMailer};
pub use error::ServiceError;
pub use lifecycle::{ConsentLifecycleManager, VerifyConsent};
pub use repository::AccountRepository;
pub use security_audit::{SecurityAuditLog, SecurityAuditService, SecurityEventType};
pub use store::{ChildStore, ComplianceLog, InMemoryStore};
