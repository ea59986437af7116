pub mod caller;
pub mod gating;
pub mod identity;

pub use caller::caller_context;
pub use gating::{
    require_betting_access, require_identity, require_payments_access, sanitize_content,
    ResolvedUser,
};
pub use identity::USER_ID_HEADER;
