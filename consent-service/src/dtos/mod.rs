pub mod accounts;
pub mod consent;
pub mod data_rights;
pub mod payments;

