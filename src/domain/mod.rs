pub mod account;
pub mod authz;
pub mod ports;
pub mod transaction;
pub mod wallet;
