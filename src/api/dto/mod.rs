//! Data Transfer Objects for REST request/response serialization.
//!
//! All amounts are serialized as JSON strings to prevent precision loss on
//! u128 values. Request DTOs carry raw strings; handlers parse them into
//! domain types.

pub mod common_dto;
pub mod distribution_dto;
pub mod ledger_dto;
pub mod stake_dto;

pub use common_dto::*;
pub use distribution_dto::*;
pub use ledger_dto::*;
pub use stake_dto::*;
