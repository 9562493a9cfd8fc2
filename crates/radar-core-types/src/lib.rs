//! Core types shared across the Radar client crates
//!
//! This crate provides the foundational vocabulary used by both the
//! transport binding and the domain operations:
//!
//! - **Schema generations**: the legacy/v2 table-layout selector
//! - **Membership**: the participant state machine
//! - **Status constants**: event and invite status sentinels

pub mod generation;
pub mod membership;
pub mod status;

pub use generation::SchemaGeneration;
pub use membership::MembershipStatus;
pub use status::InviteStatus;
