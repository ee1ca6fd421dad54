//! HTTP gateway for the swapmatch substitution service.
//!
//! This crate is primarily used by the `swapmatch` server binary.

pub mod gateway;
