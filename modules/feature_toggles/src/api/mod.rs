//! API layer - in-process client and REST adapter

pub mod native;
pub mod rest;
