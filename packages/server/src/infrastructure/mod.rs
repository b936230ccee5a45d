//! Infrastructure layer: storage and wire-format adapters.

pub mod dto;
pub mod repository;
