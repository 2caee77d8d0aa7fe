//! Row structs and DTOs.

pub mod submission;
