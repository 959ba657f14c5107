//! SeaORM table models
//!
//! Row shapes of the `tickets` and `jobs` tables. Domain types live in
//! `domain::entities`; adapters convert between the two.

pub mod jobs;
pub mod tickets;
