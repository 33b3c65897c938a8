//! Domain models shared across the platform.

pub mod attendance;
pub mod contact;
pub mod events;
pub mod school;
pub mod school_class;
pub mod student;
pub mod sync;
