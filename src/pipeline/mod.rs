// End-to-end workflows that tie the subsystems together.

pub mod analyze;
pub mod sweep;
