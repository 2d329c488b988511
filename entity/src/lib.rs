//! Table definitions shared by the migration, domain and server crates.

pub mod activities;
pub mod companies;
pub mod contacts;
pub mod deal_stage_changes;
pub mod deal_stages;
pub mod deals;
pub mod email_sequence_enrollments;
pub mod email_sequence_steps;
pub mod email_sequences;
pub mod leads;
pub mod memberships;
pub mod orgs;
pub mod pipelines;
pub mod tasks;
pub mod users;
