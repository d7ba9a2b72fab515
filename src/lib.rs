// Shared between the offergen binary and its integration tests
pub mod commands;
