//! keychart CLI library - command implementations for the `keychart` binary.

pub mod commands;
