//! Installed applications

pub mod tracker;
