//! Route modules for the Verifile server

pub mod files;
pub mod health;
