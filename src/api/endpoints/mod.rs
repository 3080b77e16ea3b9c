//! Endpoint handlers, one module per route.

pub mod chat;
pub mod health;
pub mod learn;
pub mod predict;
pub mod report;
pub mod result;

#[cfg(test)]
pub(crate) mod test_support;
