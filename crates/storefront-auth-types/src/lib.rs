//! Auth types shared by the auth service and its clients.
//!
//! Provides session-token validation, cookie builders, and the JSON wire contract.

pub mod cookie;
pub mod token;
pub mod wire;
