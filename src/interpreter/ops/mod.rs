pub mod access;
pub mod assign;
pub mod structs;

pub use access::{AccessDirection, MemberAccess};
