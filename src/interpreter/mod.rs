//! Type and value engine
//!
//! This module provides the evaluation-time operations an expression
//! evaluator calls into:
//! - [`engine`]: the [`Engine`](engine::Engine) holding a session's target
//!   profile, type registry, memory backend and diagnostics
//! - [`errors`]: runtime errors, warnings and the diagnostics sink
//! - [`type_system`]: casts and assignment compatibility
//! - [`strings`]: reading C strings out of target memory
//! - [`ops`]: member access and member write-back
//!
//! # Error Model
//!
//! Every operation returns `Result<_, RuntimeError>`. Errors propagate with
//! `?` to a single recovery boundary, [`Engine::recover`](engine::Engine::recover),
//! which records and logs them.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod ops;
pub mod strings;
pub mod type_system;
