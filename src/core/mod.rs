//! # Core Widget Logic
//!
//! This module contains the chat widget's dispatch and resilience logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Dispatcher (update)  │
//!                    │  • RateLimiter          │
//!                    │  • Session / Typing     │
//!                    │  • Toggle               │
//!                    └───────────┬─────────────┘
//!                                │ Presenter trait
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Console   │      │ Transcript │      │   Web      │
//!     │ (stdout)   │      │ (headless) │      │  (future)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`dispatcher`]: `MessageDispatcher` and its `update()` transition function
//! - [`action`]: the `Action` / `Effect` vocabulary of `update()`
//! - [`presenter`]: the presentation surface the core drives

pub mod action;
pub mod config;
pub mod dispatcher;
pub mod presenter;
pub mod rate_limiter;
pub mod session;
pub mod toggle;
pub mod typing;
