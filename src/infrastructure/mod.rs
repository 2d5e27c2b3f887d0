//! Infrastructure adapters (Hexagonal Architecture)
//!
//! Concrete implementations of the domain ports:
//! - `runner`: subprocess test execution
//! - `completion`: Anthropic messages API client
//! - `store`: JSON-file session persistence
//! - `tracker`: Linear issue creation
//! - `approval`: terminal approve/reject/quit prompts
//!
//! Plus the ambient concerns every command needs: configuration loading
//! (`config`) and tracing setup (`logging`).

pub mod approval;
pub mod completion;
pub mod config;
pub mod logging;
pub mod runner;
pub mod store;
pub mod tracker;
