// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Flow-controlled command relay for driving an external molecular
//! renderer.
//!
//! The host application describes what it wants drawn (structures, residue
//! selections, contact edges, triangles, superpositions) and molrelay turns
//! each request into renderer commands, delivers them in numbered batches
//! through a shared command file, and blocks until the renderer
//! acknowledges the batch.
//!
//! # Key entry points
//!
//! - [`relay::Relay`] - the facade host applications drive
//! - [`session::Session`] - renderer process lifecycle
//! - [`channel::CommandChannel`] - acknowledged batch delivery
//! - [`compact::EdgeCompactor`] - packs large edge sets into few commands
//! - [`options::RelayOptions`] - runtime configuration, loadable from TOML
//!
//! # Logging
//!
//! Everything is reported through the [`log`] facade. Renderer output is
//! forwarded under the [`session::RENDERER_LOG_TARGET`] target so hosts can
//! filter it separately.

pub mod channel;
pub mod command;
pub mod compact;
pub mod error;
pub mod naming;
pub mod options;
pub mod relay;
pub mod session;
pub mod vocabulary;

pub use error::RelayError;
pub use relay::{Delivery, Receipt, Relay};
