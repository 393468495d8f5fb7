//! Pattern matching engine.
//!
//! This module is the internal entry point for the GLR machinery. The public
//! crate surface (`GlrParser`) wraps it; everything under `src/engine/` is an
//! implementation detail split into focused submodules.
//!
//! ## How the parts work together
//!
//! Searching a token stream is a pipeline:
//!
//! ```text
//! grammar ──── Tables::compile ──────────────── (tables.rs)
//!                     │
//! tokens ─────────────┼─ Search: restart per offset (search.rs)
//!                     v
//!            Engine::run_at (parser.rs)
//!              - reduce closure per lookahead + "$"
//!              - agreement unification on the stack (gss.rs)
//!              - accept harvest, shift, merge forks
//!                     │
//!                     v
//!            dedup via MatchKey (dedup.rs)
//!                     │
//!                     v
//!                Vec<Match>
//! ```
//!
//! The engine leans on the **graph-structured stack**: morphological
//! ambiguity forks the stack instead of failing the parse, and forks that
//! re-converge share their history. Grammar conflicts (shift/reduce,
//! reduce/reduce) are first-class: the compiled tables keep every applicable
//! action and the stack explores them all.
//!
//! ## Responsibilities by module
//!
//! - `tables.rs`: LR(0) item automaton and the multi-action tables.
//! - `gss.rs`: stack nodes, derivation trees, unification at reduce time.
//! - `parser.rs`: the per-offset reduce/accept/shift loop and step budget.
//! - `search.rs`: lazy offset-by-offset driver over a whole stream.
//! - `dedup.rs`: stable keys suppressing re-derived duplicate matches.
//! - `metrics.rs`: optional timing/debug data for runs.
//!
//! ## Debugging
//!
//! Set `SYNTAGMA_DEBUG=1` to print shift/reduce/accept traces.

#[path = "engine/dedup.rs"]
mod dedup;
#[path = "engine/gss.rs"]
mod gss;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/search.rs"]
mod search;
#[path = "engine/tables.rs"]
mod tables;

pub use metrics::{OffsetMetrics, SearchMetrics, SearchReport};
pub(crate) use parser::Engine;
pub use search::Search;
#[allow(unused_imports)]
pub(crate) use tables::{Action, Tables};
