//! Tri-mode grammar execution. One declarative grammar drives three
//! operations over the same event-trace representation:
//!
//! - **parse**: text in, trace out (with packrat memoization and Warth-style
//!   seed growth for left-recursive rules);
//! - **unparse**: trace in, text out (token merge guards decide spacing);
//! - **match**: trace in, accept/reject.
//!
//! Build a [`grammar::Grammar`] with [`grammar::GrammarBuilder`], then run
//! it through an [`engine::Engine`].

pub mod engine;
pub mod event;
pub mod fault;
pub mod grammar;
pub mod memo;
pub mod report;
pub mod session;
pub mod state;
pub mod tree;

mod backtrack;
mod decompose;
mod leftrec;
