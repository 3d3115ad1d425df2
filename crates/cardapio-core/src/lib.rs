//! Weekly meal plans generated by a language model.
//!
//! A [`PlanAssembler`](assemble::PlanAssembler) sends a prompt through a
//! retrying [`ModelClient`](llm::ModelClient), cleans and decodes the reply,
//! validates it against the plan schema, tallies a shopping list, and writes
//! the results to an output directory.

pub mod assemble;
pub mod emit;
pub mod llm;
pub mod locale;
pub mod plan;
pub mod prompt;
pub mod sanitize;

pub use assemble::{AssembleError, AssemblyReport, PlanAssembler, Stage};
pub use emit::{EmitError, OutputDir};
pub use locale::DayLocale;
