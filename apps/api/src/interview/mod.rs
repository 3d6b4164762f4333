// Mock interview pipeline: form validation, question generation, answer scoring,
// and the flow that sequences them against the record store.
// All AI calls go through the `AiService` trait — no direct HTTP calls here.

pub mod evaluator;
pub mod flow;
pub mod generator;
pub mod handlers;
pub mod phase;
pub mod preview;
pub mod prompts;
pub mod schema;
pub mod validation;
