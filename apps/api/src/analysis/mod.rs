// Ticket Analysis: schema definition, prompt building, response coercion, and
// the request pipeline tying them to the completion client.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod coercion;
pub mod handlers;
pub mod prompts;
pub mod schema;
pub mod service;
