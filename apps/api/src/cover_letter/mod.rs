// Cover letter: one streaming-generation call relayed to the caller chunk by chunk,
// cut off at a hard wall-clock deadline.

pub mod generator;
pub mod handlers;
pub mod prompts;
