//! Stylize pipeline
//!
//! The compute side of the system: validates a request, marshals pixels to
//! a tensor, delegates the forward pass over the bridge, and turns the
//! result back into a displayable buffer. Results of superseded submissions
//! are discarded by generation.

pub mod generation;
pub mod request;
pub mod stylizer;

pub use generation::{Generation, LatestOutput, Submission};
pub use request::StyleRequest;
pub use stylizer::Stylizer;
