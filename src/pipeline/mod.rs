//! Pipeline stages between user input and generated markup.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ llm ──▶ postprocess
//! (file/URL   (VLM)    (fence stripping)
//!  → base64)
//! ```
//!
//! 1. [`intake`]: validate the declared media type and read a reference
//!    image into memory as base64
//! 2. [`llm`]: layout synthesis and prose analysis; the only stage with
//!    network I/O
//! 3. [`postprocess`]: strip code fences from model output and tags from
//!    narrative text

pub mod intake;
pub mod llm;
pub mod postprocess;
