//! Pipeline stages for page-to-record extraction.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! the others and a stage can be swapped (another PDF backend, another model
//! provider) behind its trait.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ encode ──▶ llm ──▶ parse ──▶ Record
//! (pdfium)   (base64)   (VLM)   (JSON)
//! ```
//!
//! 1. [`source`] — read the one scanned image embedded in a page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`encode`] — PNG-encode and base64-wrap the image for the request body
//! 3. [`llm`]    — send image + extraction prompt, receive a response
//!    envelope; the only stage with network I/O
//! 4. [`parse`]  — isolate the JSON array in the answer and validate each
//!    object into a record

pub mod encode;
pub mod llm;
pub mod parse;
pub mod source;
