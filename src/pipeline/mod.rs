//! Pipeline stages for resume screening.
//!
//! ```text
//!                       ┌─ text_layer ───────────────────────┐
//! input ──▶ document ──▶┤                                    ├─▶ classify ──▶ normalize
//! (path/URL/upload)     └─ ocr (render ▶ encode ▶ llm) ──────┘   (llm, JSON)   (tolerant parse)
//!                          only when the text layer is empty
//! ```
//!
//! 1. [`input`]      — stage a path, URL or upload as a local file
//! 2. [`document`]   — page count, text layer and rasteriser over pdfium
//! 3. [`text_layer`] — concatenate embedded page text
//! 4. [`ocr`]        — per-page vision transcription, fanned out and
//!    reassembled in page order
//! 5. [`encode`]     — PNG + base64 for the vision request
//! 6. [`llm`]        — the model seam; the only stage with network I/O
//! 7. [`classify`]   — the rubric prompt in JSON mode
//! 8. [`normalize`]  — parse the answer or keep it raw

pub mod classify;
pub mod document;
pub mod encode;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod ocr;
pub mod text_layer;
