//! Pipeline stages for building a bilingual parallel text.
//!
//! Each submodule implements exactly one step, and data only ever flows
//! to the right:
//!
//! ```text
//! extract ──▶ normalize ──▶ segment ──▶ translate ──▶ table ──▶ render
//! (pdfium)    (regex)       (regex)     (backend)     (layout)  (pdfium)
//! ```
//!
//! 1. [`extract`]   — read up to `limit` pages (PDF) or lines (text), with
//!    page markers; pdfium work runs in `spawn_blocking`
//! 2. [`normalize`] — form feeds to the break marker, whitespace collapsed
//! 3. [`segment`]   — sentence or speaker-turn units, numbered from 1
//! 4. [`translate`] — sequential backend calls with cooldown, retry and
//!    quota halt; the only stage with network I/O
//! 5. [`table`]     — aligned rows and a pure page layout
//! 6. [`render`]    — draw the layout into a PDF and write it atomically

pub mod extract;
pub mod normalize;
pub mod render;
pub mod segment;
pub mod table;
pub mod translate;
