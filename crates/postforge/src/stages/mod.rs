//! The five content stages. Each reads a `&PostState` and returns the delta
//! it contributes; output is handled by [`crate::output`].

pub mod draft;
pub mod illustration;
pub mod metadata;
pub mod outline;
pub mod parse;
pub mod research;

pub use draft::section_word_budget;
pub use metadata::{derive_slug, slugify};
