//! Reading the legend numerals.
//!
//! A single OCR pass over a small, noisy crop is unreliable.
//! [`OcrConsensus`] instead renders the crop many different
//! ways ([`variants`]), runs each rendering through a
//! [`TextRecognizer`] and accepts a reading only once a clear
//! majority of the well-formed results agree on it.
pub mod consensus;
pub mod engine;
pub mod variants;

pub use consensus::{Consensus, ConsensusConfig, OcrConsensus, Tally};
#[cfg(feature = "ocr")]
pub use engine::TesseractEngine;
pub use engine::{TextRecognizer, WHITELIST};
