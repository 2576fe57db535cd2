use image::{GrayImage, RgbaImage};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde_derive::*;
use tracing::{debug, trace};

use super::{engine::TextRecognizer, variants};
use crate::calibration::READING_RE;

/// Tuning for [`OcrConsensus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Seed for the candidate shuffle.
    pub seed: u64,
    /// Accepted readings needed before the first vote.
    pub initial_required: usize,
    /// Added to the requirement after every inconclusive vote.
    pub required_step: usize,
    pub thresholds: Vec<u8>,
    pub upscale: u32,
    pub padding: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            seed: 0,
            initial_required: 10,
            required_step: 10,
            thresholds: (100..220).step_by(20).collect(),
            upscale: 8,
            padding: 16,
        }
    }
}

/// Outcome of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consensus {
    Success(String),
    Failure,
}

impl Consensus {
    pub fn text(&self) -> Option<&str> {
        match self {
            Consensus::Success(text) => Some(text),
            Consensus::Failure => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Consensus::Success(text) => Some(text),
            Consensus::Failure => None,
        }
    }
}

/// Occurrence count per accepted reading. Ties between
/// equally frequent readings go to the one seen first.
#[derive(Debug, Default, Clone)]
pub struct Tally {
    counts: Vec<(String, usize)>,
    total: usize,
}

impl Tally {
    pub fn record(&mut self, reading: String) {
        self.total += 1;
        match self.counts.iter_mut().find(|(r, _)| *r == reading) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((reading, 1)),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// The (up to) `n` most frequent readings, most frequent
    /// first.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<_> = self
            .counts
            .iter()
            .map(|(r, c)| (r.as_str(), *c))
            .collect();
        // stable: first seen wins ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Vote once more than `required` readings are in: the
    /// leader wins if it holds over 75% of them or is the only
    /// reading seen.
    fn vote(&self, required: usize, step: usize) -> State {
        if self.total <= required {
            return State::Collecting { required };
        }

        let leaders = self.most_common(2);
        let (top, top_count) = leaders[0];
        trace!("vote at {} readings: {:?}", self.total, leaders);
        if self.distinct() == 1 || top_count * 4 > self.total * 3 {
            State::Done(top.to_owned())
        } else {
            State::Collecting {
                required: required + step,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Collecting { required: usize },
    Done(String),
}

/// Majority vote over many OCR passes of one glyph crop.
pub struct OcrConsensus {
    recognizer: Box<dyn TextRecognizer>,
    config: ConsensusConfig,
    rng: StdRng,
}

impl OcrConsensus {
    pub fn new(recognizer: Box<dyn TextRecognizer>, config: ConsensusConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        OcrConsensus {
            recognizer,
            config,
            rng,
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Read the legend numeral in `crop`.
    ///
    /// Renders the crop every way [`variants::plan`] lists,
    /// in shuffled order, until the vote settles or the
    /// variants run out. Never fails; an unreadable crop gives
    /// [`Consensus::Failure`].
    pub fn extract(&mut self, crop: &RgbaImage) -> Consensus {
        let mut plan = variants::plan(&self.config.thresholds);
        plan.shuffle(&mut self.rng);

        let (upscale, padding) = (self.config.upscale, self.config.padding);
        let candidates = plan
            .into_iter()
            .map(move |variant| variant.render(crop, upscale, padding));
        self.vote(candidates)
    }

    /// Run the vote over already rendered candidates, in the
    /// given order.
    pub fn vote<I>(&mut self, candidates: I) -> Consensus
    where
        I: IntoIterator<Item = GrayImage>,
    {
        let mut candidates = candidates.into_iter();
        let mut tally = Tally::default();
        let mut state = State::Collecting {
            required: self.config.initial_required,
        };
        let mut passes = 0usize;

        while let State::Collecting { required } = state {
            let candidate = match candidates.next() {
                Some(candidate) => candidate,
                None => break,
            };
            passes += 1;

            let text = match self.recognizer.recognize(&candidate) {
                Ok(text) => normalize(&text),
                Err(e) => {
                    debug!("recognition failed: {:#}", e);
                    continue;
                }
            };
            if !READING_RE.is_match(&text) {
                trace!("discarding {:?}", text);
                continue;
            }

            tally.record(text);
            state = tally.vote(required, self.config.required_step);
        }

        match state {
            State::Done(text) => {
                debug!(
                    "consensus on {:?} after {} passes ({} accepted)",
                    text,
                    passes,
                    tally.total()
                );
                Consensus::Success(text)
            }
            State::Collecting { .. } => match tally.most_common(1).first() {
                Some(&(text, count)) => {
                    debug!(
                        "no consensus after {} passes, falling back to {:?} ({}/{})",
                        passes,
                        text,
                        count,
                        tally.total()
                    );
                    Consensus::Success(text.to_owned())
                }
                None => {
                    debug!("no readable text in {} passes", passes);
                    Consensus::Failure
                }
            },
        }
    }
}

/// Strip whitespace and line breaks OCR puts around text.
fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
