//! OCR banner candidate extraction.
//!
//! Announcement banners usually render the institution name or acronym in
//! full caps. This module preprocesses the banner image, runs Tesseract over
//! it, and reduces the recognized text to a single best-guess label that the
//! resolver uses to disambiguate between harvested "Nome (SIGLA)" pairs.
//!
//! # Tolerance
//!
//! OCR is advisory, never authoritative, and never fatal: environments
//! without a `tesseract` binary get the [`OcrEngine::Disabled`] stub, and any
//! failure inside the real engine (decode, I/O, recognition) degrades to
//! `None`. The rest of the pipeline never branches on OCR availability.
//!
//! # Scoring
//!
//! Candidate lines are scored as
//! `length + 10·(uppercase fraction of letters) − 2·(punctuation count)`:
//! banner names are long, mostly capitalized, and lightly punctuated, while
//! noise lines (dates, decorative text) score lower.

use image::imageops::FilterType;
use image::GrayImage;
use imageproc::contrast::{otsu_level, stretch_contrast, threshold};
use imageproc::filter::median_filter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::utils::norm;

/// Decorative banner phrase that must never become the candidate.
static BANNER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)saiu\s*o\s*edital").unwrap());

/// Punctuation class penalized by the line score.
const PUNCT: &str = ":|/\\.!?,;";

/// Upscale factor applied before recognition; small banner type resolves
/// noticeably better at ~1.6x.
const UPSCALE: f32 = 1.6;

/// OCR capability, resolved once at startup.
pub enum OcrEngine {
    /// Tesseract is on PATH; images are preprocessed and recognized.
    Tesseract(TesseractOcr),
    /// No OCR support; every extraction yields `None`.
    Disabled,
}

impl OcrEngine {
    /// Probe the environment for a usable `tesseract` binary.
    pub fn detect() -> Self {
        match which::which("tesseract") {
            Ok(binary) => {
                info!(binary = %binary.display(), "OCR enabled");
                OcrEngine::Tesseract(TesseractOcr { binary })
            }
            Err(_) => {
                warn!("tesseract not found; running without OCR enrichment");
                OcrEngine::Disabled
            }
        }
    }

    /// An engine that always yields `None`, regardless of the environment.
    pub fn disabled() -> Self {
        OcrEngine::Disabled
    }

    /// Best-guess short label for a banner image, or `None`.
    pub fn candidate(&self, image_bytes: &[u8]) -> Option<String> {
        match self {
            OcrEngine::Disabled => None,
            OcrEngine::Tesseract(engine) => match engine.recognize(image_bytes) {
                Ok(text) => {
                    let picked = pick_candidate(&text);
                    debug!(candidate = ?picked, "OCR candidate");
                    picked
                }
                Err(e) => {
                    debug!(error = %e, "OCR failed; continuing without candidate");
                    None
                }
            },
        }
    }
}

/// The real Tesseract-backed engine.
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    /// Preprocess the image and run Tesseract in single-block mode with the
    /// Portuguese + English dictionaries.
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, Box<dyn Error>> {
        let prepared = preprocess(image_bytes)?;

        let dir = tempfile::tempdir()?;
        let input = dir.path().join("banner.png");
        prepared.save(&input)?;

        let output = Command::new(&self.binary)
            .arg(&input)
            .arg("stdout")
            .args(["-l", "por+eng", "--psm", "6"])
            .output()?;
        if !output.status.success() {
            return Err(format!("tesseract exited with {}", output.status).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Decode and prepare a banner for recognition: upscale, grayscale,
/// autocontrast, 3x3 median despeckle, Otsu binarization.
fn preprocess(image_bytes: &[u8]) -> Result<GrayImage, Box<dyn Error>> {
    let img = image::load_from_memory(image_bytes)?;
    let width = (img.width() as f32 * UPSCALE) as u32;
    let height = (img.height() as f32 * UPSCALE) as u32;
    if width == 0 || height == 0 {
        return Err("image too small to upscale".into());
    }

    let gray = img
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_luma8();
    let gray = autocontrast(&gray);
    let gray = median_filter(&gray, 1, 1);
    let level = otsu_level(&gray);
    Ok(threshold(&gray, level))
}

/// Stretch the full intensity range to 0..=255, like PIL's autocontrast with
/// no cutoff. A flat image is returned unchanged.
fn autocontrast(gray: &GrayImage) -> GrayImage {
    let mut lo = u8::MAX;
    let mut hi = u8::MIN;
    for p in gray.pixels() {
        lo = lo.min(p.0[0]);
        hi = hi.max(p.0[0]);
    }
    if lo >= hi {
        return gray.clone();
    }
    stretch_contrast(gray, lo, hi)
}

/// Reduce recognized text to the final candidate: filter banner noise, score
/// the remaining lines, normalize the winner down to its longest token.
/// Pure, so it is testable without Tesseract.
pub(crate) fn pick_candidate(text: &str) -> Option<String> {
    let mut best: Option<(f64, String)> = None;
    for line in text.lines() {
        let line = norm(line);
        if line.is_empty() || BANNER_RE.is_match(&line) {
            continue;
        }
        let score = score_line(&line);
        // Strictly greater keeps the first line on ties.
        if best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, line));
        }
    }
    normalize_candidate(&best?.1)
}

/// `length + 10·frac_uppercase − 2·punctuation`.
fn score_line(line: &str) -> f64 {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    let caps = line.chars().filter(|c| c.is_uppercase()).count();
    let frac_caps = if letters > 0 {
        caps as f64 / letters as f64
    } else {
        0.0
    };
    let penalty = line.chars().filter(|c| PUNCT.contains(*c)).count();
    line.chars().count() as f64 + 10.0 * frac_caps - 2.0 * penalty as f64
}

/// Uppercase, keep only ASCII letters, hyphen, space, then keep the single
/// longest whitespace token. Accepts only results of 2..=80 characters.
fn normalize_candidate(line: &str) -> Option<String> {
    let cleaned: String = line
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || *c == '-' || *c == ' ')
        .collect();
    let token = cleaned
        .split_whitespace()
        .max_by_key(|t| t.chars().count())
        .map(str::to_string)
        .unwrap_or(cleaned);

    let len = token.chars().count();
    (2..=80).contains(&len).then_some(token)
}
