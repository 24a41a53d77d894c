/*!
 * # tiergrid - tiered time-aligned annotations
 *
 * A Rust library for reading, editing and writing Praat TextGrid documents.
 *
 * ## Features
 *
 * - Interval and point tiers with validated, ordered entries
 * - Four dialects:
 *   - Praat long text form
 *   - Praat short text form
 *   - Minimal JSON keyed by tier name
 *   - Structural JSON with per-tier bounds
 * - Immutable edit operations (crop, shift, erase, insert space, set operations)
 * - KlattGrid documents with nested formant tiers
 * - Boundary alignment against other tiers or audio zero crossings
 * - Pitch, intensity and formant measurement through Praat
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timing`: Shared epsilon comparisons and number formatting
 * - `textgrid`: The annotation model:
 *   - `textgrid::entry`: Interval and point entries
 *   - `textgrid::interval_tier`, `textgrid::point_tier`, `textgrid::tier`: Tier kinds
 *   - `textgrid::document`: The `Textgrid` document and its edits
 *   - `textgrid::query`, `textgrid::alignment`: Extraction and boundary snapping
 * - `io`: Format detection, load and save options, dialect parsers and writers
 * - `klattgrid`: KlattGrid model, reader and writer
 * - `audio`: Audio collaborator and WAV loading
 * - `praat`: External analysis through the Praat program
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `app_controller`: Command line workflows
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod errors;
pub mod file_utils;
pub mod io;
pub mod klattgrid;
pub mod praat;
pub mod textgrid;
pub mod timing;

// Re-export main types for easier usage
pub use app_config::Config;
pub use audio::{AudioSource, SampleBuffer, WavAudio};
pub use errors::{AppError, AudioError, ExternalToolError, TextgridError};
pub use io::{DuplicateNamesMode, LoadOptions, SaveOptions, TextgridFormat, open_textgrid, parse_textgrid, save_textgrid};
pub use klattgrid::Klattgrid;
pub use praat::{AcousticAnalyzer, PraatRunner};
pub use textgrid::{Interval, IntervalTier, Point, PointTier, Textgrid, Tier, TierKind};
