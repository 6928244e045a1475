//! # Corpus Mill
//!
//! A multi-format document extraction and normalization pipeline for
//! search and RAG.
//!
//! Corpus Mill ingests slide decks (PPTX), PDFs, and Markdown, and
//! normalizes each document into one shared record: text in reading
//! order, embedded assets written to a media directory, and structural
//! metadata. Records are validated, serialized as a JSON corpus, and
//! corpora from multiple runs can be merged into one.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │  Extractors  │──▶│  Validate    │──▶│ search-index.json │
//! │ PPTX/PDF/MD  │   │  Serialize   │   │   + media/        │
//! └──────────────┘   └──────────────┘   └─────────┬─────────┘
//!                                                 │
//!                                           ┌─────▼─────┐
//!                                           │   merge   │
//!                                           └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cmill extract ./docs --out ./out     # normalize a directory
//! cmill merge a.json b.json --out all.json
//! cmill validate ./out/search-index.json
//! cmill stats ./out/search-index.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Normalized record and format tags |
//! | [`assets`] | Embedded asset persistence |
//! | [`extract_pptx`] | Slide-deck extractor |
//! | [`extract_pdf`] | PDF extractor |
//! | [`extract_md`] | Markdown extractor |
//! | [`extractor`] | Format dispatch |
//! | [`validate`] | Required-field validation |
//! | [`serializer`] | Corpus JSON encode/decode |
//! | [`merge`] | Best-effort corpus merge |
//! | [`pipeline`] | Batch extraction driver |
//! | [`index`] | Remote collaborator seams |

pub mod assets;
pub mod config;
pub mod extract_md;
pub mod extract_pdf;
pub mod extract_pptx;
pub mod extractor;
pub mod index;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod serializer;
pub mod validate;
