//! # tagmerge
//!
//! Duplicate-tag resolution for a media-archive host.
//!
//! tagmerge pages through the host's tag catalog, indexes names and
//! translations, and plans which tags are duplicates of which. The plan is
//! either reported (dry run, the default) or applied through the host's
//! merge operation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │  Loader  │──▶│  Index   │──▶│ Planner  │──▶│ Applier  │
//! │tags.list │   │ names +  │   │ chains + │   │tags.merge│
//! │  paged   │   │ transl.  │   │  cycles  │   │ (opt-in) │
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘
//!       ▲                                            │
//!       └────────────── TagHost (http / stdio) ◀─────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tagmerge plan                         # dry run, print the plan summary
//! tagmerge plan --export plan.json      # full plan as JSON
//! tagmerge apply --max-merges 50        # merge the first 50 entries
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`normalize`] | Record coercion and key normalization |
//! | [`index`] | Translation and candidate indexes |
//! | [`loader`] | Paged catalog loading |
//! | [`planner`] | Edge proposal, chain resolution, filtering |
//! | [`applier`] | Plan execution |
//! | [`pipeline`] | End-to-end run orchestration |
//! | [`host`] | Host trait and in-memory host |
//! | [`host_http`] | JSON-over-HTTP host binding |
//! | [`host_stdio`] | Line-delimited JSON-RPC host binding |
//! | [`progress`] | Progress and preview reporting |
//! | [`export`] | Plan export |

pub mod applier;
pub mod config;
pub mod export;
pub mod host;
pub mod host_http;
pub mod host_stdio;
pub mod index;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod planner;
pub mod progress;
