// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Telemlab
//!
//! `telemlab` ingests network performance-test artifacts, GPCNET benchmark
//! console logs and switch/port counter CSV dumps, and turns them into
//! uniformly structured, queryable records for downstream reporting.
//!
//! This crate contains the main library logic for the `telem` CLI, but its
//! core modules (`gpcnet`, `counters`, `series`) could be used independently.
//!
//! ## Core Modules
//!
//! * [`coerce`]: Converts a raw text cell to the most specific of integer,
//!   float, or text. Leaf dependency of both parsers.
//! * [`gpcnet`]: Line-classification parser turning a benchmark log with
//!   mixed free text, ASCII-table borders, and tabular rows into a nested
//!   [`gpcnet::LogReport`].
//! * [`counters`]: Counter CSV parser building the four-level hierarchy
//!   device -> iteration -> port -> VL -> attribute, with query accessors.
//! * [`series`]: Derives ordered per-iteration series from the hierarchy,
//!   memoized in a caller-owned [`series::SeriesCache`].
//! * [`report`]: Thin consumers of the parsed structures: JSON and CSV
//!   exports, summary statistics, and the per-coordinate series export.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`config`]: Layered settings (defaults, `telem.toml`, `TELEM_*` env,
//!   CLI overrides) for report generation.
//! * [`error`]: Defines the custom error types and the warning collector.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod cli;
pub mod coerce;
pub mod config;
pub mod counters;
pub mod error;
pub mod gpcnet;
pub mod logging;
pub mod report;
pub mod series;
