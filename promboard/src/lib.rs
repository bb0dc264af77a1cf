//! The promboard dashboard generation tool.
//!
//! This library supports the promboard binary found elsewhere in this
//! project. It scrapes a Prometheus metrics exposition, classifies each
//! metric family by its statistical type, synthesizes a query expression
//! for it, arranges the resulting panels into a two-level group hierarchy
//! and renders a dashboard document.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod group;
pub mod panel;
pub mod render;
pub mod scrape;
