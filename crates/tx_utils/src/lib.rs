#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod tag_table;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use tag_table::{TagLookup, TagTable};
