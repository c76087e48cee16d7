//! # tff
//!
//! A parser and dependency resolver for the TFF token file format.
//!
//! TFF files define named, possibly multi-valued tokens whose values may
//! reference other tokens with `{name}` placeholders. The library parses
//! the format (including the `FILE`/`SFILE`/`URL` loaders and nested
//! imports), builds the dependency graph between tokens, expands iterated
//! tokens into every combination of their values, and substitutes
//! references until every value is concrete.
//!
//! A quick tour:
//!
//! ```text
//! sample  = a, b            # an iterated token
//! outdir  = /data/{sample}  # a value referencing another token
//! IMPORT(common.tff)        # nested token files
//! reads   = FILE({outdir}/reads.txt)
//! ```
//!
//! Parsing yields a [`tff::TokenSet`]; [`tff::TokenSet::resolve`] returns
//! one fully concrete set per combination of the iterated values.

pub mod tff;
