#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! Library crate backing the `pefti` binary. Split out so the end-to-end
//! scenarios in `tests/` can drive the real pipeline components without
//! going through the CLI.

#[macro_use]
mod modules;

include_modules!();
