//! Payment sheet scenario tests
//!
//! Shared setup lives in [`init_pure_tests`]; the scenarios themselves are in
//! `tests/`.
