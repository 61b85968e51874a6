//! End-to-end tests driving the `extbuild` binary with `/bin/sh` as toolchain.

#![cfg(unix)]

mod all_tests;
mod clean_tests;
mod config_tests;
