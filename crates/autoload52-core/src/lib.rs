//! Core types and utilities for autoload52.
//!
//! This crate provides the foundational types shared by the generator and
//! the CLI:
//! - Package metadata and autoload declarations
//! - The installed-repository reader that produces a package map
//! - Generator configuration with layered sources
//! - JSON helpers
//! - Error types

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
mod installed;
mod json;
mod package;

pub use config::{EnvVar, GeneratorConfig, ManifestConfig, RootManifest};
pub use error::{Error, ErrorCode, Result};
pub use installed::{InstalledRepository, build_package_map};
pub use json::{from_json, from_json_slice, to_json_pretty};
pub use package::{AutoloadDeclaration, NamespaceDirs, Package, PackageMap, PackageMapEntry};

/// Global allocator using mimalloc for high performance.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
