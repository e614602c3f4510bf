//! Mosaic Loader - Page loading for markup-entry applications
//!
//! An application registered with a page entry is loaded by fetching its
//! markup, stripping out every style, stylesheet link and script, and handing
//! what is left to the application's container at mount time.
//!
//! - Resources marked with the global marker are appended to the host head
//!   once for the whole host, deduplicated across applications.
//! - Other resources are fetched per application, deduplicated within it,
//!   then appended (styles) or executed (scripts).
//! - Scripts publish the application's lifecycle into the [`GlobalScope`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod document;
pub mod executor;
pub mod extract;
pub mod fetch;
pub mod loader;
pub mod markup;
pub mod registry;

pub use document::{HeadNode, HostDocument, MemoryDocument};
pub use executor::{GlobalScope, ScriptContext, ScriptExecutor, UnsupportedExecutor};
pub use extract::{Extracted, Extractor, ResourceSource, ScriptPayload, StylePayload};
pub use fetch::{Fetcher, HttpFetcher};
pub use loader::{validate_entry, LoadedResources, LoaderConfig, ResourceLoader};
pub use registry::LoadedUrls;
