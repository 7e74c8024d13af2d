//! Classify callables by their source form, rebuild them, and tag their
//! algebraic capabilities.
//!
//! # Architecture
//!
//! ```text
//! Callable ──> Classifier ──> Descriptor ──> Reconstructor ──> Callable
//!  (source)    (rules by      {kind, params,  (StrategyTable:
//!              priority)       body}           builder per kind)
//! ```
//!
//! Only ordinary functions are decomposed. Async functions, generators and
//! arrow functions are recognized and reported as
//! [`Error::Unsupported`]; descriptors of those kinds can still be built by
//! hand and reconstructed through their strategies.
//!
//! # Example
//!
//! ```
//! use pureform::{Classifier, Descriptor, Reconstructor};
//! use pureform_script::Value;
//!
//! let reconstructor = Reconstructor::default();
//! let add = reconstructor.realm().function("function add(a, b) { return a + b; }").unwrap();
//!
//! let descriptor = Classifier::default().classify(&add).unwrap();
//! assert_eq!(descriptor, Descriptor::ordinary(["a", "b"], " return a + b; "));
//!
//! let rebuilt = reconstructor.reconstruct(&descriptor).unwrap();
//! assert_eq!(rebuilt.invoke(&[Value::from(2), Value::from(3)]).unwrap(), Value::from(5));
//! ```
//!
//! Capability tags are separate from classification: see [`capability`].

pub mod capability;
pub mod classify;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod kind;
pub mod reconstruct;
pub mod strategy;

pub use capability::{
    Capabilities, Capability, Tagged, associative, commutative, commutative_associative, pure,
    tag,
};
pub use classify::{Classifier, ExtractionMode, SourceText};
pub use config::{ConfigError, PureformConfig};
pub use descriptor::Descriptor;
pub use error::{Error, Result};
pub use kind::SyntaxKind;
pub use reconstruct::Reconstructor;
pub use strategy::{Builder, StrategyTable};
