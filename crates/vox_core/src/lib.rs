//! Vox Core - volume data and render configuration.
//!
//! This crate provides the renderer-agnostic inputs of the light-transport
//! engine:
//!
//! - **Volume data**: a dense scalar grid with trilinear sampling and
//!   finite-difference gradients, loadable from raw files
//! - **Transfer functions**: intensity to colour/opacity mapping, with a
//!   parser for the plain-text table format
//! - **Settings**: the immutable per-pass parameter bag, loadable from JSON
//!
//! # Example
//!
//! ```ignore
//! use vox_core::{Settings, TransferFunctionFile};
//!
//! let mut settings = Settings::load("render.json")?;
//! TransferFunctionFile::load("skull.tf")?.apply_to(&mut settings);
//! settings.validate()?;
//! ```

pub mod settings;
pub mod transfer_function;
pub mod volume;

// Re-export commonly used types
pub use settings::{
    BracketTable, PathNormalization, RenderMode, Settings, SettingsError, SettingsResult, VolumeSampler,
};
pub use transfer_function::{
    TfNode, TransferFunction, TransferFunctionError, TransferFunctionFile, TransferFunctionResult,
};
pub use volume::{RawFormat, Volume, VolumeError, VolumeResult};
