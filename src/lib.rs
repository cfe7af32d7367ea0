#![crate_name = "geopop"]
//! Geographic Population Structure (GPS) prediction.
//!
//! Given a reference panel of populations with known coordinates and
//! genetic admixture profiles, the pipeline calibrates a linear relation
//! between genetic and geographic distance and locates each test
//! individual by weighted interpolation over its genetically nearest
//! reference populations (Elhaik et al., 2014).
//!
//! The flow is strictly forward: [`panel`] loads the three input tables,
//! [`distance`] builds the pairwise matrices, [`calibrate`] fits the
//! model once, [`predict`] maps every individual to a coordinate, and
//! [`report`] emits the flat result table.

pub mod calibrate;
pub mod distance;
pub mod error;
pub mod panel;
pub mod predict;
pub mod report;

pub use calibrate::CalibrationModel;
pub use error::GeopopError;
pub use panel::{ReferencePanel, TestIndividual};
pub use predict::PredictionResult;
