//! Near-field evaluation of the modified Helmholtz kernel for boundary element methods
#![cfg_attr(feature = "strict", deny(warnings))]
pub mod c_abi;
pub mod error;
pub mod geometry;
pub mod helpers;
pub mod modified_helmholtz_3d;
pub mod near_field;
pub mod traits;
pub mod types;
