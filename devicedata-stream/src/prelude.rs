// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Prelude module re-exporting all commonly used traits and types.
//!
//! ```ignore
//! use devicedata_stream::prelude::*;
//!
//! let converted = records
//!     .self_join(DualBolusDetector)
//!     .rename_vendor_fields(options.clone())
//!     .derive_display_values(options);
//! ```
//!
//! # Contents
//!
//! ## Extension Traits (Operators)
//!
//! - [`SelfJoinExt`] - Join split records within one stream
//! - [`NormalizeBolusExt`] - Vendor field renaming and display-value derivation
//! - [`ConvertBolusExt`] - The complete bolus conversion step
//!
//! ## Join Kinds
//!
//! - [`Detector`] / [`JoinSession`] - Pluggable detect → accumulate → flush logic
//! - [`DualBolusDetector`] - Dual-wave bolus reconciliation

pub use crate::bolus::DualBolusDetector;
pub use crate::convert_bolus::ConvertBolusExt;
pub use crate::join_session::{Detector, JoinSession};
pub use crate::normalize::NormalizeBolusExt;
pub use crate::options::ConvertBolusOptions;
pub use crate::self_join::SelfJoinExt;
