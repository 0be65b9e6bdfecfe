// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the crate.
//!
//! - [`Action`]: the fixed command vocabulary
//! - [`TemperatureReading`]: parsed `GET_TEMP` replies

mod action;
mod temperature;

pub use action::Action;
pub use temperature::TemperatureReading;
