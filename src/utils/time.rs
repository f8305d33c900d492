// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Time utilities.
//!
//! Timestamps are seconds since the Unix epoch as `f64`, which is what the
//! event recorder subtracts to get task durations.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Milliseconds between two timestamps, rounded to three decimals.
///
/// The wall clock can step backwards between two readings; such an
/// interval counts as zero.
pub fn elapsed_ms(start: f64, end: f64) -> f64 {
    let ms = ((end - start) * 1000.0 * 1000.0).round() / 1000.0;
    if ms > 0.0 {
        ms
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_ms_rounding() {
        assert_eq!(elapsed_ms(10.0, 10.5), 500.0);
        assert_eq!(elapsed_ms(0.0, 0.0012346), 1.235);
    }

    #[test]
    fn test_clock_stepping_back_gives_zero() {
        assert_eq!(elapsed_ms(100.25, 100.0), 0.0);
        assert!(elapsed_ms(100.25, 100.0).is_sign_positive());
    }

    #[test]
    fn test_now_is_epoch_seconds() {
        assert!(now() > 1_600_000_000.0);
    }
}
