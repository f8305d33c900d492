// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use proxy_probe::transport::codec::parse_response;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic, and a body that parses once parses the same way again.
    if let Ok(first) = parse_response(data) {
        let second = parse_response(data).expect("second parse of an accepted body");
        assert_eq!(first, second);
    }
});
