//! Fuzz target for study.json parsing and validation.
//!
//! Parsing and validating arbitrary input must return an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ned_config::{validate_study, ConfigPaths, ConfigSnapshot, StudyConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = StudyConfig::from_json(text) {
        if validate_study(&config).is_ok() {
            let _ = ConfigSnapshot::new(&config, &ConfigPaths::default());
            for system in &config.systems {
                let _ = system.view();
            }
        }
    }
});
