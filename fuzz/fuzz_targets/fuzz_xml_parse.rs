#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic: errors are fine, panics are bugs.
    if let Ok(tree) = facturx::xml::XmlTree::parse(data) {
        let _ = tree.to_bytes();
    }
});
