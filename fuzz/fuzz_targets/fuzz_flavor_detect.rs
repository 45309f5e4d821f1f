#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(tree) = facturx::xml::XmlTree::parse(data) {
        if let Ok(flavor) = facturx::flavor::detect(&tree, None) {
            for field in facturx::fields::FIELDS {
                let _ = facturx::fields::resolve(&tree, &flavor, field);
            }
        }
    }
});
