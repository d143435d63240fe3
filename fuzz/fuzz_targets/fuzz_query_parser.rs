#![no_main]

use libfuzzer_sys::fuzz_target;
use qrs::index::Encoding;
use qrs::query::{Operator, parse};

fuzz_target!(|data: (&str, u8)| {
    let (text, budget) = data;
    let max_exprs = u32::from(budget % 40) + 1;
    if let Ok((query, rest)) = parse(text, Operator::Or, max_exprs, Encoding::Utf8) {
        // The remainder is always a suffix of the input
        assert!(text.ends_with(rest));
        assert!(query.terms().len() <= max_exprs as usize);
    }
});
