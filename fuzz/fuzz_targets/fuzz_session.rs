#![no_main]

use libfuzzer_sys::fuzz_target;
use qrs::index::MemoryIndex;
use qrs::session::{Context, CtxFlags, Session};

fuzz_target!(|fragments: Vec<(&str, u8)>| {
    let mut index = MemoryIndex::new();
    index.add_document("a", &["alpha beta", "gamma"]);
    index.add_document("b", &["beta delta"]);
    let mut session = Context::with_defaults(index);

    // Session errors are fine, panics are not
    for (fragment, flags) in fragments {
        let _ = session.send(fragment, CtxFlags(flags & 0x09));
        while let Ok(response) = session.recv() {
            if !response.flags.is_more() {
                break;
            }
        }
    }
});
