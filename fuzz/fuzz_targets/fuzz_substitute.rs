//! Fuzz target for range token substitution.

#![no_main]

use arbitrary::Arbitrary;
use interest_core::interesting::{substitute, RangeSpec};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    args: Vec<String>,
    token: String,
    loop_min: u16,
    span: u8,
}

fuzz_target!(|input: Input| {
    let loop_min = u64::from(input.loop_min).max(1);
    let loop_max = loop_min + u64::from(input.span % 16);
    let Ok(spec) = RangeSpec::new(loop_min, loop_max, input.token.clone()) else {
        return;
    };

    let mut expected = loop_min;
    for (number, candidate) in spec.candidates(&input.args) {
        assert_eq!(number, expected);
        assert_eq!(candidate, substitute(&input.args, &input.token, number));
        assert_eq!(candidate.len(), input.args.len());
        expected += 1;
    }
    assert_eq!(expected, loop_max + 1);
});
