use std::panic;

use htmlstrip_core::{DEFAULT_READ_AHEAD, HtmlStripFilter, strip_html};

const CASES: usize = 200;
const MAX_LEN: usize = 512;
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 \
\n\t<>&;#!?/=\"'-.x";

#[test]
fn filter_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x7f4a_2d91_13b4_55a1);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let result = panic::catch_unwind(|| strip_html(&source));
        if result.is_err() {
            return Err(format!("strip panicked for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

#[test]
fn corrections_are_monotone_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x91d4_2f8e_c1a3_044f);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let input_len = source.chars().count();

        let mut filter = HtmlStripFilter::new(source.chars());
        let mut produced = 0;
        while filter.read().expect("in-memory input cannot fail").is_some() {
            produced += 1;
        }
        let mut last = 0;
        for off in 0..produced {
            let corrected = filter.correct_offset(off);
            if corrected < last || corrected > input_len {
                return Err(format!(
                    "correction not monotone for case {}: offset {} maps to {} (previous {})\nSource:\n---\n{}\n---",
                    case, off, corrected, last, source
                )
                .into());
            }
            last = corrected;
        }
    }
    Ok(())
}

#[test]
fn markup_free_input_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    const PLAIN: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789 .,:!?";
    let mut rng = Lcg::new(0x00c0_ffee_0a11_beef);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let mut source = String::with_capacity(len);
        for _ in 0..len {
            let idx = rng.gen_range(0, PLAIN.len());
            source.push(PLAIN.get(idx).copied().unwrap_or(b' ') as char);
        }

        let mut filter = HtmlStripFilter::new(source.chars());
        let mut output = String::new();
        let mut off = 0;
        while let Some(ch) = filter.read().expect("in-memory input cannot fail") {
            output.push(ch);
            if filter.correct_offset(off) != off {
                return Err(format!("identity broken at {} for case {}", off, case).into());
            }
            off += 1;
        }
        if output != source {
            return Err(format!("output differs from input for case {}", case).into());
        }
    }
    Ok(())
}

// -- lookahead growth: a construct body larger than the initial window must
// strip exactly like a short one --

fn filler(len: usize) -> String {
    "a ".repeat(len / 2)
}

#[test]
fn long_comment_strips_like_a_short_one() {
    let mut input = String::from("<!--");
    input.push_str(&filler(3 * DEFAULT_READ_AHEAD + 500));
    input.push_str("-->foo");
    assert_eq!(strip_html(&input), " foo");
    assert_eq!(strip_html(&input), strip_html("<!--x-->foo"));
}

#[test]
fn long_processing_instruction_strips_like_a_short_one() {
    let mut input = String::from("<?");
    input.push_str(&filler(DEFAULT_READ_AHEAD + 500));
    input.push_str("?>bar");
    assert_eq!(strip_html(&input), " bar");
    assert_eq!(strip_html(&input), strip_html("<?x?>bar"));
}

#[test]
fn long_tag_strips_like_a_short_one() {
    let mut input = String::from("<b ");
    input.push_str(&filler(DEFAULT_READ_AHEAD + 500));
    input.push_str("/>baz");
    assert_eq!(strip_html(&input), " baz");
    assert_eq!(strip_html(&input), strip_html("<b x/>baz"));
}

#[test]
fn long_unterminated_construct_stays_literal() {
    // looks like a processing instruction but never terminates
    let mut input = String::from("ah<?> ??????");
    input.push_str(&filler(DEFAULT_READ_AHEAD + 500));
    assert_eq!(strip_html(&input), input);
}

#[test]
fn offsets_stay_exact_across_a_long_strip() {
    let body = filler(2 * DEFAULT_READ_AHEAD);
    let input = format!("<!--{}-->X", body);
    let mut filter = HtmlStripFilter::new(input.chars());
    let mut output = String::new();
    while let Some(ch) = filter.read().expect("in-memory input cannot fail") {
        output.push(ch);
    }
    assert_eq!(output, " X");
    assert_eq!(filter.correct_offset(0), 0);
    assert_eq!(filter.correct_offset(1), 4 + body.chars().count() + 3);
}

fn random_string(rng: &mut Lcg, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0, CHARSET.len());
        let byte = CHARSET.get(idx).copied().unwrap_or(b' ');
        out.push(byte as char);
    }
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = max - min;
        let value = (self.next() >> 1) as usize;
        min + (value % span)
    }
}
