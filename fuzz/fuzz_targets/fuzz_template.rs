#![no_main]
use libfuzzer_sys::fuzz_target;

use arbitrary::Arbitrary;

#[derive(Debug)]
pub struct TemplateInput {
    pub template: String,
}

impl<'a> Arbitrary<'a> for TemplateInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let template = random_template(u)?;
        Ok(TemplateInput { template })
    }
}

const MAX_TEMPLATE_LENGTH: usize = 4000;

// Biased towards the characters the lexer reacts to
const ALPHABET: &[char] = &[
    '%', '\'', '"', '`', '[', ']', ':', '.', ' ', 'a', 'b', 'd', 'e', 'f', 'i', 'l', 'n', 's',
    'v', 'x', '0', '1', 'é',
];

fn random_template(u: &mut arbitrary::Unstructured) -> arbitrary::Result<String> {
    let len = u.int_in_range(0..=MAX_TEMPLATE_LENGTH)?;
    let mut s = String::with_capacity(len);
    for _ in 0..len {
        if u.ratio(1, 8)? {
            s.push(u.arbitrary()?);
        } else {
            s.push(*u.choose(ALPHABET)?);
        }
    }
    Ok(s)
}

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = arbitrary::Unstructured::new(data).arbitrary::<TemplateInput>() {
        sql_template::fuzz_helper::translate_template(&input.template);
    }
});
