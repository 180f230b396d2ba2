//! Porter stemmer (NLTK extension mode).
//!
//! Operates on `char` buffers so non-ASCII letters count as single positions;
//! every character outside `a e i o u` (and `y` after a vowel) is a consonant.

use rustc_hash::FxHashMap;

/// Identifier mixed into the normalizer fingerprint.
pub const STEMMER_ID: &str = "porter/nltk-extensions";

/// Irregular forms resolved before any suffix rule runs.
const IRREGULAR_FORMS: [(&str, &[&str]); 12] = [
    ("sky", &["sky", "skies"]),
    ("die", &["dying"]),
    ("lie", &["lying"]),
    ("tie", &["tying"]),
    ("news", &["news"]),
    ("inning", &["innings", "inning"]),
    ("outing", &["outings", "outing"]),
    ("canning", &["cannings", "canning"]),
    ("howe", &["howe"]),
    ("proceed", &["proceed"]),
    ("exceed", &["exceed"]),
    ("succeed", &["succeed"]),
];

type Condition<'a> = &'a dyn Fn(&[char]) -> bool;

/// Rule-based English stemmer.
#[derive(Debug, Clone)]
pub struct PorterStemmer {
    pool: FxHashMap<&'static str, &'static str>,
}

impl Default for PorterStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl PorterStemmer {
    /// Builds a stemmer with the irregular-form pool loaded.
    pub fn new() -> Self {
        let mut pool = FxHashMap::default();
        for (root, forms) in IRREGULAR_FORMS {
            for form in forms.iter() {
                pool.insert(*form, root);
            }
        }
        Self { pool }
    }

    /// Stems a single token. Input is lowercased first.
    pub fn stem(&self, word: &str) -> String {
        let lowered = word.to_lowercase();
        if let Some(root) = self.pool.get(lowered.as_str()) {
            return (*root).to_string();
        }
        let chars: Vec<char> = lowered.chars().collect();
        if chars.len() <= 2 {
            return lowered;
        }

        let chars = step1a(chars);
        let chars = step1b(chars);
        let chars = step1c(chars);
        let chars = step2(chars);
        let chars = step3(chars);
        let chars = step4(chars);
        let chars = step5a(chars);
        let chars = step5b(chars);
        chars.into_iter().collect()
    }
}

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// A `y` opening a run of `y`s is a consonant unless it follows a vowel;
/// inside the run the class alternates.
fn is_consonant(word: &[char], i: usize) -> bool {
    match word[i] {
        ch if is_vowel(ch) => false,
        'y' => {
            let run = word[..i].iter().rev().take_while(|&&ch| ch == 'y').count();
            let start = i - run;
            let opens_as_consonant = start == 0 || is_vowel(word[start - 1]);
            opens_as_consonant == (run % 2 == 0)
        }
        _ => true,
    }
}

fn consonant_mask(word: &[char]) -> Vec<bool> {
    let mut mask: Vec<bool> = Vec::with_capacity(word.len());
    for (i, &ch) in word.iter().enumerate() {
        let consonant = match ch {
            ch if is_vowel(ch) => false,
            'y' => i == 0 || !mask[i - 1],
            _ => true,
        };
        mask.push(consonant);
    }
    mask
}

/// Number of vowel-consonant sequences (Porter's `m`).
fn measure(stem: &[char]) -> usize {
    consonant_mask(stem)
        .windows(2)
        .filter(|pair| !pair[0] && pair[1])
        .count()
}

fn has_positive_measure(stem: &[char]) -> bool {
    measure(stem) > 0
}

fn contains_vowel(stem: &[char]) -> bool {
    consonant_mask(stem).iter().any(|consonant| !consonant)
}

fn ends_double_consonant(word: &[char]) -> bool {
    let n = word.len();
    n >= 2 && word[n - 1] == word[n - 2] && is_consonant(word, n - 1)
}

fn ends_cvc(word: &[char]) -> bool {
    let n = word.len();
    let classic = n >= 3
        && is_consonant(word, n - 3)
        && !is_consonant(word, n - 2)
        && is_consonant(word, n - 1)
        && !matches!(word[n - 1], 'w' | 'x' | 'y');
    classic || (n == 2 && !is_consonant(word, 0) && is_consonant(word, 1))
}

fn ends_with(word: &[char], suffix: &str) -> bool {
    let len = suffix.len();
    len <= word.len() && word[word.len() - len..].iter().copied().eq(suffix.chars())
}

fn replace_suffix(word: &[char], suffix: &str, replacement: &str) -> Vec<char> {
    let mut out = word[..word.len() - suffix.len()].to_vec();
    out.extend(replacement.chars());
    out
}

/// Applies the first rule whose suffix matches; a failed condition stops the scan.
fn apply_rules(word: Vec<char>, rules: &[(&str, &str, Condition<'_>)]) -> Vec<char> {
    for (suffix, replacement, condition) in rules {
        if ends_with(&word, suffix) {
            let stem = &word[..word.len() - suffix.len()];
            if condition(stem) {
                return replace_suffix(&word, suffix, replacement);
            }
            return word;
        }
    }
    word
}

fn always(_: &[char]) -> bool {
    true
}

fn step1a(word: Vec<char>) -> Vec<char> {
    if word.len() == 4 && ends_with(&word, "ies") {
        return replace_suffix(&word, "ies", "ie");
    }
    apply_rules(
        word,
        &[
            ("sses", "ss", &always),
            ("ies", "i", &always),
            ("ss", "ss", &always),
            ("s", "", &always),
        ],
    )
}

fn step1b(word: Vec<char>) -> Vec<char> {
    if ends_with(&word, "ied") {
        let replacement = if word.len() == 4 { "ie" } else { "i" };
        return replace_suffix(&word, "ied", replacement);
    }

    if ends_with(&word, "eed") {
        let stem = &word[..word.len() - 3];
        if measure(stem) > 0 {
            return replace_suffix(&word, "eed", "ee");
        }
        return word;
    }

    let mut intermediate = None;
    for suffix in ["ed", "ing"] {
        if ends_with(&word, suffix) {
            let stem = &word[..word.len() - suffix.len()];
            if contains_vowel(stem) {
                intermediate = Some(stem.to_vec());
                break;
            }
        }
    }
    let Some(stem) = intermediate else {
        return word;
    };

    for (suffix, replacement) in [("at", "ate"), ("bl", "ble"), ("iz", "ize")] {
        if ends_with(&stem, suffix) {
            return replace_suffix(&stem, suffix, replacement);
        }
    }

    if ends_double_consonant(&stem) {
        let last = stem[stem.len() - 1];
        if matches!(last, 'l' | 's' | 'z') {
            return stem;
        }
        return stem[..stem.len() - 1].to_vec();
    }

    if measure(&stem) == 1 && ends_cvc(&stem) {
        let mut out = stem;
        out.push('e');
        return out;
    }
    stem
}

fn step1c(word: Vec<char>) -> Vec<char> {
    apply_rules(
        word,
        &[("y", "i", &|stem: &[char]| {
            stem.len() > 1 && is_consonant(stem, stem.len() - 1)
        })],
    )
}

fn step2(word: Vec<char>) -> Vec<char> {
    if ends_with(&word, "alli") && has_positive_measure(&word[..word.len() - 4]) {
        return step2(replace_suffix(&word, "alli", "al"));
    }

    // The `l` of `logi` stays with the stem so short stems like `geo` qualify.
    let logi_stem = word[..word.len().saturating_sub(3)].to_vec();
    let logi = move |_: &[char]| has_positive_measure(&logi_stem);

    apply_rules(
        word,
        &[
            ("ational", "ate", &has_positive_measure),
            ("tional", "tion", &has_positive_measure),
            ("enci", "ence", &has_positive_measure),
            ("anci", "ance", &has_positive_measure),
            ("izer", "ize", &has_positive_measure),
            ("bli", "ble", &has_positive_measure),
            ("alli", "al", &has_positive_measure),
            ("entli", "ent", &has_positive_measure),
            ("eli", "e", &has_positive_measure),
            ("ousli", "ous", &has_positive_measure),
            ("ization", "ize", &has_positive_measure),
            ("ation", "ate", &has_positive_measure),
            ("ator", "ate", &has_positive_measure),
            ("alism", "al", &has_positive_measure),
            ("iveness", "ive", &has_positive_measure),
            ("fulness", "ful", &has_positive_measure),
            ("ousness", "ous", &has_positive_measure),
            ("aliti", "al", &has_positive_measure),
            ("iviti", "ive", &has_positive_measure),
            ("biliti", "ble", &has_positive_measure),
            ("fulli", "ful", &has_positive_measure),
            ("logi", "log", &logi),
        ],
    )
}

fn step3(word: Vec<char>) -> Vec<char> {
    apply_rules(
        word,
        &[
            ("icate", "ic", &has_positive_measure),
            ("ative", "", &has_positive_measure),
            ("alize", "al", &has_positive_measure),
            ("iciti", "ic", &has_positive_measure),
            ("ical", "ic", &has_positive_measure),
            ("ful", "", &has_positive_measure),
            ("ness", "", &has_positive_measure),
        ],
    )
}

fn step4(word: Vec<char>) -> Vec<char> {
    let gt1 = |stem: &[char]| measure(stem) > 1;
    let ion = |stem: &[char]| measure(stem) > 1 && matches!(stem.last(), Some('s' | 't'));
    apply_rules(
        word,
        &[
            ("al", "", &gt1),
            ("ance", "", &gt1),
            ("ence", "", &gt1),
            ("er", "", &gt1),
            ("ic", "", &gt1),
            ("able", "", &gt1),
            ("ible", "", &gt1),
            ("ant", "", &gt1),
            ("ement", "", &gt1),
            ("ment", "", &gt1),
            ("ent", "", &gt1),
            ("ion", "", &ion),
            ("ou", "", &gt1),
            ("ism", "", &gt1),
            ("ate", "", &gt1),
            ("iti", "", &gt1),
            ("ous", "", &gt1),
            ("ive", "", &gt1),
            ("ize", "", &gt1),
        ],
    )
}

fn step5a(word: Vec<char>) -> Vec<char> {
    if ends_with(&word, "e") {
        let stem = &word[..word.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            return stem.to_vec();
        }
    }
    word
}

fn step5b(word: Vec<char>) -> Vec<char> {
    if ends_with(&word, "ll") && measure(&word[..word.len() - 1]) > 1 {
        return word[..word.len() - 1].to_vec();
    }
    word
}
