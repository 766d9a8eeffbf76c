// Noun candidate extraction.
//
// A rule-based stand-in for a Korean morphological noun analyzer: split text
// into Hangul and Latin spans, drop spans that end like a predicate, strip a
// trailing postposition particle, and filter stop words. Output is in source
// order with duplicates kept — duplicates are what drive keyword frequency.

use std::collections::{HashMap, HashSet};

use regex_lite::Regex;
use stop_words::{get, LANGUAGE};

/// Hangul syllable runs, or Latin words (letters then letters/digits).
const SPAN_PATTERN: &str = "[가-힣]+|[A-Za-z][A-Za-z0-9]*";

/// Minimum token length, in characters, after particle stripping.
const MIN_TOKEN_CHARS: usize = 2;

/// Spans ending in one of these are verbs/adjectives/connectives, not nouns.
/// Bare 다/요 are not listed: 바다, 수요 and 필요 are nouns.
const PREDICATE_ENDINGS: &[&str] = &[
    "니다", "없다", "이다", "하다", "되다", "하는", "했던", "하며", "하고", "하여", "해서",
    "는데", "지만", "면서", "어서", "아서", "해요", "어요", "아요", "예요", "에요", "세요",
    "네요", "까요", "지요", "이죠", "하죠", "되죠",
];

/// Final consonants that mark a tense before 다: ㄴ (오른다) and ㅆ (늘었다).
const TENSE_FINALS: &[u32] = &[4, 20];

/// Nouns whose last syllable is 도; the 도 is not a particle here.
const NOUNS_ENDING_IN_DO: &[&str] = &[
    "지지도", "인지도", "호감도", "신뢰도", "선호도", "만족도", "민감도", "정도", "제도", "속도",
    "강도", "태도", "의도", "시도", "용도", "한도", "지도", "온도", "밀도", "빈도", "각도", "척도",
    "반도",
];

/// Nouns whose last syllable is 의; the 의 is not a particle here.
const NOUNS_ENDING_IN_UI: &[&str] = &[
    "주의", "회의", "합의", "논의", "정의", "협의", "동의", "건의", "질의", "항의", "결의",
];

/// When a particle may be stripped, based on the preceding syllable.
#[derive(Clone, Copy)]
enum Attach {
    Any,
    /// Only after a syllable with a final consonant (batchim).
    AfterConsonant,
    /// Only after a syllable without a final consonant.
    AfterVowel,
    /// After a vowel or a ㄹ final (로 / 로는).
    AfterVowelOrRieul,
    /// Anywhere, unless the span ends in one of these nouns.
    Unless(&'static [&'static str]),
}

/// Postposition particles, longest first.
const PARTICLES: &[(&str, Attach)] = &[
    ("에서는", Attach::Any),
    ("으로는", Attach::AfterConsonant),
    ("에서", Attach::Any),
    ("에게", Attach::Any),
    ("한테", Attach::Any),
    ("까지", Attach::Any),
    ("부터", Attach::Any),
    ("처럼", Attach::Any),
    ("보다", Attach::Any),
    ("으로", Attach::AfterConsonant),
    ("로는", Attach::AfterVowelOrRieul),
    ("에는", Attach::Any),
    ("은", Attach::AfterConsonant),
    ("이", Attach::AfterConsonant),
    ("을", Attach::AfterConsonant),
    ("과", Attach::AfterConsonant),
    ("는", Attach::AfterVowel),
    ("가", Attach::AfterVowel),
    ("를", Attach::AfterVowel),
    ("와", Attach::AfterVowel),
    ("로", Attach::AfterVowelOrRieul),
    ("에", Attach::Any),
    ("의", Attach::Unless(NOUNS_ENDING_IN_UI)),
    ("도", Attach::Unless(NOUNS_ENDING_IN_DO)),
    ("만", Attach::Any),
];

/// Extracts noun-like tokens from free text.
///
/// Construct once and reuse; the span regex and stop word sets are built in `new`.
pub struct NounTokenizer {
    span: Regex,
    korean_stop_words: HashSet<String>,
    english_stop_words: HashSet<String>,
}

impl Default for NounTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NounTokenizer {
    pub fn new() -> Self {
        Self {
            span: Regex::new(SPAN_PATTERN).expect("valid span pattern"),
            korean_stop_words: get(LANGUAGE::Korean).into_iter().collect(),
            english_stop_words: get(LANGUAGE::English).into_iter().collect(),
        }
    }

    /// Tokenize a piece of text. Missing text yields no tokens.
    pub fn tokenize<'a>(&'a self, text: Option<&'a str>) -> impl Iterator<Item = String> + 'a {
        self.span
            .find_iter(text.unwrap_or(""))
            .filter_map(move |m| self.normalize(m.as_str()))
    }

    /// Count candidates across many texts, preserving first-seen order.
    pub fn count<'a, I>(&self, texts: I) -> CandidateCounts
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut counts = CandidateCounts::default();
        for text in texts {
            for token in self.tokenize(text) {
                counts.add(token);
            }
        }
        counts
    }

    fn normalize(&self, span: &str) -> Option<String> {
        let first = span.chars().next()?;
        if first.is_ascii_alphabetic() {
            if span.chars().count() < MIN_TOKEN_CHARS
                || self.english_stop_words.contains(&span.to_lowercase())
            {
                return None;
            }
            return Some(span.to_string());
        }

        if ends_like_predicate(span) {
            return None;
        }

        let noun = strip_particle(span);
        if noun.chars().count() < MIN_TOKEN_CHARS || self.korean_stop_words.contains(noun) {
            return None;
        }
        Some(noun.to_string())
    }
}

fn ends_like_predicate(span: &str) -> bool {
    if PREDICATE_ENDINGS.iter().any(|e| span.ends_with(e)) {
        return true;
    }
    let mut rev = span.chars().rev();
    match (rev.next(), rev.next().and_then(final_consonant)) {
        (Some('다'), Some(f)) => TENSE_FINALS.contains(&f),
        _ => false,
    }
}

/// Strip one trailing particle, keeping at least `MIN_TOKEN_CHARS` characters.
fn strip_particle(span: &str) -> &str {
    for &(particle, attach) in PARTICLES {
        let Some(stem) = span.strip_suffix(particle) else {
            continue;
        };
        if stem.chars().count() < MIN_TOKEN_CHARS {
            continue;
        }
        let Some(last) = stem.chars().last() else {
            continue;
        };
        let allowed = match attach {
            Attach::Any => true,
            Attach::AfterConsonant => final_consonant(last).is_some_and(|f| f != 0),
            Attach::AfterVowel => final_consonant(last) == Some(0),
            Attach::AfterVowelOrRieul => matches!(final_consonant(last), Some(0) | Some(8)),
            Attach::Unless(nouns) => !nouns.iter().any(|n| span.ends_with(n)),
        };
        if allowed {
            return stem;
        }
    }
    span
}

/// Index of the final consonant (jongseong) of a Hangul syllable; 0 means
/// none, 8 is ㄹ. `None` for non-syllables.
fn final_consonant(c: char) -> Option<u32> {
    let code = c as u32;
    if (0xAC00..=0xD7A3).contains(&code) {
        Some((code - 0xAC00) % 28)
    } else {
        None
    }
}

/// Token → occurrence count, remembering the order tokens were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateCounts {
    order: Vec<String>,
    counts: HashMap<String, u32>,
}

impl CandidateCounts {
    pub fn add(&mut self, token: String) {
        match self.counts.get_mut(&token) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(token.clone(), 1);
                self.order.push(token);
            }
        }
    }

    pub fn get(&self, token: &str) -> u32 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.counts.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// (token, count) pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.order
            .iter()
            .map(move |t| (t.as_str(), self.counts[t.as_str()]))
    }

    /// Candidates with count >= `min_freq`, in first-seen order.
    pub fn surviving(&self, min_freq: u32) -> Vec<(String, u32)> {
        self.iter()
            .filter(|&(_, count)| count >= min_freq)
            .map(|(token, count)| (token.to_string(), count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        NounTokenizer::new().tokenize(Some(text)).collect()
    }

    #[test]
    fn test_missing_text_yields_nothing() {
        let tokenizer = NounTokenizer::new();
        assert_eq!(tokenizer.tokenize(None).count(), 0);
        assert_eq!(tokenizer.tokenize(Some("")).count(), 0);
        assert_eq!(tokenizer.tokenize(Some("12345 !!! ...")).count(), 0);
    }

    #[test]
    fn test_duplicates_kept_in_source_order() {
        assert_eq!(tokens("코나 코나 코나"), vec!["코나", "코나", "코나"]);
    }

    #[test]
    fn test_particle_after_consonant() {
        assert_eq!(tokens("윤석열이"), vec!["윤석열"]);
        assert_eq!(tokens("평화산업은"), vec!["평화산업"]);
    }

    #[test]
    fn test_vowel_final_name_not_stripped() {
        // 아 has no final consonant, so the trailing 이 is part of the name.
        assert_eq!(tokens("코나아이"), vec!["코나아이"]);
        assert_eq!(tokens("코나아이가"), vec!["코나아이"]);
    }

    #[test]
    fn test_short_stem_keeps_particle() {
        assert_eq!(tokens("대가"), vec!["대가"]);
    }

    #[test]
    fn test_predicates_dropped() {
        assert!(tokens("급등했다").is_empty());
        assert!(tokens("상승했습니다").is_empty());
    }

    #[test]
    fn test_tensed_verbs_dropped() {
        assert!(tokens("오른다").is_empty());
        assert!(tokens("늘었다").is_empty());
        assert!(tokens("급등하다").is_empty());
        assert!(tokens("올랐어요").is_empty());
    }

    #[test]
    fn test_nouns_ending_like_predicates_kept() {
        assert_eq!(tokens("반도체 수요 증가"), vec!["반도체", "수요", "증가"]);
        assert_eq!(tokens("주요 정책"), vec!["주요", "정책"]);
        assert_eq!(tokens("필요"), vec!["필요"]);
        assert_eq!(tokens("바다"), vec!["바다"]);
    }

    #[test]
    fn test_do_particle_and_do_nouns() {
        assert_eq!(tokens("지지도 상승"), vec!["지지도", "상승"]);
        assert_eq!(tokens("인지도"), vec!["인지도"]);
        assert_eq!(tokens("이재명도"), vec!["이재명"]);
        assert_eq!(tokens("지역화폐도"), vec!["지역화폐"]);
    }

    #[test]
    fn test_ui_nouns_not_stripped() {
        assert_eq!(tokens("민주주의"), vec!["민주주의"]);
        assert_eq!(tokens("코나아이의"), vec!["코나아이"]);
    }

    #[test]
    fn test_latin_case_preserved_and_stop_words_dropped() {
        assert_eq!(tokens("The AhnLab and the KOSDAQ"), vec!["AhnLab", "KOSDAQ"]);
    }

    #[test]
    fn test_digits_split_spans() {
        assert_eq!(tokens("20대 대선"), vec!["대선"]);
    }

    #[test]
    fn test_final_consonant() {
        assert_eq!(final_consonant('가'), Some(0));
        assert_eq!(final_consonant('열'), Some(8));
        assert_eq!(final_consonant('업'), Some(17));
        assert_eq!(final_consonant('a'), None);
    }

    #[test]
    fn test_counts_preserve_first_seen_order() {
        let tokenizer = NounTokenizer::new();
        let counts = tokenizer.count([Some("안랩 코나 안랩"), None, Some("코나 덕성")]);
        let pairs: Vec<(&str, u32)> = counts.iter().collect();
        assert_eq!(pairs, vec![("안랩", 2), ("코나", 2), ("덕성", 1)]);
        assert_eq!(counts.surviving(2).len(), 2);
        assert_eq!(counts.get("없음"), 0);
    }
}
