use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::EngineConfig;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)\p{L}+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            // English
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
            // French function words, pre-folded (the corpus is largely Gutenberg French)
            "les","des","une","aux","par","pour","sur","avec","sans","sous","entre","dans","chez","vers","depuis",
            "jusqu","mais","donc","car","que","qui","quoi","dont","cette","ces","son","ses","leur","leurs",
            "nous","vous","ils","elles","elle","lui","mon","mes","ton","tes","notre","votre","nos","vos",
            "est","sont","ete","etre","avoir","fait","comme","plus","moins","tout","tous","toute","toutes",
        ];
        words.iter().copied().collect()
    };
}

/// Stopwords applied by the default [`EngineConfig`].
pub fn default_stopwords() -> HashSet<String> {
    STOPWORDS.iter().map(|w| (*w).to_string()).collect()
}

/// Lowercase and strip diacritics: NFKD decomposition with combining marks
/// dropped, so token identity is case- and accent-insensitive.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Tokenize raw text into the normalized token sequence, in document order.
///
/// Letter runs are extracted from the folded text; anything shorter than
/// `min_token_len` or present in the stopword set is dropped.
pub fn tokenize(text: &str, config: &EngineConfig) -> Vec<String> {
    let folded = fold(text);
    WORD_RE
        .find_iter(&folded)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() >= config.min_token_len && !config.stopwords.contains(*w))
        .map(str::to_string)
        .collect()
}

/// Distinct-token view of a token sequence, used for similarity comparison.
pub fn token_set(tokens: &[String]) -> HashSet<String> {
    tokens.iter().cloned().collect()
}

/// Normalize a single query term the way corpus text is normalized.
///
/// Returns `None` when no letters survive folding; stopwords and short
/// words are kept so that lookups simply miss, matching index behavior for
/// terms that were never indexed.
pub fn normalize_term(raw: &str) -> Option<String> {
    let folded = fold(raw);
    WORD_RE.find(&folded).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_accents() {
        let toks = tokenize("Le Café était GRAND", &EngineConfig::default());
        assert!(toks.contains(&"cafe".to_string()));
        assert!(toks.contains(&"grand".to_string()));
        assert!(toks.contains(&"etait".to_string()));
    }

    #[test]
    fn drops_short_and_stopword_tokens() {
        let toks = tokenize("the cat is on a mat", &EngineConfig::default());
        assert_eq!(toks, vec!["cat".to_string(), "mat".to_string()]);
    }

    #[test]
    fn preserves_order_and_repeats() {
        let toks = tokenize("whale ship whale", &EngineConfig::default());
        assert_eq!(toks, vec!["whale", "ship", "whale"]);
    }

    #[test]
    fn deterministic_over_repeated_runs() {
        let text = "Moby-Dick; or, The Whale. Chapter one.";
        let cfg = EngineConfig::default();
        assert_eq!(tokenize(text, &cfg), tokenize(text, &cfg));
    }

    #[test]
    fn normalize_term_extracts_first_word() {
        assert_eq!(normalize_term("  Baleine! "), Some("baleine".to_string()));
        assert_eq!(normalize_term("1234 !?"), None);
    }

    #[test]
    fn token_set_deduplicates() {
        let toks = vec!["cat".to_string(), "cat".to_string(), "sat".to_string()];
        let set = token_set(&toks);
        assert_eq!(set.len(), 2);
    }
}
