//! TF-IDF cosine similarity over a passage corpus.
//!
//! Analysis: lower-case, split on anything that is not alphanumeric or `_`,
//! keep terms of two or more characters, drop English stop words. The
//! vocabulary keeps the `max_features` most frequent terms of the corpus.
//! Weights use smoothed IDF, `ln((1 + n) / (1 + df)) + 1`, and every row is
//! L2-normalised so the dot product is the cosine.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

pub const DEFAULT_MAX_FEATURES: usize = 1000;

/// Term id and weight, sorted by term id.
type SparseVector = Vec<(usize, f32)>;

#[derive(Debug, Clone)]
pub struct TfIdfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl TfIdfModel {
    /// Fit over the corpus. `None` when the corpus or its vocabulary is empty.
    pub fn fit(passages: &[String], max_features: usize) -> Option<Self> {
        if passages.is_empty() || max_features == 0 {
            return None;
        }

        let analyzed: Vec<Vec<String>> = passages.iter().map(|p| analyze(p)).collect();

        let mut totals: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            for term in terms {
                *totals.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        if totals.is_empty() {
            return None;
        }

        // Most frequent first, ties alphabetical
        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();
        let vocabulary: HashMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(id, term)| (term.to_string(), id))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for terms in &analyzed {
            let unique: HashSet<usize> = terms
                .iter()
                .filter_map(|t| vocabulary.get(t).copied())
                .collect();
            for id in unique {
                doc_freq[id] += 1;
            }
        }

        let n = passages.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let mut model = Self {
            vocabulary,
            idf,
            rows: Vec::new(),
        };
        model.rows = analyzed.iter().map(|terms| model.weigh(terms)).collect();

        tracing::info!(
            "TF-IDF model fitted: {} passages, {} terms",
            model.rows.len(),
            model.vocabulary.len()
        );
        Some(model)
    }

    /// Number of passages the model was fitted on.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Cosine similarity of the query against every fitted passage, in corpus order.
    pub fn similarities(&self, query: &str) -> Vec<f32> {
        let query_vec: HashMap<usize, f32> = self.weigh(&analyze(query)).into_iter().collect();
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(id, w)| query_vec.get(id).map(|q| q * w))
                    .sum::<f32>()
                    .clamp(0.0, 1.0)
            })
            .collect()
    }

    /// L2-normalised TF-IDF weights for an analysed text. Out-of-vocabulary
    /// terms are ignored.
    fn weigh(&self, terms: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms {
            if let Some(&id) = self.vocabulary.get(term) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: SparseVector = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        weights.sort_unstable_by_key(|(id, _)| *id);

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        weights
    }
}

/// Split, lower-case and filter a text into index terms.
pub fn analyze(text: &str) -> Vec<String> {
    let stopwords = stopwords();
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !stopwords.contains(t.as_str()))
        .collect()
}

fn stopwords() -> &'static HashSet<&'static str> {
    static STOPWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOPWORDS.get_or_init(|| {
        [
            "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
            "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
            "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
            "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because",
            "become", "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
            "below", "beside", "besides", "between", "beyond", "both", "bottom", "but", "by",
            "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "de", "describe",
            "detail", "do", "done", "down", "due", "during", "each", "eg", "eight", "either",
            "eleven", "else", "elsewhere", "empty", "enough", "etc", "even", "ever", "every",
            "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty", "fill",
            "find", "first", "five", "for", "former", "formerly", "forty", "found", "four",
            "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt",
            "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon",
            "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie",
            "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep",
            "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me",
            "meanwhile", "might", "mine", "more", "moreover", "most", "mostly", "move", "much",
            "must", "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next",
            "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere",
            "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others",
            "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part", "per",
            "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
            "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
            "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
            "sometime", "sometimes", "somewhere", "still", "such", "take", "ten", "than", "that",
            "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
            "thereby", "therefore", "therein", "thereupon", "these", "they", "third", "this",
            "those", "though", "three", "through", "throughout", "thru", "thus", "to",
            "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
            "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
            "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
            "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while",
            "whither", "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
            "within", "without", "would", "yet", "you", "your", "yours", "yourself",
            "yourselves",
        ]
        .into_iter()
        .collect()
    })
}
