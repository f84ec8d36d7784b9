use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without", "cant", "can't", "dont",
];

const NEGATION_WINDOW: usize = 3;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "gains", "profit", "growth", "beat",
    "upgrade", "outperform", "strong", "positive", "rise", "increase",
    "breakout", "success", "exceed", "momentum", "buy", "buying", "optimistic",
    "record", "high", "advance", "recovery", "rebound", "upside", "confident",
    "hope", "hopeful", "moon", "green", "calm", "opportunity",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "losses", "fall", "plunge", "crash", "miss",
    "downgrade", "underperform", "weak", "negative", "drop", "decrease",
    "concern", "fail", "disappoint", "slump", "sell", "selling", "pessimistic",
    "low", "retreat", "fear", "afraid", "scared", "panic", "trouble", "default",
    "bankruptcy", "downside", "bubble", "dump", "red", "worried", "anxious",
    "collapse", "recession",
];

/// Word-list sentiment scorer with a short negation window
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Net polarity in [-1, 1]: (positive hits - negative hits) / total hits.
    /// Text without any lexicon word scores 0.
    pub fn score(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"'))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut net: i32 = 0;
        let mut hits: i32 = 0;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive.contains(*word);
            let is_negative = self.negative.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            let polarity = if is_positive { 1 } else { -1 };
            net += if negated { -polarity } else { polarity };
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (net as f64 / hits as f64).clamp(-1.0, 1.0)
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}
