use analysis_core::{AnalysisError, Classification, SentimentClassifier, SentimentLabel};
use async_trait::async_trait;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "rallies", "surge", "surges", "gain", "gains", "profit", "growth",
    "beat", "upgrade", "outperform", "strong", "positive", "rise", "rises", "increase",
    "breakthrough", "success", "exceed", "momentum", "optimism", "optimistic", "record",
    "high", "advance", "advances", "jump", "jumps", "soar", "soars",
    // Financial-specific terms
    "dividend", "buyback", "upside", "recovery", "rebound", "expansion", "robust",
    "accelerating", "overweight", "raised", "upgraded", "tailwind",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "declines", "loss", "losses", "fall", "falls", "plunge", "plunges",
    "crash", "miss", "downgrade", "underperform", "weak", "negative", "drop", "drops",
    "decrease", "concern", "concerns", "risk", "fail", "disappoint", "slump", "sell-off",
    "selloff", "warning", "pessimistic", "low", "retreat", "fear", "fears", "trouble",
    "tumble", "tumbles",
    // Financial-specific terms
    "headwind", "lawsuit", "investigation", "probe", "default", "bankruptcy", "layoff",
    "layoffs", "downside", "overvalued", "bubble", "underweight", "lowered", "recession",
    "inflation",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

/// Backend name reported when the word list labels headlines.
pub(crate) const LEXICON_BACKEND: &str = "lexicon";

/// Word-list classifier used when the FinBERT service cannot be reached.
pub struct LexiconClassifier {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Net word score: +1 per positive hit, -1 per negative hit, flipped when a
    /// negation word appears within three words before the hit.
    pub fn score_text(&self, text: &str) -> i32 {
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

        let mut score = 0;
        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive.contains(*word);
            let is_negative = self.negative.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && i - neg_pos <= NEGATION_WINDOW);

            let hit = if is_positive { 1 } else { -1 };
            score += if negated { -hit } else { hit };
        }
        score
    }

    pub fn classify_text(&self, text: &str) -> Classification {
        let score = self.score_text(text);
        let label = match score.signum() {
            1 => SentimentLabel::Positive,
            -1 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        };
        // One hit reads as 0.6, saturating at 0.95
        let confidence = if score == 0 {
            0.5
        } else {
            (0.45 + 0.15 * score.unsigned_abs() as f64).min(0.95)
        };
        Classification { label, confidence }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>, AnalysisError> {
        Ok(texts.iter().map(|t| self.classify_text(t)).collect())
    }

    fn backend_name(&self) -> &'static str {
        LEXICON_BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_headline() {
        let lexicon = LexiconClassifier::new();
        let c = lexicon.classify_text("S&P 500 markets show rally amid global economic shifts");
        assert_eq!(c.label, SentimentLabel::Positive);
        assert!((c.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_negative_headline() {
        let lexicon = LexiconClassifier::new();
        let c = lexicon.classify_text("Stocks plunge as recession fears mount");
        assert_eq!(c.label, SentimentLabel::Negative);
        assert_eq!(lexicon.score_text("Stocks plunge as recession fears mount"), -3);
    }

    #[test]
    fn test_negation_flips_hit() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.score_text("Earnings did not beat estimates"), -1);
        // Negation further than three words away is ignored
        assert_eq!(lexicon.score_text("not that the quarter was a strong one"), 1);
    }

    #[test]
    fn test_neutral_headline() {
        let lexicon = LexiconClassifier::new();
        let c = lexicon.classify_text("Central bank meets on Thursday");
        assert_eq!(c.label, SentimentLabel::Neutral);
        assert_eq!(c.score(), 0.0);
    }

    #[test]
    fn test_confidence_saturates() {
        let lexicon = LexiconClassifier::new();
        let c = lexicon.classify_text("rally surge gains growth record optimism jump soar");
        assert_eq!(c.confidence, 0.95);
    }
}
