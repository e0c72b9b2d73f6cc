use analysis_core::stats::round_to;
use analysis_core::Direction;
use analysis_orchestrator::PredictionResult;
use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::{Executor, Sqlite};
use std::collections::{BTreeMap, HashMap};

use crate::db::{timestamp, HistoryDb};
use crate::models::*;

/// Moves within +/-0.5% count as neutral.
const ACTUAL_DIRECTION_THRESHOLD: f64 = 0.5;
/// A 10% price error scores zero.
const ERROR_FOR_ZERO_SCORE: f64 = 10.0;
const HISTORY_LIMIT: i64 = 100;

/// Compare a prediction with the realized close.
pub fn evaluate_outcome(
    current_price: f64,
    predicted_price: Option<f64>,
    predicted_direction: &str,
    actual_price: f64,
) -> Outcome {
    let actual_change_percent = if current_price != 0.0 {
        (actual_price - current_price) / current_price * 100.0
    } else {
        0.0
    };
    let actual_direction = Direction::from_signal(actual_change_percent, ACTUAL_DIRECTION_THRESHOLD);

    let accuracy_score = predicted_price.filter(|_| actual_price != 0.0).map(|predicted| {
        let error_percent = (predicted - actual_price).abs() / actual_price * 100.0;
        (1.0 - error_percent / ERROR_FOR_ZERO_SCORE).max(0.0)
    });

    Outcome {
        actual_change_percent,
        actual_direction: actual_direction.as_str().to_string(),
        was_correct: Direction::parse(predicted_direction) == Some(actual_direction),
        accuracy_score,
    }
}

impl HistoryDb {
    /// Log every forecast day of a prediction in one transaction. Returns the
    /// number of rows written.
    pub async fn log_prediction(&self, prediction: &PredictionResult) -> Result<usize> {
        let prediction_date = timestamp(prediction.generated_at);
        let technical = serde_json::to_string(&prediction.factors.technical)?;
        let sentiment = serde_json::to_string(&prediction.factors.sentiment)?;

        let mut tx = self.pool().begin().await?;
        for point in &prediction.predictions {
            let entry = PredictionLogEntry {
                index_id: prediction.index_id.clone(),
                prediction_date: prediction_date.clone(),
                target_date: point.date.clone(),
                prediction_days: prediction.prediction_days as i64,
                current_price: prediction.current_price,
                predicted_price: point.predicted_close,
                predicted_direction: prediction.predicted_direction.as_str().to_string(),
                predicted_change_percent: prediction.predicted_change_percent,
                confidence: point.confidence,
                technical_factors: Some(technical.clone()),
                sentiment_factors: Some(sentiment.clone()),
                combined_signal: prediction.factors.combined_signal,
            };
            insert_log(&mut *tx, &entry).await?;
        }
        tx.commit().await?;

        tracing::debug!("Logged {} forecast days for {}", prediction.predictions.len(), prediction.index_id);
        Ok(prediction.predictions.len())
    }

    pub async fn insert_prediction_log(&self, entry: &PredictionLogEntry) -> Result<i64> {
        insert_log(self.pool(), entry).await
    }

    /// Most recent logged predictions made in the last `days` (at most 100).
    pub async fn prediction_history(&self, index_id: &str, days: i64) -> Result<Vec<PredictionRecord>> {
        let since = timestamp(Utc::now() - Duration::days(days));

        let records = sqlx::query_as::<_, PredictionRecord>(
            r#"
            SELECT prediction_date, target_date, predicted_price, actual_price, predicted_direction,
                   actual_direction, confidence, was_correct, accuracy_score
            FROM prediction_logs
            WHERE index_id = ? AND prediction_date >= ?
            ORDER BY prediction_date DESC, id DESC
            LIMIT ?
            "#
        )
        .bind(index_id.to_uppercase())
        .bind(&since)
        .bind(HISTORY_LIMIT)
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// Fill in outcomes for pending predictions whose target date has passed,
    /// using a `YYYY-MM-DD -> close` map. Returns the number evaluated.
    pub async fn evaluate_past_predictions(&self, index_id: &str, actual_prices: &HashMap<String, f64>) -> Result<usize> {
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let pending: Vec<(i64, String, Option<f64>, Option<f64>, String)> = sqlx::query_as(
            r#"
            SELECT id, target_date, current_price, predicted_price, predicted_direction
            FROM prediction_logs
            WHERE index_id = ? AND actual_price IS NULL AND target_date <= ?
            "#
        )
        .bind(index_id.to_uppercase())
        .bind(&today)
        .fetch_all(self.pool())
        .await?;

        let evaluated_at = timestamp(Utc::now());
        let mut evaluated = 0;

        for (id, target_date, current_price, predicted_price, predicted_direction) in pending {
            let Some(&actual) = actual_prices.get(&target_date) else {
                continue;
            };

            match current_price {
                Some(current) => {
                    let outcome = evaluate_outcome(current, predicted_price, &predicted_direction, actual);
                    sqlx::query(
                        r#"
                        UPDATE prediction_logs
                        SET actual_price = ?, actual_change_percent = ?, actual_direction = ?,
                            was_correct = ?, accuracy_score = ?, evaluated_at = ?
                        WHERE id = ?
                        "#
                    )
                    .bind(actual)
                    .bind(outcome.actual_change_percent)
                    .bind(&outcome.actual_direction)
                    .bind(outcome.was_correct)
                    .bind(outcome.accuracy_score)
                    .bind(&evaluated_at)
                    .bind(id)
                    .execute(self.pool())
                    .await?;
                }
                None => {
                    sqlx::query("UPDATE prediction_logs SET actual_price = ?, evaluated_at = ? WHERE id = ?")
                        .bind(actual)
                        .bind(&evaluated_at)
                        .bind(id)
                        .execute(self.pool())
                        .await?;
                }
            }
            evaluated += 1;
        }

        tracing::info!("Evaluated {} predictions for {}", evaluated, index_id);
        Ok(evaluated)
    }

    /// Direction and price accuracy over all evaluated predictions for an index.
    pub async fn prediction_accuracy(&self, index_id: &str) -> Result<AccuracyStats> {
        let rows: Vec<(bool, Option<f64>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT was_correct, accuracy_score, evaluated_at
            FROM prediction_logs
            WHERE index_id = ? AND was_correct IS NOT NULL
            "#
        )
        .bind(index_id.to_uppercase())
        .fetch_all(self.pool())
        .await?;

        if rows.is_empty() {
            return Ok(AccuracyStats::empty());
        }

        let total = rows.len() as f64;
        let correct = rows.iter().filter(|(ok, _, _)| *ok).count();
        let avg_score = rows.iter().map(|(_, score, _)| score.unwrap_or(0.0)).sum::<f64>() / total;
        let last_evaluated = rows.iter().filter_map(|(_, _, at)| at.clone()).max();

        Ok(AccuracyStats {
            total_predictions: rows.len() as i64,
            correct_predictions: correct as i64,
            direction_accuracy: Some(round_to(correct as f64 / total * 100.0, 2)),
            price_accuracy: Some(round_to(avg_score * 100.0, 2)),
            last_evaluated,
        })
    }

    /// Accuracy across the given indices; indices with no evaluations are left out.
    pub async fn overall_accuracy(&self, index_ids: &[String]) -> Result<OverallAccuracy> {
        let mut by_index = BTreeMap::new();
        for index_id in index_ids {
            let stats = self.prediction_accuracy(index_id).await?;
            if stats.total_predictions > 0 {
                by_index.insert(index_id.to_uppercase(), stats);
            }
        }

        let total: i64 = by_index.values().map(|s| s.total_predictions).sum();
        let correct: i64 = by_index.values().map(|s| s.correct_predictions).sum();

        Ok(OverallAccuracy {
            overall: OverallStats {
                total_predictions: total,
                correct_predictions: correct,
                direction_accuracy: (total > 0).then(|| round_to(correct as f64 / total as f64 * 100.0, 2)),
            },
            by_index,
        })
    }
}

async fn insert_log<'e, E>(executor: E, entry: &PredictionLogEntry) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO prediction_logs
        (index_id, prediction_date, target_date, prediction_days, current_price, predicted_price,
         predicted_direction, predicted_change_percent, confidence, technical_factors,
         sentiment_factors, combined_signal)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#
    )
    .bind(entry.index_id.to_uppercase())
    .bind(&entry.prediction_date)
    .bind(&entry.target_date)
    .bind(entry.prediction_days)
    .bind(entry.current_price)
    .bind(entry.predicted_price)
    .bind(&entry.predicted_direction)
    .bind(entry.predicted_change_percent)
    .bind(entry.confidence)
    .bind(&entry.technical_factors)
    .bind(&entry.sentiment_factors)
    .bind(entry.combined_signal)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::SentimentLabel;
    use analysis_orchestrator::{ForecastPoint, PredictionFactors, SentimentFactors, TechnicalFactors};

    async fn setup_test_db() -> HistoryDb {
        HistoryDb::new("sqlite::memory:").await.unwrap()
    }

    fn entry(index_id: &str, target_date: &str, predicted_price: f64, direction: &str) -> PredictionLogEntry {
        PredictionLogEntry {
            index_id: index_id.to_string(),
            prediction_date: timestamp(Utc::now()),
            target_date: target_date.to_string(),
            prediction_days: 7,
            current_price: Some(100.0),
            predicted_price,
            predicted_direction: direction.to_string(),
            predicted_change_percent: 2.0,
            confidence: 0.7,
            technical_factors: None,
            sentiment_factors: None,
            combined_signal: 0.3,
        }
    }

    fn prediction(target_dates: &[&str]) -> PredictionResult {
        PredictionResult {
            index_id: "SP500".to_string(),
            name: "S&P 500".to_string(),
            current_price: Some(5000.0),
            prediction_days: target_dates.len() as u32,
            overall_sentiment: SentimentLabel::Positive,
            sentiment_score: 0.4,
            predicted_direction: Direction::Bullish,
            predicted_change_percent: 1.5,
            confidence: 0.65,
            data_available: true,
            historical_data: Vec::new(),
            predictions: target_dates
                .iter()
                .enumerate()
                .map(|(i, date)| ForecastPoint {
                    date: date.to_string(),
                    predicted_close: 5000.0 + 10.0 * (i + 1) as f64,
                    confidence: 0.7,
                    sentiment_influence: 0.16,
                })
                .collect(),
            factors: PredictionFactors {
                technical: TechnicalFactors {
                    trend: 0.3,
                    momentum: 0.2,
                    rsi: 55.0,
                    volatility: 15.0,
                    sma_5: Some(4990.0),
                    sma_20: Some(4950.0),
                    signal: 0.25,
                },
                sentiment: SentimentFactors {
                    score: 0.4,
                    label: SentimentLabel::Positive,
                    positive_articles: 3,
                    negative_articles: 0,
                    neutral_articles: 1,
                },
                combined_signal: 0.31,
            },
            generated_at: Utc::now(),
        }
    }

    async fn logged_rows(db: &HistoryDb) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM prediction_logs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_log_prediction_writes_every_day() {
        let db = setup_test_db().await;
        let written = db
            .log_prediction(&prediction(&["2099-01-01", "2099-01-02", "2099-01-03"]))
            .await
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(logged_rows(&db).await, 3);

        let history = db.prediction_history("SP500", 1).await.unwrap();
        assert_eq!(history[0].target_date, "2099-01-03");
        assert_eq!(history[0].predicted_direction, "bullish");
    }

    #[tokio::test]
    async fn test_log_prediction_is_all_or_nothing() {
        let db = setup_test_db().await;
        sqlx::query(
            "CREATE TRIGGER reject_day BEFORE INSERT ON prediction_logs \
             WHEN NEW.target_date = '2099-01-03' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = db
            .log_prediction(&prediction(&["2099-01-01", "2099-01-02", "2099-01-03"]))
            .await;
        assert!(result.is_err());
        assert_eq!(logged_rows(&db).await, 0);
    }

    #[test]
    fn test_outcome_correct_direction() {
        let outcome = evaluate_outcome(100.0, Some(102.0), "bullish", 101.0);
        assert_eq!(outcome.actual_direction, "bullish");
        assert!(outcome.was_correct);
        // |102 - 101| / 101 = 0.99% error
        let score = outcome.accuracy_score.unwrap();
        assert!((score - (1.0 - (1.0 / 101.0 * 100.0) / 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_outcome_neutral_band() {
        let outcome = evaluate_outcome(100.0, Some(100.0), "bullish", 100.4);
        assert_eq!(outcome.actual_direction, "neutral");
        assert!(!outcome.was_correct);
    }

    #[test]
    fn test_outcome_large_error_scores_zero() {
        let outcome = evaluate_outcome(100.0, Some(150.0), "bearish", 90.0);
        assert_eq!(outcome.actual_direction, "bearish");
        assert!(outcome.was_correct);
        assert_eq!(outcome.accuracy_score, Some(0.0));
    }

    #[tokio::test]
    async fn test_evaluate_and_accuracy() {
        let db = setup_test_db().await;
        db.insert_prediction_log(&entry("SP500", "2024-01-02", 102.0, "bullish")).await.unwrap();
        db.insert_prediction_log(&entry("SP500", "2024-01-03", 103.0, "bullish")).await.unwrap();
        db.insert_prediction_log(&entry("SP500", "2024-01-04", 104.0, "bullish")).await.unwrap();
        // Far future target is never evaluated
        db.insert_prediction_log(&entry("SP500", "2999-01-01", 104.0, "bullish")).await.unwrap();

        let prices = HashMap::from([
            ("2024-01-02".to_string(), 102.0),
            ("2024-01-03".to_string(), 97.0),
            ("2999-01-01".to_string(), 110.0),
        ]);
        let evaluated = db.evaluate_past_predictions("sp500", &prices).await.unwrap();
        assert_eq!(evaluated, 2);

        let stats = db.prediction_accuracy("SP500").await.unwrap();
        assert_eq!(stats.total_predictions, 2);
        assert_eq!(stats.correct_predictions, 1);
        assert_eq!(stats.direction_accuracy, Some(50.0));
        assert!(stats.last_evaluated.is_some());

        // Already evaluated rows are skipped
        assert_eq!(db.evaluate_past_predictions("SP500", &prices).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_accuracy_empty() {
        let db = setup_test_db().await;
        assert_eq!(db.prediction_accuracy("DAX").await.unwrap(), AccuracyStats::empty());
    }

    #[tokio::test]
    async fn test_overall_accuracy_skips_unevaluated() {
        let db = setup_test_db().await;
        db.insert_prediction_log(&entry("SP500", "2024-01-02", 102.0, "bullish")).await.unwrap();
        db.insert_prediction_log(&entry("DAX", "2024-01-02", 98.0, "bearish")).await.unwrap();
        let prices = HashMap::from([("2024-01-02".to_string(), 103.0)]);
        db.evaluate_past_predictions("SP500", &prices).await.unwrap();

        let ids = vec!["SP500".to_string(), "DAX".to_string(), "NIFTY50".to_string()];
        let overall = db.overall_accuracy(&ids).await.unwrap();
        assert_eq!(overall.by_index.len(), 1);
        assert_eq!(overall.overall.total_predictions, 1);
        assert_eq!(overall.overall.direction_accuracy, Some(100.0));
    }

    #[tokio::test]
    async fn test_history_order_and_window() {
        let db = setup_test_db().await;
        let mut old = entry("SP500", "2001-01-05", 100.0, "neutral");
        old.prediction_date = "2001-01-01T00:00:00Z".to_string();
        db.insert_prediction_log(&old).await.unwrap();
        db.insert_prediction_log(&entry("SP500", "2024-01-02", 101.0, "bullish")).await.unwrap();
        db.insert_prediction_log(&entry("SP500", "2024-01-03", 102.0, "bullish")).await.unwrap();

        let history = db.prediction_history("SP500", 30).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].target_date, "2024-01-03");
        assert!(history[0].was_correct.is_none());
    }

    #[tokio::test]
    async fn test_history_capped_at_100() {
        let db = setup_test_db().await;
        for _ in 0..105 {
            db.insert_prediction_log(&entry("NIFTY50", "2024-02-01", 100.0, "neutral")).await.unwrap();
        }
        let history = db.prediction_history("NIFTY50", 180).await.unwrap();
        assert_eq!(history.len(), 100);
    }
}
