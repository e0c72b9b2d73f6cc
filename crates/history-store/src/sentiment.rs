use analysis_core::stats::{mean, round_to};
use anyhow::Result;
use chrono::{Duration, Utc};
use sentiment_analysis::SentimentAggregate;

use crate::db::{timestamp, HistoryDb};
use crate::models::{SentimentTrend, SentimentTrendPoint};

impl HistoryDb {
    /// Record a sentiment analysis for an index.
    pub async fn save_sentiment(&self, index_id: &str, query: &str, sentiment: &SentimentAggregate) -> Result<i64> {
        let articles = serde_json::to_string(&sentiment.articles)?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sentiment_history
            (index_id, query, overall_sentiment, sentiment_score, total_articles,
             positive_count, negative_count, neutral_count, articles, analyzed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#
        )
        .bind(index_id.to_uppercase())
        .bind(query)
        .bind(sentiment.label.as_str())
        .bind(sentiment.score)
        .bind(sentiment.total_articles() as i64)
        .bind(sentiment.positive_count as i64)
        .bind(sentiment.negative_count as i64)
        .bind(sentiment.neutral_count as i64)
        .bind(articles)
        .bind(timestamp(Utc::now()))
        .fetch_one(self.pool())
        .await?;

        Ok(id)
    }

    /// Sentiment analyses for an index over the last `days`, oldest first.
    pub async fn sentiment_trend(&self, index_id: &str, days: i64) -> Result<SentimentTrend> {
        let index_id = index_id.to_uppercase();
        let since = timestamp(Utc::now() - Duration::days(days));

        let data = sqlx::query_as::<_, SentimentTrendPoint>(
            r#"
            SELECT analyzed_at AS date, overall_sentiment AS sentiment,
                   sentiment_score AS score, total_articles AS article_count
            FROM sentiment_history
            WHERE index_id = ? AND analyzed_at >= ?
            ORDER BY analyzed_at, id
            "#
        )
        .bind(&index_id)
        .bind(&since)
        .fetch_all(self.pool())
        .await?;

        let scores: Vec<f64> = data.iter().map(|p| p.score).collect();

        Ok(SentimentTrend {
            index_id,
            days,
            total_analyses: data.len(),
            average_score: round_to(mean(&scores), 4),
            current_sentiment: data.last().map(|p| p.sentiment.clone()),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::SentimentLabel;

    async fn setup_test_db() -> HistoryDb {
        HistoryDb::new("sqlite::memory:").await.unwrap()
    }

    fn aggregate(score: f64, label: SentimentLabel) -> SentimentAggregate {
        SentimentAggregate {
            score,
            label,
            positive_count: 2,
            negative_count: 1,
            neutral_count: 0,
            ..SentimentAggregate::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_trend() {
        let db = setup_test_db().await;
        db.save_sentiment("sp500", "S&P 500", &aggregate(0.4, SentimentLabel::Positive)).await.unwrap();
        db.save_sentiment("SP500", "S&P 500", &aggregate(-0.2, SentimentLabel::Negative)).await.unwrap();
        db.save_sentiment("DAX", "DAX", &aggregate(0.9, SentimentLabel::Positive)).await.unwrap();

        let trend = db.sentiment_trend("SP500", 7).await.unwrap();
        assert_eq!(trend.index_id, "SP500");
        assert_eq!(trend.total_analyses, 2);
        assert!((trend.average_score - 0.1).abs() < 1e-9);
        assert_eq!(trend.current_sentiment.as_deref(), Some("negative"));
        assert_eq!(trend.data[0].sentiment, "positive");
    }

    #[tokio::test]
    async fn test_trend_excludes_old_rows() {
        let db = setup_test_db().await;
        sqlx::query(
            "INSERT INTO sentiment_history (index_id, query, overall_sentiment, sentiment_score, analyzed_at) VALUES ('SP500', 'q', 'neutral', 0.0, '2001-01-01T00:00:00Z')"
        )
        .execute(db.pool())
        .await
        .unwrap();

        let trend = db.sentiment_trend("SP500", 90).await.unwrap();
        assert_eq!(trend.total_analyses, 0);
        assert_eq!(trend.average_score, 0.0);
        assert!(trend.current_sentiment.is_none());
    }
}
