use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Location resolved from an order's pickup text
/// Maps to `locations` table, linked through `order_location`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub city: Option<String>,
    pub district: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// Non-empty subset of city, region and country joined with ", "
    pub fn display_name(&self) -> String {
        [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Locations linked to an order, in link order
    pub async fn for_order(pool: &PgPool, order_id: i64) -> Result<Vec<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT l.id, l.city, l.district, l.region, l.country
            FROM locations l
            INNER JOIN order_location ol ON ol.location_id = l.id
            WHERE ol.order_id = $1
            ORDER BY ol.id
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    /// Link location ids to an order, ignoring links that already exist
    pub async fn attach(pool: &PgPool, order_id: i64, location_ids: &[i64]) -> Result<u64, sqlx::Error> {
        if location_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO order_location (order_id, location_id)
            SELECT $1, location_id FROM UNNEST($2::BIGINT[]) AS t(location_id)
            ON CONFLICT (order_id, location_id) DO NOTHING
            "#,
        )
        .bind(order_id)
        .bind(location_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
