//! Database operations for `sellers`, the seller directory.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `sellers` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SellerRow {
    pub id: i64,
    pub seller_name: String,
    pub domain: String,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub website_url: Option<String>,
    pub country: String,
    pub reliability_score: Option<f64>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Values observed for one seller during a scrape.
#[derive(Debug, Clone, Copy)]
pub struct NewSeller<'a> {
    pub seller_name: &'a str,
    pub domain: &'a str,
    pub phone_number: Option<&'a str>,
    pub whatsapp_number: Option<&'a str>,
    pub website_url: Option<&'a str>,
    pub country: &'a str,
    pub reliability_score: Option<f64>,
    pub scraped_at: DateTime<Utc>,
}

const SELLER_COLUMNS: &str = "id, seller_name, domain, phone_number, whatsapp_number, \
                              website_url, country, reliability_score, last_scraped_at, updated_at";

/// Inserts or updates the seller keyed by `domain`.
///
/// Optional fields that are `None` in `seller` keep their stored value, so
/// a scrape that misses the phone number never erases a known one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_seller(pool: &SqlitePool, seller: &NewSeller<'_>) -> Result<SellerRow, DbError> {
    let sql = format!(
        "INSERT INTO sellers \
             (seller_name, domain, phone_number, whatsapp_number, website_url, country, \
              reliability_score, last_scraped_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) \
         ON CONFLICT (domain) DO UPDATE SET \
             seller_name = excluded.seller_name, \
             phone_number = COALESCE(excluded.phone_number, sellers.phone_number), \
             whatsapp_number = COALESCE(excluded.whatsapp_number, sellers.whatsapp_number), \
             website_url = COALESCE(excluded.website_url, sellers.website_url), \
             country = excluded.country, \
             reliability_score = COALESCE(excluded.reliability_score, sellers.reliability_score), \
             last_scraped_at = excluded.last_scraped_at, \
             updated_at = excluded.updated_at \
         RETURNING {SELLER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SellerRow>(&sql)
        .bind(seller.seller_name)
        .bind(seller.domain.to_ascii_lowercase())
        .bind(seller.phone_number)
        .bind(seller.whatsapp_number)
        .bind(seller.website_url)
        .bind(seller.country.to_ascii_uppercase())
        .bind(seller.reliability_score)
        .bind(seller.scraped_at)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Returns the seller registered under `domain`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no seller has that domain, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_seller_by_domain(pool: &SqlitePool, domain: &str) -> Result<SellerRow, DbError> {
    let sql = format!("SELECT {SELLER_COLUMNS} FROM sellers WHERE domain = ?1");
    sqlx::query_as::<_, SellerRow>(&sql)
        .bind(domain.to_ascii_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Lists sellers ordered by name, optionally restricted to one country.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sellers(
    pool: &SqlitePool,
    country: Option<&str>,
) -> Result<Vec<SellerRow>, DbError> {
    let rows = match country {
        Some(country) => {
            let sql = format!(
                "SELECT {SELLER_COLUMNS} FROM sellers WHERE country = ?1 ORDER BY seller_name, id"
            );
            sqlx::query_as::<_, SellerRow>(&sql)
                .bind(country.to_ascii_uppercase())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {SELLER_COLUMNS} FROM sellers ORDER BY seller_name, id");
            sqlx::query_as::<_, SellerRow>(&sql).fetch_all(pool).await?
        }
    };
    Ok(rows)
}
