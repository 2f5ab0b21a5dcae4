use crate::entities::{keywords, prelude::*};
use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};

/// Keywords whose text splits into more words than this are treated as
/// low-quality phrases and dropped from listings. Applied after the page is
/// fetched, so the unfiltered total still drives pagination.
const MAX_KEYWORD_WORDS: usize = 4;

/// Repository for keyword store operations
pub struct KeywordRepository {
    conn: DatabaseConnection,
}

impl KeywordRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(m: keywords::Model) -> KeywordRecord {
        KeywordRecord {
            id: m.id,
            keyword: m.keyword,
            first_created_time: m.first_created_time,
            last_used_time: m.last_used_time,
            source: m.source,
            trend_percentage: m.trend_percentage,
            last_updated: m.last_updated,
            kind: m.kind,
            ignore: m.ignore,
            ignore_time: m.ignore_time,
        }
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Insert-if-absent on the keyword natural key, then refresh provenance
    /// when the submission carries any. The insert goes through the store's
    /// `ON CONFLICT DO NOTHING` primitive so two concurrent upserts of the
    /// same keyword can never produce two rows.
    pub async fn upsert(&self, input: &UpsertKeyword) -> Result<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let has_provenance = input.source.is_some() || input.trend_percentage.is_some();

        let active_model = keywords::ActiveModel {
            keyword: Set(input.keyword.clone()),
            first_created_time: Set(now.clone()),
            last_used_time: Set(None),
            source: Set(input.source.clone()),
            trend_percentage: Set(input.trend_percentage),
            last_updated: Set(has_provenance.then(|| now.clone())),
            ignore: Set(false),
            ..Default::default()
        };

        let insert = Keywords::insert(active_model).on_conflict(
            OnConflict::column(keywords::Column::Keyword)
                .do_nothing()
                .to_owned(),
        );

        match insert.exec(&self.conn).await {
            Ok(res) => {
                info!("Stored new keyword: {}", input.keyword);
                Ok(UpsertOutcome::Created(res.last_insert_id))
            }
            Err(DbErr::RecordNotInserted) => {
                if has_provenance {
                    // Refresh only what the submission carries; fields it
                    // leaves out keep their stored values.
                    let mut update = Keywords::update_many()
                        .col_expr(keywords::Column::LastUpdated, Expr::value(now))
                        .filter(keywords::Column::Keyword.eq(&input.keyword));

                    if let Some(source) = &input.source {
                        update = update
                            .col_expr(keywords::Column::Source, Expr::value(source.clone()));
                    }
                    if let Some(trend) = input.trend_percentage {
                        update = update
                            .col_expr(keywords::Column::TrendPercentage, Expr::value(trend));
                    }

                    update.exec(&self.conn).await?;
                }

                let existing = Keywords::find()
                    .filter(keywords::Column::Keyword.eq(&input.keyword))
                    .one(&self.conn)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("Keyword '{}' vanished during upsert", input.keyword)
                    })?;

                debug!(
                    "Keyword already present: {} (provenance refresh: {})",
                    input.keyword, has_provenance
                );

                if has_provenance {
                    Ok(UpsertOutcome::Updated(existing.id))
                } else {
                    Ok(UpsertOutcome::AlreadyExists(existing.id))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Paginated listing over non-ignored keywords.
    ///
    /// The total and page count are computed before the word-quality filter
    /// runs, so a returned page may hold fewer than `limit` items.
    pub async fn list(&self, filter: &KeywordListFilter) -> Result<KeywordPage> {
        let mut condition = Condition::all().add(keywords::Column::Ignore.eq(false));
        condition = condition
            .add(filter.kind.eq_or_unset(keywords::Column::Kind))
            .add(filter.used_before.lt_or_unset(keywords::Column::LastUsedTime));

        let query = Keywords::find()
            .filter(condition)
            .order_by_desc(keywords::Column::Id);

        let paginator = query.paginate(&self.conn, filter.limit);
        let totals = paginator.num_items_and_pages().await?;
        let page = filter.page.max(1);
        let rows = paginator.fetch_page(page - 1).await?;

        let records: Vec<KeywordRecord> = rows
            .into_iter()
            .filter(|m| !exceeds_word_limit(&m.keyword))
            .map(Self::map_model)
            .collect();

        Ok(KeywordPage {
            records,
            total: totals.number_of_items,
            total_pages: totals.number_of_pages,
            page,
            limit: filter.limit,
        })
    }

    /// Diagnostic view: everything counts, ignored rows included.
    pub async fn list_all_snapshot(&self, preview: u64) -> Result<(u64, Vec<KeywordRecord>)> {
        let total = Keywords::find().count(&self.conn).await?;
        let rows = Keywords::find()
            .order_by_desc(keywords::Column::Id)
            .limit(preview)
            .all(&self.conn)
            .await?;
        Ok((total, rows.into_iter().map(Self::map_model).collect()))
    }

    pub async fn distinct_kinds(&self) -> Result<Vec<String>> {
        let rows: Vec<Option<String>> = Keywords::find()
            .select_only()
            .column(keywords::Column::Kind)
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut kinds: Vec<String> = rows
            .into_iter()
            .flatten()
            .filter(|k| !k.trim().is_empty())
            .collect();
        kinds.sort();
        kinds.dedup();
        Ok(kinds)
    }

    pub async fn stats(&self) -> Result<KeywordStats> {
        let total = Keywords::find().count(&self.conn).await?;
        let used = Keywords::find()
            .filter(keywords::Column::LastUsedTime.is_not_null())
            .count(&self.conn)
            .await?;
        let ignored = Keywords::find()
            .filter(keywords::Column::Ignore.eq(true))
            .count(&self.conn)
            .await?;

        Ok(KeywordStats {
            total,
            used,
            unused: total.saturating_sub(used),
            ignored,
        })
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Keywords::find().count(&self.conn).await?)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stamp `last_used_time` on one record. Returns false when no record has
    /// that id.
    pub async fn mark_used(&self, id: i32) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = Keywords::update_many()
            .col_expr(keywords::Column::LastUsedTime, Expr::value(now))
            .filter(keywords::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Stamp `last_used_time` (and optionally the classification tag) on each
    /// keyword in the batch. One store operation per keyword; keywords with
    /// no matching record are silent no-ops.
    pub async fn mark_used_batch(&self, terms: &[String], kind: Option<&str>) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let mut touched = 0;

        for term in terms {
            let mut update = Keywords::update_many()
                .col_expr(keywords::Column::LastUsedTime, Expr::value(now.clone()))
                .filter(keywords::Column::Keyword.eq(term));

            if let Some(tag) = kind {
                update = update.col_expr(keywords::Column::Kind, Expr::value(tag));
            }

            let result = update.exec(&self.conn).await?;
            touched += result.rows_affected;
        }

        debug!("Batch use-marking touched {} of {} keywords", touched, terms.len());
        Ok(touched)
    }

    /// Soft-delete. Idempotent: re-ignoring an ignored record succeeds and
    /// refreshes `ignore_time`.
    pub async fn ignore(&self, id: i32) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = Keywords::update_many()
            .col_expr(keywords::Column::Ignore, Expr::value(true))
            .col_expr(keywords::Column::IgnoreTime, Expr::value(now))
            .filter(keywords::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

/// True when the keyword text splits into more whitespace-separated words
/// than listings tolerate.
#[must_use]
pub fn exceeds_word_limit(keyword: &str) -> bool {
    keyword.split_whitespace().count() > MAX_KEYWORD_WORDS
}

// ============================================================================
// Filters
// ============================================================================

/// Tri-state filter over a nullable column.
///
/// Records where the column is unset are deliberately always eligible under
/// `MustMatch`: an unset `type` means "not yet classified" and an unset
/// `last_used_time` means "never consumed", and both must keep showing up in
/// filtered listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TriState {
    #[default]
    Any,
    MustMatch(String),
    MustBeUnset,
}

impl TriState {
    /// Equality match; unset and empty-string values also pass.
    fn eq_or_unset(&self, col: keywords::Column) -> Condition {
        match self {
            Self::Any => Condition::all(),
            Self::MustMatch(v) => Condition::any()
                .add(col.eq(v.clone()))
                .add(col.is_null())
                .add(col.eq("")),
            Self::MustBeUnset => Condition::any().add(col.is_null()).add(col.eq("")),
        }
    }

    /// Strictly-before match on a timestamp column; unset values also pass.
    fn lt_or_unset(&self, col: keywords::Column) -> Condition {
        match self {
            Self::Any => Condition::all(),
            Self::MustMatch(v) => Condition::any().add(col.lt(v.clone())).add(col.is_null()),
            Self::MustBeUnset => Condition::any().add(col.is_null()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeywordListFilter {
    pub used_before: TriState,
    pub kind: TriState,
    pub page: u64,
    pub limit: u64,
}

impl Default for KeywordListFilter {
    fn default() -> Self {
        Self {
            used_before: TriState::Any,
            kind: TriState::Any,
            page: 1,
            limit: 20,
        }
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct UpsertKeyword {
    pub keyword: String,
    pub source: Option<String>,
    pub trend_percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(i32),
    Updated(i32),
    AlreadyExists(i32),
}

impl UpsertOutcome {
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::AlreadyExists(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeywordRecord {
    pub id: i32,
    pub keyword: String,
    pub first_created_time: String,
    pub last_used_time: Option<String>,
    pub source: Option<String>,
    pub trend_percentage: Option<f64>,
    pub last_updated: Option<String>,
    pub kind: Option<String>,
    pub ignore: bool,
    pub ignore_time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordPage {
    pub records: Vec<KeywordRecord>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct KeywordStats {
    pub total: u64,
    pub used: u64,
    pub unused: u64,
    pub ignored: u64,
}
