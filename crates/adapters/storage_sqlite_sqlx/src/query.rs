//! Rendering of list queries and relation lookups into SQL.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use sitehub_domain::group::GroupField;
use sitehub_domain::query::{FieldKey, Filter, Sort, SortOrder};
use sitehub_domain::site::SiteField;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::decode;

/// A filter value, typed for the column it is compared against.
pub(crate) enum Param {
    Text(String),
    Real(f64),
}

/// Maps a queryable field to its column. Public keys double as column names.
pub(crate) trait Column: FieldKey {
    fn column(self) -> &'static str {
        self.key()
    }

    /// Convert a raw filter value. `None` means no row can match it.
    fn param(self, raw: &str) -> Option<Param> {
        Some(Param::Text(raw.to_owned()))
    }
}

impl Column for GroupField {}

impl Column for SiteField {
    fn param(self, raw: &str) -> Option<Param> {
        match self {
            Self::InstallationDate => raw
                .parse::<NaiveDate>()
                .ok()
                .map(|date| Param::Text(date.to_string())),
            Self::MaxPowerMegawatt | Self::MinPowerMegawatt => {
                raw.parse::<f64>().ok().map(Param::Real)
            }
            _ => Some(Param::Text(raw.to_owned())),
        }
    }
}

/// Append `WHERE`/`AND` conditions for every filter.
pub(crate) fn push_filters<F: Column>(builder: &mut QueryBuilder<'_, Sqlite>, filters: &[Filter<F>]) {
    for (index, filter) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        match filter.field.param(&filter.value) {
            Some(Param::Text(value)) => {
                builder
                    .push(filter.field.column())
                    .push(" = ")
                    .push_bind(value);
            }
            Some(Param::Real(value)) => {
                builder
                    .push(filter.field.column())
                    .push(" = ")
                    .push_bind(value);
            }
            None => {
                builder.push("1 = 0");
            }
        }
    }
}

/// Append `ORDER BY`. Ties, and unsorted lists, keep insertion order.
pub(crate) fn push_sort<F: Column>(builder: &mut QueryBuilder<'_, Sqlite>, sort: Option<Sort<F>>) {
    builder.push(" ORDER BY ");
    if let Some(sort) = sort {
        builder.push(sort.field.column()).push(match sort.order {
            SortOrder::Ascending => " ASC, ",
            SortOrder::Descending => " DESC, ",
        });
    }
    builder.push("rowid ASC");
}

/// Append `IN (?, ?, ...)` for `ids`.
pub(crate) fn push_in(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    builder.push(" IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
}

/// Run a `(owner_id, id, name)` link query for every owner at once and group
/// the rows by owner, in link insertion order.
///
/// `select` must end with the owner column so the `IN` list can follow it.
pub(crate) async fn fetch_links<I>(
    pool: &SqlitePool,
    select: &str,
    owners: &[String],
) -> Result<HashMap<String, Vec<(I, String)>>, sqlx::Error>
where
    I: FromStr,
    I::Err: std::error::Error + Send + Sync + 'static,
{
    let mut grouped: HashMap<String, Vec<(I, String)>> = HashMap::new();
    if owners.is_empty() {
        return Ok(grouped);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(select);
    push_in(&mut builder, owners);
    builder.push(" ORDER BY link.rowid");

    let rows: Vec<(String, String, String)> = builder.build_query_as().fetch_all(pool).await?;
    for (owner, id, name) in rows {
        grouped
            .entry(owner)
            .or_default()
            .push((decode(&id)?, name));
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_filters_and_sort() {
        let filters = vec![
            Filter {
                field: SiteField::Country,
                value: "fr".to_string(),
            },
            Filter {
                field: SiteField::InstallationDate,
                value: "2023-06-17".to_string(),
            },
        ];
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM sites");
        push_filters(&mut builder, &filters);
        push_sort(
            &mut builder,
            Some(Sort {
                field: SiteField::Name,
                order: SortOrder::Descending,
            }),
        );
        assert_eq!(
            builder.sql(),
            "SELECT * FROM sites WHERE country = ? AND installation_date = ? ORDER BY name DESC, rowid ASC"
        );
    }

    #[test]
    fn should_never_match_unparsable_number() {
        let filters = vec![Filter {
            field: SiteField::MaxPowerMegawatt,
            value: "lots".to_string(),
        }];
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM sites");
        push_filters(&mut builder, &filters);
        assert_eq!(builder.sql(), "SELECT * FROM sites WHERE 1 = 0");
    }

    #[test]
    fn should_keep_insertion_order_when_unsorted() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM \"groups\"");
        push_sort::<GroupField>(&mut builder, None);
        assert_eq!(builder.sql(), "SELECT * FROM \"groups\" ORDER BY rowid ASC");
    }

    #[test]
    fn should_render_group_filters_on_key_columns() {
        let filters = vec![
            Filter {
                field: GroupField::Type,
                value: "group1".to_string(),
            },
            Filter {
                field: GroupField::Name,
                value: "North".to_string(),
            },
        ];
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM \"groups\"");
        push_filters(&mut builder, &filters);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM \"groups\" WHERE type = ? AND name = ?"
        );
    }
}
