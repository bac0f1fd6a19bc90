//! Dissolve units into coarser administrative levels.

use geo::{BooleanOps, MultiPolygon};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AtlasError, Result};
use crate::models::{AdminCollection, AdminUnit, AggregationKey, UnitCode};

/// How the code of a dissolved unit is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateCode {
    /// The group's value at the aggregation level
    #[default]
    KeyValue,
    /// The first `n` characters of the member codes (e.g. 2 for "13101" -> "13")
    MemberPrefix(usize),
}

#[derive(Debug, Clone, Default)]
pub struct DissolveOptions {
    pub code: AggregateCode,
}

/// Topological union of a set of geometries
pub fn union_all<'a, I>(geometries: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    let mut iter = geometries.into_iter();
    let first = match iter.next() {
        Some(g) => g.clone(),
        None => return MultiPolygon::new(vec![]),
    };
    iter.fold(first, |acc, g| acc.union(g))
}

struct Group<'a> {
    value: &'a str,
    members: Vec<&'a AdminUnit>,
}

fn group_code(group: &Group<'_>, code: AggregateCode) -> Result<UnitCode> {
    match code {
        AggregateCode::KeyValue => Ok(UnitCode::from(group.value)),
        AggregateCode::MemberPrefix(len) => {
            let first = group.members[0];
            let prefix = first.code.prefix(len).ok_or_else(|| {
                AtlasError::invalid(format!(
                    "unit code {} is shorter than the {}-character aggregate prefix",
                    first.code, len
                ))
            })?;
            if group
                .members
                .iter()
                .any(|m| m.code.prefix(len).as_ref() != Some(&prefix))
            {
                warn!(
                    "Members of '{}' disagree on code prefix, using {}",
                    group.value, prefix
                );
            }
            Ok(prefix)
        }
    }
}

/// Dissolve `collection` into one unit per distinct value at `key`.
///
/// Groups keep first-appearance order. The dissolved hierarchy stops at the
/// grouping level. Units with no value at that level are dropped.
pub fn dissolve(
    collection: &AdminCollection,
    key: AggregationKey,
    options: &DissolveOptions,
) -> Result<AdminCollection> {
    let level = key.level();
    let schema = collection.schema();
    if level >= schema.depth() {
        return Err(AtlasError::invalid(format!(
            "aggregation level {} is outside a {}-level hierarchy",
            level,
            schema.depth()
        )));
    }

    let mut groups: Vec<Group<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut dropped = 0usize;

    for unit in collection.iter() {
        let Some(value) = unit.level(level) else {
            dropped += 1;
            continue;
        };
        let position = *positions.entry(value).or_insert_with(|| {
            groups.push(Group {
                value,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].members.push(unit);
    }

    if dropped > 0 {
        warn!(
            "Dropped {} units with no '{}' value",
            dropped,
            schema.field(level).unwrap_or("?")
        );
    }

    info!(
        "Dissolving {} units into {} groups by {}",
        collection.len() - dropped,
        groups.len(),
        schema.field(level).unwrap_or("?")
    );

    let units: Vec<AdminUnit> = groups
        .par_iter()
        .map(|group| {
            let code = group_code(group, options.code)?;
            let geometry = union_all(group.members.iter().map(|m| &m.geometry));
            debug!(
                "Dissolved {} members into '{}' ({})",
                group.members.len(),
                group.value,
                code
            );
            Ok(AdminUnit {
                code,
                hierarchy: group.members[0].hierarchy[..=level].to_vec(),
                display_name: group.value.to_string(),
                geometry,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AdminCollection::new(schema.truncated(level), units)?
        .with_crs(collection.crs().map(String::from)))
}
