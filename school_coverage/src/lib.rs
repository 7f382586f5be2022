/*!
Coverage statistics for school-level date records.

Records are read from a raw sheet by [`normalize`], and then rolled up by
region ([`summarize_by_region`]), by region and municipality
([`summarize_by_region_municipality`]), or projected into a labelled table
([`project_schools_table`]). All the functions are pure: they borrow the
records and build new results on every call.

See the [`manual`] for the expected layout of the source sheet.
*/
pub mod builder;
mod config;
mod ingest;
pub mod manual;

use log::{debug, info};

use std::{
    cmp::Ordering,
    collections::HashMap,
    hash::Hash,
    ops::{Add, AddAssign},
};

pub use crate::config::*;
pub use crate::ingest::normalize;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct Tally {
    total: u64,
    with_date: u64,
}

impl Tally {
    const EMPTY: Tally = Tally {
        total: 0,
        with_date: 0,
    };

    fn of(record: &Record) -> Tally {
        Tally {
            total: 1,
            with_date: u64::from(record.has_date()),
        }
    }

    fn without_date(&self) -> u64 {
        self.total - self.with_date
    }

    // Groups only exist because some record belongs to them: total is never 0.
    fn pct_with_date(&self) -> f64 {
        100.0 * (self.with_date as f64) / (self.total as f64)
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Tally) {
        self.total += rhs.total;
        self.with_date += rhs.with_date;
    }
}

impl Add for Tally {
    type Output = Tally;
    fn add(self: Tally, rhs: Tally) -> Tally {
        Tally {
            total: self.total + rhs.total,
            with_date: self.with_date + rhs.with_date,
        }
    }
}

impl std::iter::Sum for Tally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Tally::EMPTY, |acc, t| acc + t)
    }
}

/// Groups the records in a single pass.
/// The groups are returned in the order in which their key was first seen.
fn group_by<K, F>(records: &[Record], key: F) -> Vec<(K, Tally)>
where
    K: Eq + Hash + Clone,
    F: Fn(&Record) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Tally)> = Vec::new();
    for r in records.iter() {
        let k = key(r);
        let pos = match index.get(&k) {
            Some(pos) => *pos,
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, Tally::EMPTY));
                groups.len() - 1
            }
        };
        groups[pos].1 += Tally::of(r);
    }
    groups
}

fn check_not_empty(records: &[Record]) -> Result<(), CoverageErrors> {
    if records.is_empty() {
        debug!("check_not_empty: no records");
        Err(CoverageErrors::EmptyInput)
    } else {
        Ok(())
    }
}

fn by_pct_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Coverage per region, best covered first.
///
/// Regions with the same percentage keep the order in which they first
/// appear in `records`.
pub fn summarize_by_region(records: &[Record]) -> Result<Vec<RegionSummary>, CoverageErrors> {
    check_not_empty(records)?;
    let mut res: Vec<RegionSummary> = group_by(records, |r| r.region.clone())
        .into_iter()
        .map(|(region, t)| RegionSummary {
            region,
            total_count: t.total,
            with_date_count: t.with_date,
            without_date_count: t.without_date(),
            pct_with_date: t.pct_with_date(),
        })
        .collect();
    // Stable sort: ties stay in first-seen order.
    res.sort_by(|a, b| by_pct_desc(a.pct_with_date, b.pct_with_date));
    info!(
        "summarize_by_region: {} records in {} regions",
        records.len(),
        res.len()
    );
    Ok(res)
}

/// Coverage per (region, municipality) pair, best covered first, then by
/// municipality name.
///
/// The region total attached to each row is computed over `records` as
/// given: to compare against the full region, pass the unfiltered records
/// and filter the output.
pub fn summarize_by_region_municipality(
    records: &[Record],
) -> Result<Vec<RegionMunicipalitySummary>, CoverageErrors> {
    check_not_empty(records)?;
    let region_totals: HashMap<String, Tally> = group_by(records, |r| r.region.clone())
        .into_iter()
        .collect();
    let groups = group_by(records, |r| (r.region.clone(), r.municipality.clone()));

    let mut res: Vec<RegionMunicipalitySummary> = Vec::with_capacity(groups.len());
    for ((region, municipality), t) in groups {
        let region_total_count = region_totals
            .get(&region)
            .map(|rt| rt.total)
            .unwrap_or(t.total);
        res.push(RegionMunicipalitySummary {
            region,
            municipality,
            total_count: t.total,
            with_date_count: t.with_date,
            without_date_count: t.without_date(),
            pct_with_date: t.pct_with_date(),
            region_total_count,
        });
    }
    res.sort_by(|a, b| {
        by_pct_desc(a.pct_with_date, b.pct_with_date)
            .then_with(|| a.municipality.cmp(&b.municipality))
    });
    info!(
        "summarize_by_region_municipality: {} records in {} municipalities",
        records.len(),
        res.len()
    );
    Ok(res)
}

/// Coverage over the whole collection.
pub fn overall_coverage(records: &[Record]) -> Result<OverallCoverage, CoverageErrors> {
    check_not_empty(records)?;
    let t: Tally = records.iter().map(Tally::of).sum();
    Ok(OverallCoverage {
        total_count: t.total,
        with_date_count: t.with_date,
        without_date_count: t.without_date(),
        pct_with_date: t.pct_with_date(),
    })
}

/// The records of a single region, in their original order.
pub fn filter_region(records: &[Record], region: &str) -> Vec<Record> {
    let region = region.trim();
    records
        .iter()
        .filter(|r| r.region == region)
        .cloned()
        .collect()
}

/// All the schools with a readable situation, sorted by region, municipality
/// and school name.
pub fn project_schools_table(records: &[Record]) -> Result<Vec<SchoolRow>, CoverageErrors> {
    check_not_empty(records)?;
    let mut res: Vec<SchoolRow> = records
        .iter()
        .map(|r| SchoolRow {
            region: r.region.clone(),
            municipality: r.municipality.clone(),
            school_name: r.school_name.clone(),
            school_code: r.school_code.clone(),
            date_field: r.date_field.clone(),
            has_date: r.has_date(),
            situation: if r.has_date() {
                Situation::WithDate
            } else {
                Situation::WithoutDate
            },
        })
        .collect();
    res.sort_by(|a, b| {
        (&a.region, &a.municipality, &a.school_name).cmp(&(
            &b.region,
            &b.municipality,
            &b.school_name,
        ))
    });
    Ok(res)
}
