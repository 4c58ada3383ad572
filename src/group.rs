use crate::entry::{numeric_year, NumericYear, Publication};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Publications sharing the same resolved year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearBucket {
    pub year: String,
    pub publications: Vec<Publication>,
}

impl YearBucket {
    pub fn numeric_year(&self) -> Option<NumericYear> {
        numeric_year(&self.year)
    }
}

/// Order newest year first, then by title ignoring case.
///
/// Non-numeric years share one rank after every numeric year. The sort is
/// stable, so equal keys keep their input order.
pub fn sort_publications(publications: &mut [Publication]) {
    publications.sort_by_cached_key(|p| (Reverse(p.numeric_year()), p.title.to_lowercase()));
}

/// Bucket already sorted publications by exact year string.
///
/// Numeric buckets come out descending. Non-numeric buckets follow in the
/// order they were first seen.
pub fn group_by_year(publications: Vec<Publication>) -> Vec<YearBucket> {
    let mut buckets: Vec<YearBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for publication in publications {
        match index.get(&publication.year) {
            Some(&i) => buckets[i].publications.push(publication),
            None => {
                index.insert(publication.year.clone(), buckets.len());
                buckets.push(YearBucket {
                    year: publication.year.clone(),
                    publications: vec![publication],
                });
            }
        }
    }

    buckets.sort_by_key(|bucket| Reverse(bucket.numeric_year()));
    buckets
}

/// Sort then group
pub fn arrange(mut publications: Vec<Publication>) -> Vec<YearBucket> {
    sort_publications(&mut publications);
    group_by_year(publications)
}
