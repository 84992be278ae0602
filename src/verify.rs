//! Post-cleaning checks on a record list.

use std::collections::HashMap;

use crate::record::{record_id, Record};

/// How many matching records `print` lists before truncating.
const SHOWN_MATCHES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMatch {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub total: usize,
    pub pattern: String,
    /// Records whose id contains `pattern`, in input order.
    pub matching: Vec<IdMatch>,
    /// Ids held by more than one record, in first-seen order.
    pub duplicates: Vec<String>,
    /// Records with no string `id`.
    pub missing_ids: usize,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.missing_ids == 0
    }

    pub fn print(&self) {
        println!("Total skills: {}", self.total);
        println!(
            "Skills with '{}' in ID: {}",
            self.pattern,
            self.matching.len()
        );
        for m in self.matching.iter().take(SHOWN_MATCHES) {
            println!(
                " - {} (Name: {})",
                m.id,
                m.name.as_deref().unwrap_or("<none>")
            );
        }
        if self.missing_ids > 0 {
            println!("WARNING: {} record(s) have no id", self.missing_ids);
        }
        if self.duplicates.is_empty() {
            println!("SUCCESS: All IDs are unique.");
        } else {
            println!("ERROR: Found {} duplicate IDs!", self.duplicates.len());
            for id in self.duplicates.iter().take(SHOWN_MATCHES) {
                println!(" - {}", id);
            }
        }
    }
}

pub fn verify(records: &[Record], pattern: &str) -> VerifyReport {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut report = VerifyReport {
        total: records.len(),
        pattern: pattern.to_string(),
        ..Default::default()
    };

    for record in records {
        let Some(id) = record_id(record) else {
            report.missing_ids += 1;
            continue;
        };

        if id.contains(pattern) {
            report.matching.push(IdMatch {
                id: id.to_string(),
                name: record
                    .get("name")
                    .and_then(|n| n.as_str())
                    .map(str::to_string),
            });
        }

        let count = counts.entry(id).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(id);
        }
    }

    report.duplicates = order.into_iter().map(str::to_string).collect();
    report
}
