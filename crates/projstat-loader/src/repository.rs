//! Per-person merge of extracted report sets.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;
use std::path::Path;

use projstat_core::{Person, PersonName, Report};

/// Persons keyed by derived name, iterated in name order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonRepository {
    persons: BTreeMap<PersonName, Person>,
}

impl PersonRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from `(file, reports)` pairs.
    ///
    /// Files whose name yields no person identity are ignored.
    pub fn from_sources<I, P>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, BTreeSet<Report>)>,
        P: AsRef<Path>,
    {
        let mut repository = Self::new();
        for (path, reports) in sources {
            if let Some(name) = PersonName::from_path(path.as_ref()) {
                repository.merge(name, reports);
            }
        }
        repository
    }

    /// Union `reports` into the person called `name`, creating it if needed.
    ///
    /// Returns how many reports were new for that person.
    pub fn merge(&mut self, name: PersonName, reports: impl IntoIterator<Item = Report>) -> usize {
        self.persons
            .entry(name)
            .or_insert_with_key(|name| Person::new(name.clone()))
            .add_reports(reports)
    }

    pub fn get(&self, name: &str) -> Option<&Person> {
        self.persons.get(name)
    }

    pub fn persons(&self) -> btree_map::Values<'_, PersonName, Person> {
        self.persons.values()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// Number of distinct reports across all persons
    pub fn total_reports(&self) -> usize {
        self.persons.values().map(|p| p.reports().len()).sum()
    }
}

impl<'a> IntoIterator for &'a PersonRepository {
    type Item = &'a Person;
    type IntoIter = btree_map::Values<'a, PersonName, Person>;

    fn into_iter(self) -> Self::IntoIter {
        self.persons()
    }
}
