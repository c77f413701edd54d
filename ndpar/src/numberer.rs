use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Bidirectional mapping between values and consecutive numbers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Numberer<T>
where
    T: Clone + Eq + Hash,
{
    values: Vec<T>,
    numbers: HashMap<T, usize>,
    start_at: usize,
}

impl<T> Numberer<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new(start_at: usize) -> Self {
        Numberer {
            values: Vec::new(),
            numbers: HashMap::new(),
            start_at,
        }
    }

    /// Intern a value, returning its (possibly pre-existing) number.
    pub fn add(&mut self, value: T) -> usize {
        if let Some(&number) = self.numbers.get(&value) {
            return number;
        }

        let number = self.start_at + self.values.len();
        self.values.push(value.clone());
        self.numbers.insert(value, number);
        number
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Get the number of a value, if it was interned.
    pub fn number<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.numbers.get(value).cloned()
    }

    pub fn start_at(&self) -> usize {
        self.start_at
    }

    /// Get the value behind a number.
    pub fn value(&self, number: usize) -> Option<&T> {
        number
            .checked_sub(self.start_at)
            .and_then(|idx| self.values.get(idx))
    }
}

// The number table is fully determined by the value ordering, so only
// (start_at, values) is stored.
impl<T> Serialize for Numberer<T>
where
    T: Clone + Eq + Hash + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.start_at, &self.values).serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Numberer<T>
where
    T: Clone + Eq + Hash + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (start_at, values): (usize, Vec<T>) = Deserialize::deserialize(deserializer)?;

        let mut numbers = HashMap::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            numbers.insert(value.clone(), start_at + idx);
        }

        Ok(Numberer {
            values,
            numbers,
            start_at,
        })
    }
}
