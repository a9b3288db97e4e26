//! Seedable generator of synthetic rows and payloads

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

const FIRST_NAMES: [&str; 38] = [
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Christopher", "Karen", "Charles", "Lisa", "Daniel", "Nancy", "Matthew", "Betty",
    "Anthony", "Margaret", "Mark", "Sandra", "Steven", "Ashley", "Paul", "Emily", "Andrew",
    "Donna", "Joshua", "Michelle",
];

const LAST_NAMES: [&str; 30] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson",
];

const EMAIL_DOMAINS: [&str; 6] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "example.com",
    "company.org",
];

const STATUSES: [&str; 3] = ["active", "inactive", "pending"];

const TEXT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";

const IDENTIFIER_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of generated identifiers
pub const IDENTIFIER_SUFFIX_LEN: usize = 6;

/// A row for the users table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticUser {
    pub name: String,
    pub email: String,
    pub status: &'static str,
}

impl SyntheticUser {
    /// `('name', 'email', 'status')` tuple for a multi-row INSERT
    ///
    /// Generated values never contain quotes.
    #[must_use]
    pub fn values_tuple(&self) -> String {
        format!("('{}', '{}', '{}')", self.name, self.email, self.status)
    }
}

/// Pure function of its seed: the same seed yields the same sequence
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    rng: StdRng,
}

impl RecordSynthesizer {
    /// Synthesizer seeded from the operating system
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible synthesizer
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next user record
    pub fn user(&mut self) -> SyntheticUser {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let number: u16 = self.rng.random_range(1000..=9999);
        let domain = self.pick(&EMAIL_DOMAINS);
        SyntheticUser {
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}.{number}@{domain}",
                first.to_lowercase(),
                last.to_lowercase()
            ),
            status: self.pick(&STATUSES),
        }
    }

    /// `len` characters drawn from letters, digits and space
    pub fn text_payload(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(TEXT_ALPHABET[self.rng.random_range(0..TEXT_ALPHABET.len())]))
            .collect()
    }

    /// Hex encoding of `len` random bytes (`2 * len` characters)
    pub fn hex_payload(&mut self, len: usize) -> String {
        let bytes: Vec<u8> = (0..len).map(|_| self.rng.random::<u8>()).collect();
        hex::encode(bytes)
    }

    /// `prefix` followed by six random lowercase letters
    pub fn identifier(&mut self, prefix: &str) -> String {
        let suffix: String = (0..IDENTIFIER_SUFFIX_LEN)
            .map(|_| {
                char::from(
                    IDENTIFIER_ALPHABET[self.rng.random_range(0..IDENTIFIER_ALPHABET.len())],
                )
            })
            .collect();
        format!("{prefix}{suffix}")
    }

    /// Uniform choice from a non-empty slice
    ///
    /// # Panics
    ///
    /// Never for the constant pools above; callers pass non-empty slices.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        *items
            .choose(&mut self.rng)
            .unwrap_or_else(|| unreachable!("pick called with an empty slice"))
    }

    /// Uniform choice that tolerates an empty slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Uniform float in `[low, high]`
    pub fn between(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }
}

impl Default for RecordSynthesizer {
    fn default() -> Self {
        Self::from_entropy()
    }
}
