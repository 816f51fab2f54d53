//! Realistic fake data for factory definitions

use std::cell::RefCell;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    "Kate", "Liam", "Mia", "Noah", "Olivia", "Peter", "Quinn", "Ruby", "Sam", "Tina",
    "Uma", "Victor", "Willow", "Xander", "Yara", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Brown", "Davis", "Evans", "Fisher", "Garcia", "Harris", "Johnson", "King", "Lopez",
    "Miller", "Nelson", "Oliveira", "Parker", "Roberts", "Smith", "Taylor", "Underwood", "Valdez",
    "Williams", "Young", "Zhang",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "test.dev"];

const WORDS: &[&str] = &[
    "alias", "beatae", "consequatur", "dolorem", "eligendi", "facilis", "harum", "impedit",
    "labore", "magnam", "nobis", "omnis", "quaerat", "rerum", "sapiente", "tempora", "voluptas",
];

const COMPANY_PREFIXES: &[&str] = &["Acme", "Global", "United", "Premium", "Dynamic", "Smart"];
const COMPANY_SUFFIXES: &[&str] = &["Corp", "Inc", "LLC", "Group", "Systems", "Labs"];

const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Elm Dr", "Park Blvd", "Cedar Ln", "Maple Way", "River Rd", "Sunset Blvd",
];

const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Franklin", "Georgetown", "Fairview", "Madison", "Salem", "Austin",
];

/// Handle to the thread-local fake data generator
///
/// Every handle draws from the same per-thread generator, so seeding once
/// makes all following values on that thread reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faker;

impl Faker {
    pub fn new() -> Self {
        Faker
    }

    /// Reseed the generator of the current thread
    pub fn seed(seed: u64) {
        RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
    }

    fn pick(&self, options: &'static [&'static str]) -> &'static str {
        RNG.with(|rng| options.choose(&mut *rng.borrow_mut()).copied().unwrap_or_default())
    }

    /// Inclusive integer range
    pub fn number_between(&self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        RNG.with(|rng| rng.borrow_mut().gen_range(min..=max))
    }

    /// `true` with the given probability (clamped to `0.0..=1.0`)
    pub fn boolean(&self, probability: f64) -> bool {
        let probability = probability.clamp(0.0, 1.0);
        RNG.with(|rng| rng.borrow_mut().gen_bool(probability))
    }

    /// Random element of a non-empty slice
    pub fn random_element<'a, T>(&self, options: &'a [T]) -> Option<&'a T> {
        RNG.with(|rng| options.choose(&mut *rng.borrow_mut()))
    }

    pub fn first_name(&self) -> String {
        self.pick(FIRST_NAMES).to_string()
    }

    pub fn last_name(&self) -> String {
        self.pick(LAST_NAMES).to_string()
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    pub fn username(&self) -> String {
        format!(
            "{}{}",
            self.first_name().to_lowercase(),
            self.number_between(1, 999)
        )
    }

    pub fn email(&self) -> String {
        format!(
            "{}.{}{:03}@{}",
            self.first_name().to_lowercase(),
            self.last_name().to_lowercase(),
            self.number_between(1, 999),
            self.pick(DOMAINS)
        )
    }

    pub fn company(&self) -> String {
        format!("{} {}", self.pick(COMPANY_PREFIXES), self.pick(COMPANY_SUFFIXES))
    }

    pub fn phone_number(&self) -> String {
        format!(
            "({}) {}-{}",
            self.number_between(200, 999),
            self.number_between(200, 999),
            self.number_between(1000, 9999)
        )
    }

    pub fn street_address(&self) -> String {
        format!("{} {}", self.number_between(1, 9999), self.pick(STREETS))
    }

    pub fn city(&self) -> String {
        self.pick(CITIES).to_string()
    }

    pub fn postcode(&self) -> String {
        format!("{:05}", self.number_between(10000, 99999))
    }

    pub fn word(&self) -> String {
        self.pick(WORDS).to_string()
    }

    /// Capitalized sentence of `words` words ending with a period
    pub fn sentence(&self, words: usize) -> String {
        let words: Vec<String> = (0..words.max(1)).map(|_| self.word()).collect();
        let sentence = words.join(" ");
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    pub fn paragraph(&self, sentences: usize) -> String {
        (0..sentences.max(1))
            .map(|_| {
                let length = self.number_between(4, 10) as usize;
                self.sentence(length)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn url(&self) -> String {
        format!("https://www.{}/{}", self.pick(DOMAINS), self.word())
    }

    pub fn uuid(&self) -> String {
        let bytes: [u8; 16] = RNG.with(|rng| rng.borrow_mut().gen());
        uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
    }

    /// Moment within the last year
    pub fn date_time(&self) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(self.number_between(0, 60 * 24 * 365))
    }

    /// Moment within the next year
    pub fn future_date_time(&self) -> DateTime<Utc> {
        Utc::now() + Duration::minutes(self.number_between(1, 60 * 24 * 365))
    }
}
