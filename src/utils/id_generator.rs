// src/utils/id_generator.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    Passenger,
    Driver,
    Ride,
    Rating,
    History,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::Passenger => "psg",
            IdType::Driver => "drv",
            IdType::Ride => "rid",
            IdType::Rating => "rat",
            IdType::History => "hst",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}-{date}-{random_suffix}
    /// Where random_suffix is 5 characters: 3 hexchars + 2 alphanumeric or 3 alphanumeric + 2 hexchars
    pub fn generate(id_type: IdType) -> String {
        Self::generate_with_timestamp(id_type, Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(id_type: IdType, timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string(); // YYMMDD format
        let random_suffix = Self::generate_random_suffix();

        format!("{}-{}-{}", id_type.to_prefix(), date_part, random_suffix)
    }

    /// Generate the random suffix (5 characters mixing hex and alphanumeric)
    fn generate_random_suffix() -> String {
        // 50% chance: 3 hexchars + 2 alphanumeric
        // 50% chance: 3 alphanumeric + 2 hexchars
        if rand::random::<bool>() {
            format!(
                "{}{}",
                Self::generate_hex_chars(3),
                Self::generate_alphanumeric_chars(2)
            )
        } else {
            format!(
                "{}{}",
                Self::generate_alphanumeric_chars(3),
                Self::generate_hex_chars(2)
            )
        }
    }

    /// Generate n hexadecimal characters (0-9, a-f)
    fn generate_hex_chars(n: usize) -> String {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        Self::generate_from_chars(HEX_CHARS, n)
    }

    /// Generate n alphanumeric characters (a-z, A-Z, 0-9)
    fn generate_alphanumeric_chars(n: usize) -> String {
        const ALPHANUMERIC_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        Self::generate_from_chars(ALPHANUMERIC_CHARS, n)
    }

    /// Generate n random characters from a given character set
    fn generate_from_chars(charset: &[u8], n: usize) -> String {
        use rand::Rng;

        let mut rng = rand::rng();
        (0..n)
            .map(|_| {
                let idx = rng.random_range(0..charset.len());
                charset[idx] as char
            })
            .collect()
    }

    /// Parse an ID to extract its components
    pub fn parse_id(id: &str) -> Option<ParsedId> {
        let parts: Vec<&str> = id.split('-').collect();
        if parts.len() != 3 {
            return None;
        }

        let prefix = parts[0];
        let date_part = parts[1];
        let random_suffix = parts[2];

        if date_part.len() != 6 || random_suffix.len() != 5 {
            return None;
        }

        // Determine ID type from prefix
        let id_type = match prefix {
            "psg" => IdType::Passenger,
            "drv" => IdType::Driver,
            "rid" => IdType::Ride,
            "rat" => IdType::Rating,
            "hst" => IdType::History,
            _ => return None,
        };

        // Parse date (YYMMDD format)
        let year = format!("20{}", &date_part[0..2]).parse::<i32>().ok()?;
        let month = date_part[2..4].parse::<u32>().ok()?;
        let day = date_part[4..6].parse::<u32>().ok()?;

        // Validate date components
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }

        Some(ParsedId {
            id_type,
            year,
            month,
            day,
            random_suffix: random_suffix.to_string(),
        })
    }

    /// Validate if an ID matches the expected format and type
    pub fn validate_id(id: &str, expected_type: Option<IdType>) -> bool {
        match Self::parse_id(id) {
            Some(parsed) => {
                if let Some(expected) = expected_type {
                    parsed.id_type == expected
                } else {
                    true
                }
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedId {
    pub id_type: IdType,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub random_suffix: String,
}

impl ParsedId {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0).single()
    }
}

// Integration with the models
pub trait WithGeneratedId {
    fn set_generated_id(&mut self, id_type: IdType);

    fn with_generated_id(mut self, id_type: IdType) -> Self
    where
        Self: Sized,
    {
        self.set_generated_id(id_type);
        self
    }
}

impl WithGeneratedId for crate::models::ride::Ride {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}
