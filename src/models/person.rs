use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lägsta och högsta uppslagskod (fem siffror)
pub const CODE_MIN: u32 = 10_000;
pub const CODE_MAX: u32 = 99_999;

/// Max antal slumpade försök innan kodgenereringen ger upp
const MAX_CODE_ATTEMPTS: usize = 10_000;

/// Gemensamt för ungdomar och tjänare: uppslag sker via koden
pub trait Member {
    fn code(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Youth {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub phone: String,
    pub code: String,
    #[serde(default)]
    pub added_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confession_father: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siblings_count: Option<u32>,
}

impl Member for Youth {
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Servant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibility: Option<String>,
    #[serde(default)]
    pub added_at: i64,
}

impl Member for Servant {
    fn code(&self) -> &str {
        &self.code
    }
}

/// Formulärdata för en ny ungdom. Id, kod och tidsstämpel sätts vid sparning.
#[derive(Debug, Clone, Default)]
pub struct NewYouth {
    pub name: String,
    pub grade: String,
    pub phone: String,
    pub confession_father: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub father_phone: Option<String>,
    pub mother_phone: Option<String>,
    pub siblings_count: Option<u32>,
}

impl NewYouth {
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    pub fn into_youth(self, id: String, code: String, added_at: i64) -> Youth {
        Youth {
            id,
            name: self.name.trim().to_string(),
            grade: self.grade,
            phone: self.phone,
            code,
            added_at,
            image: None,
            pdf_doc: None,
            confession_father: self.confession_father,
            address: self.address,
            region: self.region,
            father_phone: self.father_phone,
            mother_phone: self.mother_phone,
            siblings_count: self.siblings_count,
        }
    }
}

/// Formulärdata för en ny tjänare
#[derive(Debug, Clone, Default)]
pub struct NewServant {
    pub name: String,
    pub role: String,
    pub phone: String,
    pub responsibility: Option<String>,
}

impl NewServant {
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    pub fn into_servant(self, id: String, code: String, added_at: i64) -> Servant {
        Servant {
            id,
            name: self.name.trim().to_string(),
            role: self.role,
            phone: self.phone,
            code,
            responsibility: self.responsibility,
            added_at,
        }
    }
}

fn validate_name(name: &str) -> Result<(), PersonValidationError> {
    if name.trim().is_empty() {
        return Err(PersonValidationError::MissingName);
    }
    Ok(())
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == 5
        && code
            .parse::<u32>()
            .is_ok_and(|n| (CODE_MIN..=CODE_MAX).contains(&n))
}

/// Generera en femsiffrig kod som inte redan används.
///
/// Slumpar tills koden är ledig. Returnerar `None` om hela kodrymden är slut
/// eller om försöken tar slut.
pub fn generate_lookup_code<R: Rng + ?Sized>(existing: &HashSet<&str>, rng: &mut R) -> Option<String> {
    let space = (CODE_MAX - CODE_MIN + 1) as usize;
    if existing.len() >= space {
        return None;
    }

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = rng.gen_range(CODE_MIN..=CODE_MAX).to_string();
        if !existing.contains(code.as_str()) {
            return Some(code);
        }
    }

    None
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PersonValidationError {
    #[error("Namn krävs")]
    MissingName,
    #[error("Ogiltig kod: {0}")]
    InvalidCode(String),
    #[error("Koden {0} används redan")]
    DuplicateCode(String),
}
