//! Survey answers collected with every upload. Each field is drawn from a fixed set;
//! the stored value is the snake key, prompts use the human-readable label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raised when a submitted survey value is not one of the allowed keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.field)
    }
}

impl std::error::Error for UnknownChoice {}

macro_rules! survey_choice {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => ($key:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.key().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownChoice {
                        field: $field,
                        value: wanted.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

survey_choice!(
    /// The role the candidate is applying for.
    TargetRole, "target_role" {
        Backend => ("backend", "Backend Developer"),
        Frontend => ("frontend", "Frontend Developer"),
        Android => ("android", "Android Developer"),
        Ml => ("ml", "Machine Learning Engineer"),
        Data => ("data", "Data Analyst"),
    }
);

survey_choice!(
    ExperienceLevel, "experience_level" {
        Fresher => ("fresher", "Fresher"),
        Junior => ("junior", "1-3 Years"),
        Mid => ("mid", "3-5 Years"),
        Senior => ("senior", "5+ Years"),
    }
);

survey_choice!(
    CompanyType, "company_type" {
        Startup => ("startup", "Startup"),
        Product => ("product", "Product Based"),
        Service => ("service", "Service Based"),
        Faang => ("faang", "FAANG"),
    }
);

/// The three survey answers that give the evaluation its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyContext {
    pub target_role: TargetRole,
    pub experience_level: ExperienceLevel,
    pub company_type: CompanyType,
}
