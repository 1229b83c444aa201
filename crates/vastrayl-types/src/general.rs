use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

fn is_valid_user_id(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("user id must not be blank"));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(garde::Error::new("user id must not contain control characters"));
    }
    Ok(())
}

/// Opaque id of an end user, as established by authentication.
#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[garde(transparent)]
pub struct UserId(#[garde(length(min = 1, max = 128), custom(is_valid_user_id))] String);

impl FromStr for UserId {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = UserId(s.to_string());
        id.validate()?;
        Ok(id)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
