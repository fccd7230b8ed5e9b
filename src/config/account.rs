use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Stored login used by the terminal client when no flags are given.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AccountConfig {
    /// TOML: `account.email`.
    #[serde(default)]
    pub email: Option<String>,

    /// TOML: `account.password`. Numbers are accepted and kept as text.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub password: Option<String>,
}

impl AccountConfig {
    /// Both halves of the login, if configured.
    pub fn login(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() => Some((email, password)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;

    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(serde::de::Error::custom(
            "expected a string or a number for account.password",
        )),
    }
}
