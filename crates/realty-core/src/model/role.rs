//! Account roles.

use std::fmt;
use std::str::FromStr;

/// Role held by an account.
///
/// Every account carries exactly one role. Role strings coming from the
/// outside world are parsed with [`Role::parse`], which accepts the English
/// names and the Portuguese aliases stored by older records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including account management.
    #[serde(alias = "adm")]
    Admin,
    /// Works on behalf of the business; sees every business record.
    #[serde(alias = "corretor")]
    Broker,
    /// Sees and manages only the records attributed to them.
    #[serde(alias = "cliente")]
    Client,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Broker, Role::Client];

    /// Parse a role string. Unrecognized input yields `None`.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "adm" => Some(Role::Admin),
            "broker" | "corretor" => Some(Role::Broker),
            "client" | "cliente" => Some(Role::Client),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Broker => "broker",
            Role::Client => "client",
        }
    }

    /// Whether this role acts for the business rather than for itself.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Broker)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("adm"), Some(Role::Admin));
        assert_eq!(Role::parse(" Corretor "), Some(Role::Broker));
        assert_eq!(Role::parse("CLIENTE"), Some(Role::Client));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("unknown-role"), None);
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse("administrator"), None);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_accepts_legacy_names() {
        let role: Role = serde_json::from_str("\"corretor\"").unwrap();
        assert_eq!(role, Role::Broker);
        assert_eq!(serde_json::to_string(&Role::Broker).unwrap(), "\"broker\"");
    }
}
