// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission identifiers and wildcard grant matching.
//!
//! A permission is written `<service>.<resource>.<action>`, for example
//! `iam.users.create`. Any field may be the wildcard `*`, so `iam.users.*`
//! grants every action on `iam.users`.
//!
//! Parsing splits strictly on `.` with no escaping, so names that contain a
//! dot cannot be expressed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The wildcard field value.
pub const WILDCARD: &str = "*";

/// Errors building a [`Permission`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The identifier did not split into exactly three fields.
    #[error("permission '{0}' must have the form <service>.<resource>.<action>")]
    InvalidFormat(String),
    /// One of the three fields was empty.
    #[error("permission '{0}' has an empty field")]
    EmptyField(String),
}

/// A `(service, resource, action)` triple.
///
/// All three fields are non-empty; the textual form is the dot-joined triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    service: String,
    resource: String,
    action: String,
}

impl Permission {
    /// Build a permission from its three fields.
    ///
    /// # Errors
    /// Returns `PermissionError::EmptyField` if any field is empty.
    pub fn new(
        service: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Result<Self, PermissionError> {
        let permission = Self {
            service: service.into(),
            resource: resource.into(),
            action: action.into(),
        };

        if permission.service.is_empty()
            || permission.resource.is_empty()
            || permission.action.is_empty()
        {
            return Err(PermissionError::EmptyField(permission.id()));
        }

        Ok(permission)
    }

    /// Parse an identifier, returning `None` for anything that is not
    /// exactly three non-empty dot-separated fields.
    pub fn parse(id: &str) -> Option<Self> {
        id.parse().ok()
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Canonical identifier, `<service>.<resource>.<action>`.
    pub fn id(&self) -> String {
        format!("{}.{}.{}", self.service, self.resource, self.action)
    }

    /// Whether holding `self` grants `required`.
    ///
    /// Each field is compared independently: a held `*` absorbs anything,
    /// otherwise the fields must be equal. There is no prefix matching.
    pub fn grants(&self, required: &Permission) -> bool {
        field_grants(&self.service, &required.service)
            && field_grants(&self.resource, &required.resource)
            && field_grants(&self.action, &required.action)
    }
}

fn field_grants(held: &str, required: &str) -> bool {
    held == WILDCARD || held == required
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split('.');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(service), Some(resource), Some(action), None) => {
                Self::new(service, resource, action)
            }
            _ => Err(PermissionError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.service, self.resource, self.action)
    }
}

/// The permission strings held by a principal, in token order.
///
/// Entries are kept as raw strings; malformed entries never grant anything
/// but do not invalidate the rest of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    pub fn new(permissions: Vec<String>) -> Self {
        Self(permissions)
    }

    /// Whether any parseable member grants `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        self.0
            .iter()
            .filter_map(|held| Permission::parse(held))
            .any(|held| held.grants(required))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for PermissionSet {
    fn from(permissions: Vec<String>) -> Self {
        Self(permissions)
    }
}

impl<'a> FromIterator<&'a str> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(id: &str) -> Permission {
        Permission::parse(id).unwrap()
    }

    #[test]
    fn parse_splits_three_fields() {
        let p = perm("pn.push.create");
        assert_eq!(p.service(), "pn");
        assert_eq!(p.resource(), "push");
        assert_eq!(p.action(), "create");
    }

    #[test]
    fn parse_then_display_is_identity() {
        for id in ["iam.users.read", "*.*.*", "iam.*.delete", "pn.push.*"] {
            assert_eq!(perm(id).to_string(), id);
            assert_eq!(perm(id).id(), id);
        }
    }

    #[test]
    fn parse_rejects_malformed_identifiers() {
        for id in [
            "",
            "iam",
            "iam.users",
            "iam.users.read.extra",
            ".users.read",
            "iam..read",
            "iam.users.",
            "..",
        ] {
            assert!(Permission::parse(id).is_none(), "{id} should not parse");
        }
    }

    #[test]
    fn from_str_reports_the_failure() {
        assert_eq!(
            "iam.users".parse::<Permission>(),
            Err(PermissionError::InvalidFormat("iam.users".to_string()))
        );
        assert!(matches!(
            "iam..read".parse::<Permission>(),
            Err(PermissionError::EmptyField(_))
        ));
    }

    #[test]
    fn new_rejects_empty_fields() {
        assert!(Permission::new("iam", "", "read").is_err());
        assert!(Permission::new("iam", "users", "read").is_ok());
    }

    #[test]
    fn exact_match_grants() {
        let needs = perm("iam.users.create");
        assert!(perm("iam.users.create").grants(&needs));
        assert!(!perm("iam.users.wrongaction").grants(&needs));
    }

    #[test]
    fn wildcard_truth_table() {
        let needs = perm("iam.users.create");
        let cases = [
            ("iam.users.create", true),
            ("iam.users.*", true),
            ("iam.*.create", true),
            ("iam.*.*", true),
            ("*.users.create", true),
            ("*.users.*", true),
            ("*.*.create", true),
            ("*.*.*", true),
        ];
        for (held, expected) in cases {
            assert_eq!(perm(held).grants(&needs), expected, "{held}");
        }

        // Every non-wildcard field still has to match exactly.
        for held in [
            "iam.users.wrongaction",
            "iam.*.wrongaction",
            "*.users.wrongaction",
            "*.*.wrongaction",
            "pn.*.*",
            "*.groups.*",
        ] {
            assert!(!perm(held).grants(&needs), "{held}");
        }
    }

    #[test]
    fn no_prefix_matching() {
        let needs = perm("iam.users.create");
        assert!(!perm("iam.user.create").grants(&needs));
        assert!(!perm("ia*.users.create").grants(&needs));
    }

    #[test]
    fn wildcard_on_required_side_is_literal() {
        // A required `*` is only granted by a held `*`.
        let needs = perm("iam.users.*");
        assert!(!perm("iam.users.read").grants(&needs));
        assert!(perm("iam.users.*").grants(&needs));
    }

    #[test]
    fn set_grants_when_any_member_grants() {
        let needs = perm("iam.users.read");

        let set: PermissionSet = ["iam.users.read"].into_iter().collect();
        assert!(set.grants(&needs));

        let set: PermissionSet = ["iam.users.create", "iam.users.read"].into_iter().collect();
        assert!(set.grants(&needs));

        let set: PermissionSet = ["*.*.*"].into_iter().collect();
        assert!(set.grants(&needs));

        let set: PermissionSet = ["iam.users.delete", "pn.push.create"].into_iter().collect();
        assert!(!set.grants(&needs));
    }

    #[test]
    fn set_ignores_malformed_members() {
        let needs = perm("iam.users.read");

        let set: PermissionSet = ["garbage", "iam..read", "iam.users.read"].into_iter().collect();
        assert!(set.grants(&needs));

        let set: PermissionSet = ["garbage", "iam.users", "a.b.c.d"].into_iter().collect();
        assert!(!set.grants(&needs));
    }

    #[test]
    fn empty_set_never_grants() {
        assert!(!PermissionSet::default().grants(&perm("*.*.*")));
    }

    #[test]
    fn set_serializes_as_plain_array() {
        let set: PermissionSet = ["iam.users.read", "pn.*.*"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["iam.users.read","pn.*.*"]"#);

        let back: PermissionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
