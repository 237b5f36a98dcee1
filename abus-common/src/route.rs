//! Route identifiers and the route table
//!
//! A route is the short numeric string painted on the bus sign ("03", "177").
//! It is the join key between every node: the call station's active calls,
//! the stop station's pending arrivals, the display board and the clip names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bus route identifier
///
/// Always non-empty ASCII digits. Leading zeros are significant: "03" and "3"
/// are different routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteId(String);

impl RouteId {
    /// Parse a route id, trimming surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("empty route id".to_string()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!(
                "route id must be digits only: {:?}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RouteId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RouteId::parse(&value)
    }
}

impl From<RouteId> for String {
    fn from(route: RouteId) -> Self {
        route.0
    }
}

/// One row of the route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Route number as shown on the bus sign
    pub id: RouteId,
    /// Korean spoken name, e.g. "수완 03번 버스"
    pub name_ko: String,
    /// English spoken name, e.g. "bus number zero three"
    pub name_en: String,
    /// Button input line (GPIO number) at the call station, if wired
    #[serde(default)]
    pub button_pin: Option<u32>,
}

/// Static table of the routes served at this stop
///
/// Pure data: loaded once from configuration and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteInfo>,
}

impl RouteTable {
    /// Build a table, rejecting duplicate route ids
    pub fn new(routes: Vec<RouteInfo>) -> Result<Self> {
        for (i, route) in routes.iter().enumerate() {
            if routes[..i].iter().any(|r| r.id == route.id) {
                return Err(Error::Config(format!("duplicate route id {}", route.id)));
            }
        }
        Ok(Self { routes })
    }

    /// Routes of the original installation (Gwangju University stop)
    pub fn default_site() -> Self {
        let row = |id: &str, ko: &str, en: &str, pin: u32| RouteInfo {
            id: RouteId(id.to_string()),
            name_ko: ko.to_string(),
            name_en: en.to_string(),
            button_pin: Some(pin),
        };
        Self {
            routes: vec![
                row("03", "수완 03번 버스", "bus number zero three", 11),
                row("47", "송암 47번 버스", "bus number forty seven", 12),
                row("77", "진월 77번 버스", "bus number seventy seven", 15),
                row("177", "진월 177번 버스", "bus number one seven seven", 16),
            ],
        }
    }

    pub fn get(&self, id: &RouteId) -> Option<&RouteInfo> {
        self.routes.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RouteId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a raw string (e.g. text recognition output) against the table
    pub fn lookup(&self, raw: &str) -> Option<&RouteInfo> {
        let id = RouteId::parse(raw).ok()?;
        self.routes.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteInfo> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_site()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_leading_zero() {
        let route = RouteId::parse(" 03 ").unwrap();
        assert_eq!(route.as_str(), "03");
        assert_ne!(route, RouteId::parse("3").unwrap());
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(RouteId::parse("").is_err());
        assert!(RouteId::parse("   ").is_err());
        assert!(RouteId::parse("4a").is_err());
        assert!(RouteId::parse("-47").is_err());
    }

    #[test]
    fn test_route_id_json_is_plain_string() {
        let route = RouteId::parse("177").unwrap();
        assert_eq!(serde_json::to_string(&route).unwrap(), "\"177\"");

        let parsed: RouteId = serde_json::from_str("\"47\"").unwrap();
        assert_eq!(parsed.as_str(), "47");

        assert!(serde_json::from_str::<RouteId>("\"bus\"").is_err());
    }

    #[test]
    fn test_default_site_table() {
        let table = RouteTable::default_site();
        assert_eq!(table.len(), 4);
        let info = table.lookup("177").expect("177 is served");
        assert_eq!(info.button_pin, Some(16));
        assert!(table.lookup("3").is_none());
        assert!(table.lookup("999").is_none());
    }

    #[test]
    fn test_duplicate_routes_rejected() {
        let info = RouteTable::default_site().get(&RouteId::parse("03").unwrap()).cloned().unwrap();
        let result = RouteTable::new(vec![info.clone(), info]);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
