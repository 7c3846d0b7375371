//! Named digipeater route table text form
//!
//! ```text
//! NAME,ADDR1,ADDR2|NAME2,ADDR1
//! ```
//!
//! Parsing is lenient: a route with an unparseable address, an empty name
//! or no addresses is skipped, the rest of the table is kept.

use std::collections::BTreeMap;
use std::fmt;

use crate::address::StationAddress;

/// Separator between routes
const ROUTE_SEPARATOR: char = '|';
/// Separator between a route's name and its addresses
const FIELD_SEPARATOR: char = ',';

/// Digipeater paths keyed by route name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteTable {
    routes: BTreeMap<String, Vec<StationAddress>>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text form, skipping malformed routes
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();

        for entry in text.split(ROUTE_SEPARATOR) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            let mut fields = entry.split(FIELD_SEPARATOR).map(str::trim);
            let name = fields.next().unwrap_or_default();
            if name.is_empty() {
                tracing::debug!("Skipping route without a name: {:?}", entry);
                continue;
            }

            match fields.map(StationAddress::parse).collect::<Result<Vec<_>, _>>() {
                Ok(path) if path.is_empty() => {
                    tracing::debug!("Skipping route {:?} with no addresses", name);
                }
                Ok(path) => {
                    table.routes.insert(name.to_string(), path);
                }
                Err(e) => {
                    tracing::debug!("Skipping route {:?}: {}", name, e);
                }
            }
        }

        table
    }

    /// Add or replace a route
    pub fn insert(&mut self, name: impl Into<String>, path: Vec<StationAddress>) {
        self.routes.insert(name.into(), path);
    }

    /// Look up a route by name
    pub fn get(&self, name: &str) -> Option<&[StationAddress]> {
        self.routes.get(name).map(Vec::as_slice)
    }

    /// Remove a route
    pub fn remove(&mut self, name: &str) -> Option<Vec<StationAddress>> {
        self.routes.remove(name)
    }

    /// Routes in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StationAddress])> {
        self.routes
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Display for RouteTable {
    /// Text form; routes without addresses are omitted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, path) in self.iter().filter(|(_, path)| !path.is_empty()) {
            if !first {
                write!(f, "{ROUTE_SEPARATOR}")?;
            }
            first = false;
            write!(f, "{name}")?;
            for address in path {
                write!(f, "{FIELD_SEPARATOR}{address}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(texts: &[&str]) -> Vec<StationAddress> {
        texts
            .iter()
            .map(|t| StationAddress::parse(t).unwrap())
            .collect()
    }

    #[test]
    fn test_encode_single_route() {
        let mut table = RouteTable::new();
        table.insert("WIDE", path(&["WIDE1-1", "WIDE2-2"]));
        assert_eq!(table.to_string(), "WIDE,WIDE1-1,WIDE2-2");
        assert_eq!(RouteTable::parse(&table.to_string()), table);
    }

    #[test]
    fn test_parse_multiple_routes() {
        let table = RouteTable::parse("WIDE,WIDE1-1,WIDE2-2|LOCAL,RELAY");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("LOCAL").unwrap(), path(&["RELAY"]).as_slice());
        // Output is ordered by name
        assert_eq!(table.to_string(), "LOCAL,RELAY|WIDE,WIDE1-1,WIDE2-2");
    }

    #[test]
    fn test_parse_skips_malformed_routes() {
        let table = RouteTable::parse("BAD,WIDE1-99|GOOD,WIDE1-1|,WIDE2-2|EMPTY||");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("GOOD").unwrap(), path(&["WIDE1-1"]).as_slice());
    }

    #[test]
    fn test_empty_routes_omitted() {
        let mut table = RouteTable::new();
        table.insert("NONE", Vec::new());
        table.insert("ONE", path(&["WIDE1-1"]));
        assert_eq!(table.to_string(), "ONE,WIDE1-1");
    }

    #[test]
    fn test_empty_text() {
        assert!(RouteTable::parse("").is_empty());
        assert_eq!(RouteTable::new().to_string(), "");
    }
}
