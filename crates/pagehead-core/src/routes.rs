use serde_json::Value;

use crate::error::{Error, Result};

/// Route key used for the flat configuration form.
pub const CATCH_ALL_ROUTE: &str = "/*";

/// Ordered header name/value pairs for one route.
///
/// Lookups ignore ASCII case. Names that differ only by case are kept as
/// separate entries, each with its own spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    /// Returns the stored (case-preserved) name and value for `name`.
    pub fn find(&self, name: &str) -> Option<(&str, &str)> {
        self.position(name)
            .map(|i| (self.entries[i].0.as_str(), self.entries[i].1.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Values of every header matching `name`, in declaration order.
    pub fn values_mut<'a>(&'a mut self, name: &'a str) -> impl Iterator<Item = &'a mut String> + 'a {
        self.entries
            .iter_mut()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Stored name and value of every header matching `name`.
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter().filter(move |(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Appends a header without looking for an existing one.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replaces the value of the first matching header or appends a new one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut list = HeaderList::new();
        for (name, value) in iter {
            list.push(name, value);
        }
        list
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub route: String,
    pub headers: HeaderList,
}

/// Ordered route pattern -> headers map, as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteHeaderMap {
    entries: Vec<RouteEntry>,
}

impl RouteHeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a configuration value into routes.
    ///
    /// An object of strings is the flat form and becomes a single `/*` route.
    /// An object of string objects is the nested form.
    pub fn from_config(value: &Value) -> Result<Self> {
        let object = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(object) => object,
            other => {
                return Err(Error::Config(format!(
                    "expected an object, found {}",
                    json_kind(other)
                )))
            }
        };

        let mut map = Self::new();
        if object.is_empty() {
            return Ok(map);
        }

        if object.values().all(Value::is_string) {
            let headers = object
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str().unwrap_or_default()))
                .collect();
            map.insert(CATCH_ALL_ROUTE, headers);
            return Ok(map);
        }

        for (route, headers) in object {
            let Value::Object(headers) = headers else {
                return Err(Error::Config(format!(
                    "route \"{}\" must map to an object of headers, found {}",
                    route,
                    json_kind(headers)
                )));
            };
            let mut list = HeaderList::new();
            for (name, value) in headers {
                let Value::String(value) = value else {
                    return Err(Error::Config(format!(
                        "header \"{}\" on route \"{}\" must be a string, found {}",
                        name,
                        route,
                        json_kind(value)
                    )));
                };
                list.push(name.as_str(), value.as_str());
            }
            map.insert(route, list);
        }

        Ok(map)
    }

    /// Folds a bare `*` route into `/*`. Headers already declared on `/*` win.
    pub fn normalize_workers_wildcard(&mut self) {
        let Some(star) = self.entries.iter().position(|e| e.route == "*") else {
            return;
        };

        match self.position(CATCH_ALL_ROUTE) {
            Some(existing) => {
                let star_entry = self.entries.remove(star);
                let target = if existing > star { existing - 1 } else { existing };
                let headers = &mut self.entries[target].headers;
                for (name, value) in star_entry.headers.iter() {
                    if !headers.contains(name) {
                        headers.push(name, value);
                    }
                }
            }
            None => self.entries[star].route = CATCH_ALL_ROUTE.to_string(),
        }
    }

    /// Inserts or replaces the headers of `route`, keeping its position.
    pub fn insert(&mut self, route: &str, headers: HeaderList) {
        match self.position(route) {
            Some(i) => self.entries[i].headers = headers,
            None => self.entries.push(RouteEntry {
                route: route.to_string(),
                headers,
            }),
        }
    }

    pub fn get(&self, route: &str) -> Option<&HeaderList> {
        self.position(route).map(|i| &self.entries[i].headers)
    }

    pub fn get_mut(&mut self, route: &str) -> Option<&mut HeaderList> {
        self.position(route).map(move |i| &mut self.entries[i].headers)
    }

    /// Headers of `route`, creating an empty entry at the end if missing.
    pub fn entry(&mut self, route: &str) -> &mut HeaderList {
        let index = match self.position(route) {
            Some(i) => i,
            None => {
                self.entries.push(RouteEntry {
                    route: route.to_string(),
                    headers: HeaderList::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].headers
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, route: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.route == route)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
