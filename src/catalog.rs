//! Static registry of industry domains the collector knows how to search for.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Manufacturing,
    Service,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Manufacturing => "manufacturing",
            Category::Service => "service",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manufacturing" => Ok(Category::Manufacturing),
            "service" | "services" => Ok(Category::Service),
            other => Err(format!(
                "unknown category '{other}' (expected 'manufacturing' or 'service')"
            )),
        }
    }
}

/// An industry sector configured for directory collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Topic keywords used both to build queries and to score hits.
    pub fragments: Vec<String>,
    pub sectors: Vec<String>,
    /// Known authoritative sources (hostnames or organisation names).
    pub sources: Vec<String>,
}

impl Domain {
    /// Builds a user-described domain that is not part of the catalog.
    pub fn custom(name: &str, category: Category, fragments: &[String]) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("custom domain name must not be empty".into());
        }
        let mut cleaned: Vec<String> = Vec::new();
        for fragment in fragments.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
            if !cleaned.iter().any(|c| c.eq_ignore_ascii_case(fragment)) {
                cleaned.push(fragment.to_string());
            }
        }
        if cleaned.is_empty() {
            cleaned.push(name.to_lowercase());
        }
        Ok(Self {
            id: name.split_whitespace().collect::<Vec<_>>().join("_"),
            name: name.to_string(),
            category,
            fragments: cleaned,
            sectors: Vec::new(),
            sources: Vec::new(),
        })
    }
}

struct Entry {
    id: &'static str,
    name: &'static str,
    category: Category,
    fragments: &'static [&'static str],
    sectors: &'static [&'static str],
    sources: &'static [&'static str],
}

const ENTRIES: &[Entry] = &[
    Entry {
        id: "Chemical_Petrochemical",
        name: "Chemical and Petrochemical",
        category: Category::Manufacturing,
        fragments: &[
            "chemical",
            "petrochemical",
            "polymer",
            "fertilizer",
            "pharmaceutical",
            "specialty chemicals",
        ],
        sectors: &[
            "Pharmaceuticals",
            "Specialty Chemicals",
            "Petrochemicals",
            "Fertilizers",
            "Paints & Coatings",
            "Polymers",
        ],
        sources: &["chemicals.gov.in", "ficci.in", "cii.in", "assocham.org"],
    },
    Entry {
        id: "Shipping",
        name: "Shipping",
        category: Category::Service,
        fragments: &["shipping", "maritime", "port", "logistics", "cargo", "freight"],
        sectors: &[
            "Maritime Transport",
            "Port Operations",
            "Freight Forwarding",
            "Container Shipping",
            "Warehousing",
        ],
        sources: &["shipmin.gov.in", "insa.nic.in", "cla.org.in"],
    },
    Entry {
        id: "Sports_Equipment",
        name: "Sports Equipment",
        category: Category::Manufacturing,
        fragments: &[
            "sports equipment",
            "sports goods",
            "fitness equipment",
            "athletic",
            "gymnasium",
        ],
        sectors: &[
            "Cricket Equipment",
            "Football & Hockey Gear",
            "Fitness Equipment",
            "Outdoor Sports",
            "Athletic Wear",
        ],
        sources: &["sgepc.in", "sai.gov.in", "kheloindia.gov.in"],
    },
    Entry {
        id: "EdTech",
        name: "EdTech",
        category: Category::Service,
        fragments: &[
            "edtech",
            "e-learning",
            "online learning",
            "digital education",
            "educational software",
        ],
        sectors: &[
            "E-Learning Platforms",
            "Educational Software",
            "Learning Management Systems",
            "Online Training",
            "Virtual Classrooms",
        ],
        sources: &["education.gov.in", "nasscom.in", "startupindia.gov.in"],
    },
];

/// Immutable set of built-in domains, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    domains: Vec<Domain>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let domains = ENTRIES
            .iter()
            .map(|e| Domain {
                id: e.id.to_string(),
                name: e.name.to_string(),
                category: e.category,
                fragments: to_owned(e.fragments),
                sectors: to_owned(e.sectors),
                sources: to_owned(e.sources),
            })
            .collect();
        Self { domains }
    }

    pub fn all(&self) -> &[Domain] {
        &self.domains
    }

    /// Looks a domain up by id or display name, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Domain> {
        let key = key.trim();
        self.domains
            .iter()
            .find(|d| d.id.eq_ignore_ascii_case(key) || d.name.eq_ignore_ascii_case(key))
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
