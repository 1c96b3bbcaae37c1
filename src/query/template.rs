use crate::catalog::{Category, Domain};

const SERVICE_QUALIFIERS: &[&str] = &[
    "companies",
    "platforms",
    "service providers",
    "associations",
    "startups",
];

const MANUFACTURING_QUALIFIERS: &[&str] = &[
    "manufacturers",
    "production capacity",
    "exporters and suppliers",
    "industry associations",
    "manufacturing clusters",
];

const SOURCE_HINTS: &[&str] = &[
    "directory",
    "list",
    "database",
    "pdf",
    "member directory",
];

pub(super) fn qualifiers(category: Category) -> &'static [&'static str] {
    match category {
        Category::Service => SERVICE_QUALIFIERS,
        Category::Manufacturing => MANUFACTURING_QUALIFIERS,
    }
}

/// Number of distinct (fragment, qualifier, hint) combinations for a domain.
pub fn combination_space(domain: &Domain) -> usize {
    domain.fragments.len() * qualifiers(domain.category).len() * SOURCE_HINTS.len()
}

/// Lazily enumerates every (fragment, qualifier, hint) combination exactly once.
///
/// Position `k` maps to fragment `k % F` and layer `k / F`; within a layer the
/// qualifier and hint are offset by the fragment index, so consecutive queries
/// rotate vocabulary instead of repeating one qualifier across all fragments.
pub fn template_candidates<'a>(
    domain: &'a Domain,
    country: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let qualifiers = qualifiers(domain.category);
    let fragments = domain.fragments.len();
    let (q, h) = (qualifiers.len(), SOURCE_HINTS.len());

    (0..combination_space(domain)).map(move |k| {
        let f = k % fragments;
        let layer = k / fragments;
        let qualifier = qualifiers[(layer % q + f) % q];
        let hint = SOURCE_HINTS[(layer / q + f) % h];
        format!("{} {qualifier} {hint} {country}", domain.fragments[f])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::collections::HashSet;

    #[test]
    fn enumerates_whole_space_without_repeats() {
        let catalog = Catalog::builtin();
        for domain in catalog.all() {
            let all: Vec<String> = template_candidates(domain, "India").collect();
            assert_eq!(all.len(), combination_space(domain));
            let unique: HashSet<&String> = all.iter().collect();
            assert_eq!(unique.len(), all.len(), "repeat in {}", domain.id);
        }
    }

    #[test]
    fn first_round_rotates_service_qualifiers() {
        let catalog = Catalog::builtin();
        let first: Vec<String> = template_candidates(catalog.get("EdTech").unwrap(), "India")
            .take(5)
            .collect();
        assert_eq!(first[0], "edtech companies directory India");
        assert_eq!(first[1], "e-learning platforms list India");
        assert!(first.iter().any(|q| q.contains("associations")));
    }

    #[test]
    fn manufacturing_uses_production_vocabulary() {
        let catalog = Catalog::builtin();
        let first: Vec<String> =
            template_candidates(catalog.get("Chemical_Petrochemical").unwrap(), "India")
                .take(3)
                .collect();
        assert!(first[0].contains("manufacturers"));
        assert!(first[1].contains("production capacity"));
    }
}
