use crate::catalog::{Category, Domain};
use crate::search::RawHit;

pub fn query_prompt(domain: &Domain, country: &str, count: usize) -> String {
    let (focus, vocabulary) = match domain.category {
        Category::Manufacturing => (
            "manufacturing companies and production units, exporters and importers, \
             suppliers and distributors, industrial associations, manufacturing clusters, \
             government regulatory databases",
            "Use manufacturing terms such as \"manufacturers\", \"production capacity\", \
             \"exporters\", \"factories\" where appropriate.",
        ),
        Category::Service => (
            "service companies and platforms, technology and solution providers, \
             industry associations and trade bodies, startup databases, professional networks",
            "Do NOT use manufacturing terms like \"manufacturers\", \"factories\" or \
             \"production\". Use terms like \"companies\", \"platforms\", \"providers\", \
             \"associations\".",
        ),
    };

    let mut prompt = format!(
        "Generate {count} diverse, non-redundant web search queries to find publicly \
         available company directories, association member lists, datasets and industry \
         reports for the {name} sector ({category}) in {country}.\n\n",
        name = domain.name,
        category = domain.category,
    );
    push_list(&mut prompt, "Topic keywords", &domain.fragments);
    push_list(&mut prompt, "Key sectors", &domain.sectors);
    push_list(&mut prompt, "Known authoritative sources", &domain.sources);
    prompt.push_str(&format!(
        "\nFocus on: {focus}.\n{vocabulary}\n\
         Every query must target {country} and a concrete data source \
         (directory, database, member list, report, PDF).\n\
         Return one query per line, numbered, each wrapped in double quotes, \
         with no other text.\n"
    ));
    prompt
}

pub fn classify_prompt(hit: &RawHit, domain: &Domain, country: &str) -> String {
    let mut prompt = format!(
        "Assess whether this search result is a useful data source for building a \
         directory of {name} ({category}) organisations in {country}.\n\n\
         Title: {title}\nURL: {url}\nSnippet: {snippet}\n\n",
        name = domain.name,
        category = domain.category,
        title = hit.title,
        url = hit.url,
        snippet = hit.snippet,
    );
    push_list(&mut prompt, "Topic keywords", &domain.fragments);
    prompt.push_str(
        "\nRespond with a single JSON object and nothing else:\n\
         {\"document_type\": \"directory\" | \"report\" | \"association-page\" | \"dataset\" | \"unknown\",\n \
         \"coverage\": \"low\" | \"medium\" | \"high\",\n \
         \"action\": \"download\" | \"scrape\" | \"contact\" | \"manual-review\",\n \
         \"relevance\": number between 0 and 1,\n \
         \"year\": publication year as a number, or null,\n \
         \"comment\": one short sentence on what data the source holds}\n",
    );
    prompt
}

fn push_list(prompt: &mut String, label: &str, items: &[String]) {
    if !items.is_empty() {
        prompt.push_str(&format!("{label}: {}\n", items.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn service_prompt_forbids_manufacturing_terms() {
        let catalog = Catalog::builtin();
        let prompt = query_prompt(catalog.get("EdTech").unwrap(), "India", 12);
        assert!(prompt.contains("Generate 12"));
        assert!(prompt.contains("Do NOT use manufacturing terms"));
        assert!(prompt.contains("e-learning"));
        assert!(prompt.contains("India"));
    }

    #[test]
    fn manufacturing_prompt_uses_production_vocabulary() {
        let catalog = Catalog::builtin();
        let prompt = query_prompt(catalog.get("Chemical_Petrochemical").unwrap(), "India", 5);
        assert!(prompt.contains("production capacity"));
        assert!(prompt.contains("ficci.in"));
    }

    #[test]
    fn classify_prompt_embeds_hit() {
        let catalog = Catalog::builtin();
        let hit = RawHit {
            title: "Member Directory".into(),
            url: "https://sgepc.in/member-directory".into(),
            snippet: "sports goods exporters".into(),
            query: "q".into(),
        };
        let prompt = classify_prompt(&hit, catalog.get("Sports_Equipment").unwrap(), "India");
        assert!(prompt.contains("https://sgepc.in/member-directory"));
        assert!(prompt.contains("\"relevance\""));
    }

    #[test]
    fn empty_lists_are_omitted() {
        let domain = Domain::custom("Fintech", Category::Service, &[]).unwrap();
        let prompt = query_prompt(&domain, "India", 5);
        assert!(!prompt.contains("Key sectors"));
    }
}
