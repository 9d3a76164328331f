use comfy_table::{Cell, Table};

use crate::error::{FactdeskError, Result};
use crate::models::{Agency, NamedOption, AGENCIES};
use crate::store::{load_agencies, load_options, DocumentStore, Predicate};

pub fn add_agency(store: &dyn DocumentStore, name: &str, state: &str, city: Option<&str>) -> Result<()> {
    let name = name.trim();
    let state = state.trim().to_uppercase();
    if name.is_empty() {
        return Err(FactdeskError::InvalidField {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    let existing = load_agencies(store, &[Predicate::eq("state", state.as_str())])?;
    if existing.iter().any(|a| a.name.eq_ignore_ascii_case(name)) {
        return Err(FactdeskError::Other(format!("agency {name} already exists in {state}")));
    }
    let agency = Agency {
        id: String::new(),
        name: name.to_string(),
        state: state.clone(),
        city: city.unwrap_or_default().trim().to_string(),
    };
    store.create_document(AGENCIES, serde_json::to_value(&agency)?)?;
    println!("Added agency: {name} ({state})");
    Ok(())
}

pub fn list_agencies(store: &dyn DocumentStore, state: Option<&str>) -> Result<()> {
    let predicates: Vec<Predicate> = state
        .map(|s| vec![Predicate::eq("state", s.trim().to_uppercase())])
        .unwrap_or_default();
    let agencies = load_agencies(store, &predicates)?;

    let mut table = Table::new();
    table.set_header(vec!["Name", "City", "State"]);
    for agency in &agencies {
        table.add_row(vec![
            Cell::new(&agency.name),
            Cell::new(&agency.city),
            Cell::new(&agency.state),
        ]);
    }
    println!("Agencies\n{table}");
    Ok(())
}

/// Add a topic or source.
pub fn add_option(store: &dyn DocumentStore, collection: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FactdeskError::InvalidField {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    if load_options(store, collection)?.iter().any(|o| o.name == name) {
        return Err(FactdeskError::Other(format!("{name} is already listed")));
    }
    let option = NamedOption {
        id: String::new(),
        name: name.to_string(),
    };
    store.create_document(collection, serde_json::to_value(&option)?)?;
    println!("Added: {name}");
    Ok(())
}

pub fn list_options(store: &dyn DocumentStore, collection: &str) -> Result<()> {
    for option in load_options(store, collection)? {
        println!("{}", option.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use crate::models::TOPICS;

    #[test]
    fn test_add_agency_normalizes_state_and_rejects_duplicates() {
        let (_dir, store) = test_store();
        add_agency(&store, "County Health", "oh", Some("Columbus")).unwrap();
        let agencies = load_agencies(&store, &[]).unwrap();
        assert_eq!(agencies[0].state, "OH");
        assert_eq!(agencies[0].city, "Columbus");

        assert!(add_agency(&store, "county health", "OH", None).is_err());
        add_agency(&store, "County Health", "TX", None).unwrap();
        assert_eq!(load_agencies(&store, &[]).unwrap().len(), 2);
    }

    #[test]
    fn test_add_option() {
        let (_dir, store) = test_store();
        add_option(&store, TOPICS, "Elections").unwrap();
        assert!(add_option(&store, TOPICS, "Elections").is_err());
        assert!(add_option(&store, TOPICS, "  ").is_err());
        assert_eq!(load_options(&store, TOPICS).unwrap().len(), 1);
    }
}
