use std::collections::BTreeSet;

use crate::{
    config::ModuleConfiguration,
    error::{Error, Result},
};

/// Every declared relation must name an active module.
///
/// Relations only assert presence; they never influence load order.
pub fn check_relations(configs: &[ModuleConfiguration]) -> Result<String> {
    let active: BTreeSet<&str> = configs.iter().map(|c| c.name.as_str()).collect();

    for cfg in configs {
        if let Some(missing) = first_missing(&active, &cfg.relations) {
            return Err(Error::UnsatisfiedRelation {
                module: cfg.name.clone(),
                relation: missing.to_string(),
            });
        }
    }

    Ok("All relations correct".to_string())
}

fn first_missing<'a>(active: &BTreeSet<&str>, relations: &'a BTreeSet<String>) -> Option<&'a str> {
    relations
        .iter()
        .map(String::as_str)
        .filter(|r| !r.is_empty())
        .find(|r| !active.contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(name: &str, relations: &[&str]) -> ModuleConfiguration {
        let mut c = ModuleConfiguration::named(name);
        c.relations = relations.iter().map(|s| s.to_string()).collect();
        c
    }

    #[test]
    fn no_relations_never_rejects() {
        let cfgs = vec![cfg("a", &[]), cfg("b", &[]), cfg("c", &[])];
        assert!(check_relations(&cfgs).is_ok());
        assert!(check_relations(&[]).is_ok());
    }

    #[test]
    fn relation_to_later_module_is_fine() {
        let cfgs = vec![cfg("bar", &["foo"]), cfg("foo", &[])];
        assert_eq!(check_relations(&cfgs).unwrap(), "All relations correct");
    }

    #[test]
    fn missing_relation_names_module_and_target() {
        let cfgs = vec![cfg("foo", &[]), cfg("bar", &["foo", "ghost"])];
        let err = check_relations(&cfgs).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsatisfiedRelation { module, relation }
                if module == "bar" && relation == "ghost"
        ));
    }

    #[test]
    fn empty_relation_entries_are_ignored() {
        let cfgs = vec![cfg("foo", &[""])];
        assert!(check_relations(&cfgs).is_ok());
    }
}
