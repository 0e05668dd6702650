use crate::{
    config::ModuleConfiguration,
    error::{Error, Result},
    resolve::ModuleDescriptor,
};

/// Attach each module's configured order and sort ascending.
///
/// The sort is stable, so equal orders keep discovery order (local modules
/// before npm modules, each in declaration order).
pub fn plan_order(
    modules: &[ModuleDescriptor],
    configs: &[ModuleConfiguration],
) -> Result<Vec<ModuleDescriptor>> {
    let mut ordered = Vec::with_capacity(modules.len());

    for module in modules {
        let cfg = configs
            .iter()
            .find(|c| c.name == module.name)
            .ok_or_else(|| {
                Error::Internal(format!("module [{}] has no loaded configuration", module.name))
            })?;
        ordered.push(module.with_order(cfg.effective_order()));
    }

    ordered.sort_by_key(|m| m.order);
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ModuleType;

    fn module(name: &str, kind: ModuleType) -> ModuleDescriptor {
        ModuleDescriptor::new(name, kind, format!("/m/{name}"))
    }

    fn cfg(name: &str, order: Option<i64>) -> ModuleConfiguration {
        let mut c = ModuleConfiguration::named(name);
        c.order = order;
        c
    }

    fn names(mods: &[ModuleDescriptor]) -> Vec<&str> {
        mods.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn sorts_by_order_with_default() {
        let mods = vec![
            module("A", ModuleType::Local),
            module("B", ModuleType::Local),
            module("C", ModuleType::Local),
        ];
        let cfgs = vec![cfg("A", Some(5)), cfg("B", Some(1)), cfg("C", None)];

        let ordered = plan_order(&mods, &cfgs).unwrap();
        assert_eq!(names(&ordered), ["B", "A", "C"]);
        assert_eq!(ordered[2].order, 1000);
    }

    #[test]
    fn ties_keep_discovery_order() {
        let mods = vec![
            module("l1", ModuleType::Local),
            module("l2", ModuleType::Local),
            module("n1", ModuleType::Npm),
            module("n2", ModuleType::Npm),
        ];
        let cfgs = vec![
            cfg("n2", Some(7)),
            cfg("l2", Some(7)),
            cfg("n1", Some(7)),
            cfg("l1", Some(7)),
        ];

        let ordered = plan_order(&mods, &cfgs).unwrap();
        assert_eq!(names(&ordered), ["l1", "l2", "n1", "n2"]);
    }

    #[test]
    fn negative_orders_go_first() {
        let mods = vec![module("a", ModuleType::Local), module("b", ModuleType::Npm)];
        let cfgs = vec![cfg("a", None), cfg("b", Some(-3))];

        let ordered = plan_order(&mods, &cfgs).unwrap();
        assert_eq!(names(&ordered), ["b", "a"]);
    }

    #[test]
    fn missing_configuration_is_internal_error() {
        let mods = vec![module("a", ModuleType::Local)];
        let err = plan_order(&mods, &[]).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
