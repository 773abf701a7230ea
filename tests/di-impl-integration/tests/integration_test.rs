//! 服务容器跨 crate 集成测试
use di_abstractions::{Argument, ServiceLocator, ServiceObject};
use di_impl::{ClassDefinition, DefinitionRegistryBuilder};
use infrastructure_common::ServiceError;
use infrastructure_composition::{Module, ModuleBuilder};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Widget {
    label: String,
}

impl ServiceObject for Widget {}

fn widget_class(name: &str) -> ClassDefinition {
    ClassDefinition::new(name, |args| {
        let label = args
            .first()
            .and_then(Argument::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Box::new(Widget { label }) as Box<dyn ServiceObject>)
    })
}

fn label_of(locator: &dyn ServiceLocator, name: &str) -> String {
    locator
        .get(name)
        .unwrap()
        .downcast_ref::<Widget>()
        .unwrap()
        .label
        .clone()
}

#[test]
fn test_singleton_constructed_once_across_threads() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructed);

    let module = ModuleBuilder::new("app")
        .service("slow", json!({"className": "Slow"}))
        .class(ClassDefinition::new("Slow", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(Box::new(Widget {
                label: "slow".to_string(),
            }) as Box<dyn ServiceObject>)
        }))
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();

    let resolved: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| instance.get("slow").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert!(resolved.iter().all(|item| Arc::ptr_eq(item, &resolved[0])));
}

#[test]
fn test_extends_merge() {
    let registry = DefinitionRegistryBuilder::new("app").build();
    registry
        .register("parent", json!({"arguments": ["%mode%"], "tags": ["t"]}))
        .unwrap();
    registry
        .register("child", json!({"extends": "parent", "className": "X"}))
        .unwrap();

    registry.normalize().unwrap();

    let child = registry.get("child").unwrap();
    assert_eq!(child.arguments(), vec![json!("%mode%")]);
    assert_eq!(child.tags(), vec!["t"]);
    assert_eq!(child.raw_class_name().as_deref(), Some("X"));
    assert!(!child.is_abstract());
    assert_eq!(child.definition()["abstract"], json!(false));
}

#[test]
fn test_find_by_tag_through_locator() {
    let module = ModuleBuilder::new("app")
        .service("abstract_one", json!({"abstract": true, "className": "Widget", "tags": ["search"]}))
        .service("first", json!({"className": "Widget", "arguments": ["first"], "tags": ["search"]}))
        .service("second", json!({"className": "Widget", "arguments": ["second"], "tags": ["search", "other"]}))
        .service("third", json!({"className": "Widget", "arguments": ["third"], "tags": ["search"]}))
        .class(widget_class("Widget"))
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();
    let locator: &dyn ServiceLocator = &*instance;

    let labels: Vec<_> = locator
        .find_by_tag("search")
        .unwrap()
        .iter()
        .map(|item| item.downcast_ref::<Widget>().unwrap().label.clone())
        .collect();
    assert_eq!(labels, vec!["first", "second", "third"]);
    assert_eq!(locator.find_by_tag("other").unwrap().len(), 1);
    assert!(locator.find_by_tag("none").unwrap().is_empty());
}

#[test]
fn test_root_definitions_shadow_plugin_definitions() {
    let plugin = ModuleBuilder::new("widgets")
        .plugin(true)
        .service("banner", json!({"className": "Widget", "arguments": ["plugin banner"]}))
        .service("footer", json!({"className": "Widget", "arguments": ["plugin footer"]}))
        .build()
        .unwrap();
    let module = ModuleBuilder::new("app")
        .service("banner", json!({"className": "Widget", "arguments": ["root banner"]}))
        .class(widget_class("Widget"))
        .add_plugin(plugin)
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();

    assert_eq!(label_of(&*instance, "banner"), "root banner");
    assert_eq!(label_of(&*instance, "footer"), "plugin footer");
}

#[test]
fn test_rename_across_composed_modules() {
    let plugin = ModuleBuilder::new("widgets")
        .plugin(true)
        .service("banner", json!({"className": "Widget", "arguments": ["plugin banner"]}))
        .build()
        .unwrap();
    let module = ModuleBuilder::new("app")
        .service("banner", json!({"className": "Widget", "arguments": ["root banner"]}))
        .class(widget_class("Widget"))
        .add_plugin(Arc::clone(&plugin))
        .build()
        .unwrap();

    let plugin_definition = plugin.registry().get("banner").unwrap();
    plugin_definition.rename("headline").unwrap();

    assert!(!module.registry().isset("banner", false));
    assert!(module.registry().isset("headline", true));
    assert!(plugin.registry().isset("headline", true));
    assert_eq!(plugin_definition.name(), "headline");

    let instance = module.create_instance().unwrap();
    assert_eq!(label_of(&*instance, "headline"), "root banner");
}

#[test]
fn test_module_is_visible_to_services() {
    #[derive(Debug)]
    struct ModuleAware {
        module_name: String,
    }

    impl ServiceObject for ModuleAware {}

    let module = ModuleBuilder::new("app")
        .service("aware", json!({"className": "ModuleAware", "arguments": ["@module"]}))
        .class(ClassDefinition::new("ModuleAware", |args| {
            let module_name = args
                .first()
                .and_then(|arg| arg.downcast_service::<Module>())
                .map(|module| module.name().to_string())
                .ok_or_else(|| ServiceError::construction_failed("ModuleAware", "缺少 module"))?;
            Ok(Box::new(ModuleAware { module_name }) as Box<dyn ServiceObject>)
        }))
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();

    let aware = instance.get("aware").unwrap();
    assert_eq!(aware.downcast_ref::<ModuleAware>().unwrap().module_name, "app");
}

#[test]
fn test_prototype_in_own_tags_is_rejected() {
    let module = ModuleBuilder::new("app")
        .service("a", json!({"className": "Widget", "singleton": false}))
        .service("host", json!({"className": "Widget", "arguments": ["@a"], "tags": ["a"]}))
        .class(widget_class("Widget"))
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();

    assert!(matches!(
        instance.get("host"),
        Err(ServiceError::CircularDependency(_))
    ));
    assert!(instance.get("a").is_ok());
}

#[test]
fn test_plugin_service_uses_root_class() {
    let plugin = ModuleBuilder::new("widgets")
        .plugin(true)
        .service("pw", json!({"className": "RootWidget", "arguments": ["from plugin"]}))
        .build()
        .unwrap();
    let module = ModuleBuilder::new("app")
        .class(widget_class("RootWidget"))
        .add_plugin(plugin)
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();

    assert_eq!(label_of(&*instance, "pw"), "from plugin");
}

#[test]
fn test_plugin_extends_root_abstract() {
    let plugin = ModuleBuilder::new("widgets")
        .plugin(true)
        .service("derived", json!({"extends": "base"}))
        .build()
        .unwrap();
    let module = ModuleBuilder::new("app")
        .service(
            "base",
            json!({"abstract": true, "className": "RootWidget", "arguments": ["inherited"]}),
        )
        .class(widget_class("RootWidget"))
        .add_plugin(plugin)
        .build()
        .unwrap();
    let instance = module.create_instance().unwrap();

    assert_eq!(label_of(&*instance, "derived"), "inherited");
    assert!(matches!(
        instance.get("base"),
        Err(ServiceError::AbstractService(_))
    ));
}
