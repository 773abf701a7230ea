//! 组合根
//!
//! 记录同一棵组合树中的所有注册表，按 id 查找

use crate::registry::DefinitionRegistry;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// 组合根
///
/// 显式传递给注册表，替代进程级的注册表查找。只保存弱引用。
#[derive(Debug, Default)]
pub struct CompositionRoot {
    registries: RwLock<IndexMap<String, Weak<DefinitionRegistry>>>,
}

impl CompositionRoot {
    /// 创建空的组合根
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 登记注册表
    pub fn enroll(&self, registry: &Arc<DefinitionRegistry>) {
        let id = registry.id().to_string();
        let mut registries = self.registries.write();
        if let Some(existing) = registries.get(&id).and_then(Weak::upgrade) {
            if !Arc::ptr_eq(&existing, registry) {
                warn!("组合根中的注册表 {} 被替换", id);
            }
        }
        debug!("组合根登记注册表: {}", id);
        registries.insert(id, Arc::downgrade(registry));
    }

    /// 按 id 查找组合树中的注册表
    pub fn find_composed_registry(&self, id: &str) -> Option<Arc<DefinitionRegistry>> {
        self.registries.read().get(id).and_then(Weak::upgrade)
    }

    /// 仍然存活的注册表 id
    pub fn registry_ids(&self) -> Vec<String> {
        self.registries
            .read()
            .iter()
            .filter(|(_, registry)| registry.strong_count() > 0)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
