//! 参数容器

use di_abstractions::ParameterStore;
use indexmap::IndexMap;
use infrastructure_common::{ServiceError, ServiceResult};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

/// 参数容器
///
/// [`ParameterStore`] 的默认实现，按插入顺序保存参数。
#[derive(Debug, Default)]
pub struct ParameterContainer {
    values: RwLock<IndexMap<String, Value>>,
}

impl ParameterContainer {
    /// 创建空的参数容器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            values: RwLock::new(values.into_iter().collect()),
        }
    }

    /// 设置参数，已有的同名参数被覆盖
    pub fn set(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!("设置参数: {}", name);
        self.values.write().insert(name, value);
    }

    /// 合并另一组参数，同名时新值覆盖旧值
    pub fn extend<I>(&self, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.values.write().extend(values);
    }

    /// 参数快照
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.values.read().clone()
    }

    /// 参数名称列表
    pub fn names(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// 参数数量
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl ParameterStore for ParameterContainer {
    fn get(&self, name: &str) -> ServiceResult<Value> {
        self.values
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    fn has(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }
}
