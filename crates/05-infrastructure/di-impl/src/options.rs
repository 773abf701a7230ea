//! 服务选项表
//!
//! 每个选项对应一个键、期望描述、默认值和形状校验函数

use infrastructure_common::{ErrorContext, ServiceError, ServiceResult};
use serde_json::{Map, Value};

/// 服务定义选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOption {
    /// 是否为抽象服务
    Abstract,
    /// 父服务名称
    Extends,
    /// 类名
    ClassName,
    /// 构造参数
    Arguments,
    /// 构造后调用的方法
    Calls,
    /// 是否为单例
    Singleton,
    /// 标签
    Tags,
}

impl ServiceOption {
    /// 所有选项，按规范化时的应用顺序排列
    pub const ALL: [Self; 7] = [
        Self::Abstract,
        Self::Extends,
        Self::ClassName,
        Self::Arguments,
        Self::Calls,
        Self::Singleton,
        Self::Tags,
    ];

    /// 配置中的键名
    pub fn key(self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Extends => "extends",
            Self::ClassName => "className",
            Self::Arguments => "arguments",
            Self::Calls => "calls",
            Self::Singleton => "singleton",
            Self::Tags => "tags",
        }
    }

    /// 按键名查找选项
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.key() == key)
    }

    /// 期望值描述
    pub fn expected(self) -> &'static str {
        match self {
            Self::Abstract => "a boolean",
            Self::Singleton => "a boolean or null",
            Self::Extends | Self::ClassName => "a string or null",
            Self::Arguments => "an array or null",
            Self::Calls => "a plain object with array properties",
            Self::Tags => "an array of strings",
        }
    }

    /// 默认值
    pub fn default_value(self) -> Value {
        match self {
            Self::Abstract => Value::Bool(false),
            Self::Extends | Self::ClassName => Value::Null,
            Self::Arguments | Self::Tags => Value::Array(Vec::new()),
            Self::Calls => Value::Object(Map::new()),
            Self::Singleton => Value::Bool(true),
        }
    }

    /// 检查值的形状
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Abstract => value.is_boolean(),
            Self::Singleton => value.is_boolean() || value.is_null(),
            Self::Extends | Self::ClassName => value.is_string() || value.is_null(),
            Self::Arguments => value.is_array() || value.is_null(),
            Self::Tags => match value {
                Value::Null => true,
                Value::Array(items) => items.iter().all(Value::is_string),
                _ => false,
            },
            Self::Calls => match value {
                Value::Null => true,
                Value::Object(calls) => calls.values().all(Value::is_array),
                _ => false,
            },
        }
    }

    /// 校验值，不通过时返回 `InvalidServiceOption`
    pub fn check(self, service: &str, value: &Value) -> ServiceResult<()> {
        if self.accepts(value) {
            return Ok(());
        }

        Err(ServiceError::InvalidServiceOption(
            ErrorContext::new()
                .service(service)
                .option(self.key())
                .expected(self.expected())
                .received(value),
        ))
    }

    /// 基础定义（全部选项取默认值）
    pub fn defaults() -> Map<String, Value> {
        Self::ALL
            .into_iter()
            .map(|option| (option.key().to_string(), option.default_value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_round_trip_through_table() {
        for option in ServiceOption::ALL {
            assert_eq!(ServiceOption::from_key(option.key()), Some(option));
        }
        assert_eq!(ServiceOption::from_key("factory"), None);
    }

    #[test]
    fn test_shape_checks() {
        assert!(ServiceOption::Abstract.accepts(&json!(true)));
        assert!(!ServiceOption::Abstract.accepts(&json!(null)));
        assert!(ServiceOption::Singleton.accepts(&json!(null)));
        assert!(!ServiceOption::ClassName.accepts(&json!(1)));
        assert!(ServiceOption::Calls.accepts(&json!({"setParam": ["p1"]})));
        assert!(!ServiceOption::Calls.accepts(&json!({"setParam": "p1"})));
        assert!(!ServiceOption::Tags.accepts(&json!([1, 2])));
    }

    #[test]
    fn test_check_reports_context() {
        let err = ServiceOption::Abstract
            .check("logger", &json!("yes"))
            .unwrap_err();

        let ServiceError::InvalidServiceOption(ctx) = err else {
            panic!("expected InvalidServiceOption");
        };
        assert_eq!(ctx.service.as_deref(), Some("logger"));
        assert_eq!(ctx.option.as_deref(), Some("abstract"));
        assert_eq!(ctx.expected.as_deref(), Some("a boolean"));
        assert_eq!(ctx.received.as_deref(), Some("\"yes\""));
    }

    #[test]
    fn test_defaults() {
        let defaults = ServiceOption::defaults();
        assert_eq!(defaults.len(), 7);
        assert_eq!(defaults["singleton"], json!(true));
        assert_eq!(defaults["calls"], json!({}));
    }
}
