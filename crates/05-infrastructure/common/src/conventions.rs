//! 约定规范定义
//!
//! 服务名称、服务引用（`@name`）和参数占位符（`%name%`）的约定

use crate::errors::ServiceResult;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde_json::Value;

/// 服务名称模式
pub const SERVICE_NAME_PATTERN: &str = r"^[0-9_.a-zA-Z]+$";

static SERVICE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(SERVICE_NAME_PATTERN).unwrap());

static SERVICE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@([0-9_.a-zA-Z]+)$").unwrap());

static PARAMETER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([^%]+)%").unwrap());

static PARAMETER_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^%([^%]+)%$").unwrap());

/// 检查服务名称是否符合约定
pub fn is_valid_service_name(name: &str) -> bool {
    SERVICE_NAME.is_match(name)
}

/// 提取服务引用（`@name`）中的服务名称
pub fn service_reference(value: &Value) -> Option<&str> {
    let text = value.as_str()?;
    SERVICE_REFERENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// 整个字符串恰好是一个参数占位符时返回参数名
pub fn parameter_reference(text: &str) -> Option<&str> {
    PARAMETER_LITERAL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// 字符串中是否包含参数占位符
pub fn contains_parameters(text: &str) -> bool {
    PARAMETER_TOKEN.is_match(text)
}

/// 参数值转换为字符串，字符串原样返回，其它值按 JSON 输出
pub fn parameter_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// 替换字符串中所有的参数占位符
///
/// 只扫描一次，替换后的值不会再次展开。
pub fn interpolate_parameters<F>(text: &str, mut resolve: F) -> ServiceResult<String>
where
    F: FnMut(&str) -> ServiceResult<Value>,
{
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for caps in PARAMETER_TOKEN.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        result.push_str(&text[last..whole.start()]);
        result.push_str(&parameter_to_string(&resolve(name.as_str())?));
        last = whole.end();
    }
    result.push_str(&text[last..]);

    Ok(result)
}

/// 只替换第一个参数占位符（用于类名）
pub fn substitute_first_parameter<F>(text: &str, resolve: F) -> ServiceResult<String>
where
    F: FnOnce(&str) -> ServiceResult<Value>,
{
    let Some(caps) = PARAMETER_TOKEN.captures(text) else {
        return Ok(text.to_string());
    };
    let value = resolve(&caps[1])?;
    let replacement = parameter_to_string(&value);

    Ok(PARAMETER_TOKEN
        .replace(text, NoExpand(&replacement))
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use serde_json::json;

    fn lookup(name: &str) -> ServiceResult<Value> {
        match name {
            "mode" => Ok(json!("dev")),
            "port" => Ok(json!(8080)),
            _ => Err(ServiceError::ParameterNotFound {
                name: name.to_string(),
            }),
        }
    }

    #[test]
    fn test_service_names() {
        assert!(is_valid_service_name("search_engine"));
        assert!(is_valid_service_name("app.logger2"));
        assert!(!is_valid_service_name(""));
        assert!(!is_valid_service_name("bad-name"));
        assert!(!is_valid_service_name("with space"));
    }

    #[test]
    fn test_service_reference() {
        assert_eq!(service_reference(&json!("@logger")), Some("logger"));
        assert_eq!(service_reference(&json!("logger")), None);
        assert_eq!(service_reference(&json!("x@logger")), None);
        assert_eq!(service_reference(&json!(42)), None);
    }

    #[test]
    fn test_interpolate_multiple_tokens() {
        let text = interpolate_parameters("prefix-%mode%-%port%", lookup).unwrap();
        assert_eq!(text, "prefix-dev-8080");

        let err = interpolate_parameters("%missing%", lookup).unwrap_err();
        assert!(matches!(err, ServiceError::ParameterNotFound { .. }));
    }

    #[test]
    fn test_substitute_first_only() {
        let text = substitute_first_parameter("%mode%/%port%", lookup).unwrap();
        assert_eq!(text, "dev/%port%");
        assert_eq!(substitute_first_parameter("Plain", lookup).unwrap(), "Plain");
    }

    #[test]
    fn test_parameter_reference() {
        assert_eq!(parameter_reference("%mode%"), Some("mode"));
        assert_eq!(parameter_reference("a-%mode%"), None);
        assert!(contains_parameters("a-%mode%"));
        assert!(!contains_parameters("100%"));
    }
}
