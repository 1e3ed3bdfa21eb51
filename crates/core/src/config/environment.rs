use std::env;

/// 读取布尔型环境变量：支持 true/false/1/0（大小写不敏感）
pub fn env_is_true(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        }
        Err(_) => default,
    }
}

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

/// 读取非空字符串环境变量，空串视为未设置
pub fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 读取 i64 环境变量，不存在或解析失败返回默认值
pub fn env_i64(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(v) => v.trim().parse::<i64>().ok().unwrap_or(default),
        Err(_) => default,
    }
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(default),
        Err(_) => default,
    }
}

pub fn env_usize(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 每个测试使用独立的变量名，避免并行测试互相干扰
    #[test]
    fn test_env_is_true() {
        env::set_var("DOGO_TEST_BOOL_A", "TRUE");
        env::set_var("DOGO_TEST_BOOL_B", "1");
        env::set_var("DOGO_TEST_BOOL_C", "yes");
        assert!(env_is_true("DOGO_TEST_BOOL_A", false));
        assert!(env_is_true("DOGO_TEST_BOOL_B", false));
        assert!(!env_is_true("DOGO_TEST_BOOL_C", true));
        assert!(env_is_true("DOGO_TEST_BOOL_MISSING", true));
    }

    #[test]
    fn test_numeric_fallbacks() {
        env::set_var("DOGO_TEST_NUM_OK", " 42 ");
        env::set_var("DOGO_TEST_NUM_BAD", "forty-two");
        assert_eq!(env_i64("DOGO_TEST_NUM_OK", 0), 42);
        assert_eq!(env_u64("DOGO_TEST_NUM_BAD", 7), 7);
        assert_eq!(env_usize("DOGO_TEST_NUM_MISSING", 3), 3);
    }

    #[test]
    fn test_env_non_empty() {
        env::set_var("DOGO_TEST_STR_BLANK", "   ");
        env::set_var("DOGO_TEST_STR_SET", "abc");
        assert_eq!(env_non_empty("DOGO_TEST_STR_BLANK"), None);
        assert_eq!(env_non_empty("DOGO_TEST_STR_SET").as_deref(), Some("abc"));
        assert_eq!(env_or_default("DOGO_TEST_STR_MISSING", "dflt"), "dflt");
    }
}
