//! URL 构建工具

/// 修复 base_url
///
/// - 移除末尾斜杠
/// - 修复双斜杠（保留协议部分）
pub fn fix_base_url(base_url: &str) -> String {
    let mut url = base_url.trim().trim_end_matches('/').to_string();

    // 修复双斜杠（跳过协议部分）
    if let Some(pos) = url.find("://") {
        let (protocol, rest) = url.split_at(pos + 3);
        let fixed_rest = rest.replace("//", "/");
        url = format!("{}{}", protocol, fixed_rest);
    }

    url
}

/// 去掉模型 ID 的 `models/` 前缀
pub fn normalize_model(model: &str) -> String {
    let model = model.trim();
    model.strip_prefix("models/").unwrap_or(model).to_string()
}

/// 构建 Gemini `generateContent` 端点（不含密钥参数）
pub fn build_generate_content_endpoint(base_url: &str, model: &str) -> String {
    let url = fix_base_url(base_url);
    let model = normalize_model(model);

    if url.ends_with("/v1beta") {
        format!("{}/models/{}:generateContent", url, model)
    } else {
        format!("{}/v1beta/models/{}:generateContent", url, model)
    }
}
