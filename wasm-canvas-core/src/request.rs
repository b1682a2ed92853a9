//! Load requests and the resource URLs they resolve to
use crate::config::GraphicsCapability;

/// Everything one load needs to know; built once per mount
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub base_path: String,
    pub module_name: String,
    pub arguments: Vec<String>,
    pub graphics: GraphicsCapability,
    pub binary_extension: String,
    pub script_extension: String,
    pub cache_bust: bool,
    pub suppress_info_lines: bool,
    pub forward_errors: bool,
    pub track_resize: bool,
}

impl LoadRequest {
    pub fn new(base_path: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            module_name: module_name.into(),
            arguments: Vec::new(),
            graphics: GraphicsCapability::default(),
            binary_extension: "wasm".to_string(),
            script_extension: "js".to_string(),
            cache_bust: false,
            suppress_info_lines: false,
            forward_errors: false,
            track_resize: true,
        }
    }

    /// Resolve both resource URLs. `timestamp_ms` is only used with cache busting.
    pub fn resource_urls(&self, timestamp_ms: u64) -> ResourceUrls {
        let stamp = self.cache_bust.then_some(timestamp_ms);
        ResourceUrls {
            binary: resolve(&self.base_path, &self.module_name, &self.binary_extension, stamp),
            script: resolve(&self.base_path, &self.module_name, &self.script_extension, stamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrls {
    pub binary: String,
    pub script: String,
}

fn resolve(base: &str, name: &str, extension: &str, stamp: Option<u64>) -> String {
    let file = format!("{name}.{extension}");
    let mut url = if base.is_empty() || is_absolute(&file) {
        file
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            file.trim_start_matches('/')
        )
    };

    if let Some(stamp) = stamp {
        let separator = if url.contains('?') { '&' } else { '?' };
        url.push(separator);
        url.push_str(&format!("t={stamp}"));
    }
    url
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("//") || url.split_once("://").map_or(false, |(scheme, _)| {
        !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
    })
}
