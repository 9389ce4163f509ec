//! Startup diagnostics.

use crate::backend::MediaBackend;
use crate::platform::Platform;

const RULE: &str = "==================================================";

/// Lines describing the host and the chosen backend, logged once at launch.
pub fn system_report(platform: Platform, backend: &dyn MediaBackend) -> Vec<String> {
    let mut lines = vec![
        RULE.to_string(),
        String::from("SYSTEM DETECTION"),
        RULE.to_string(),
        format!("  OS: {} (backend: {})", platform, backend.name()),
    ];
    lines.extend(backend.capabilities().into_iter().map(|l| format!("  {l}")));
    lines.push(RULE.to_string());
    lines
}
