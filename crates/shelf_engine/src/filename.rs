const MAX_STEM_CHARS: usize = 80;

/// Timestamp format shared by artifact ids, e.g. `2024-05-01_13-45-09-120`.
pub const ARTIFACT_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

/// Timestamp format of saved result files, e.g. `2024-05-01_13-45`.
pub const RESULT_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// `{label}_{stamp}`, safe to use as a file stem on every platform.
pub fn stamped_stem(label: &str, stamp: &str) -> String {
    format!("{}_{}", sanitize_stem(label), sanitize_stem(stamp))
}

/// Replace characters no filesystem accepts, collapse underscores, keep it short.
pub fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) || c.is_whitespace() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let mut stem: String = compacted.chars().take(MAX_STEM_CHARS).collect();
    if stem.is_empty() {
        stem = "unnamed".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
