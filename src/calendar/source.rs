use crate::config::SourceConfig;

/// Hash a calendar id the same way every time, so a calendar without an
/// explicit color keeps its generated one across refreshes and restarts.
pub fn hash_code(id: &str) -> i32 {
    id.chars().fold(0i32, |hash, c| {
        // One code unit per character: astral characters contribute their
        // leading surrogate.
        let mut units = [0u16; 2];
        let code = c.encode_utf16(&mut units)[0] as i32;
        code.wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

/// `#RRGGBB` from the low 24 bits of `i`.
pub fn int_to_rgb(i: i32) -> String {
    format!("#{:06X}", i & 0x00ff_ffff)
}

pub fn generated_color(id: &str) -> String {
    int_to_rgb(hash_code(id))
}

impl SourceConfig {
    /// Explicit color if one is configured, otherwise the generated one.
    pub fn display_color(&self) -> String {
        match self.color.as_deref() {
            Some(color) if !color.trim().is_empty() => color.to_string(),
            _ => generated_color(&self.entity),
        }
    }
}
